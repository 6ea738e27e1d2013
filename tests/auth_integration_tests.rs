use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use chrono::Duration;
use storefront_nav::{
    AppConfig, AppState, Role,
    auth::{RequestSession, SESSION_ROLE_HEADER, issue_token},
    config::Env,
    error::ApiError,
    storefront,
};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn create_token(role: Role, ttl: Duration) -> String {
    issue_token(TEST_USER_ID, role, TEST_JWT_SECRET, ttl).unwrap()
}

fn create_app_state(env: Env) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = TEST_JWT_SECRET.to_string();

    AppState {
        table: Arc::new(storefront::routes(config.max_redirect_hops).unwrap()),
        config,
    }
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
}

// --- Tests ---

#[tokio::test]
async fn test_valid_jwt_yields_authenticated_session() {
    let app_state = create_app_state(Env::Production);
    let token = create_token(Role::Admin, Duration::hours(1));

    let mut parts = get_request_parts(Method::GET, "/navigate?path=admin".parse().unwrap());
    with_bearer(&mut parts, &token);

    let RequestSession(session) = RequestSession::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(session.is_authenticated);
    assert!(session.is_admin());
    assert_eq!(session.user_id, Some(TEST_USER_ID));
}

#[tokio::test]
async fn test_missing_header_is_an_anonymous_session() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let RequestSession(session) = RequestSession::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(!session.is_authenticated);
    assert_eq!(session.role, Role::Guest);
}

#[tokio::test]
async fn test_expired_jwt_resolves_as_anonymous() {
    let app_state = create_app_state(Env::Production);
    let token = create_token(Role::User, Duration::minutes(-5));

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let RequestSession(session) = RequestSession::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(!session.is_authenticated);
}

#[tokio::test]
async fn test_token_signed_with_another_secret_is_rejected() {
    let app_state = create_app_state(Env::Production);
    let token = issue_token(TEST_USER_ID, Role::Admin, "some-other-secret", Duration::hours(1))
        .unwrap();

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let result = RequestSession::from_request_parts(&mut parts, &app_state).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_garbage_authorization_header_is_rejected() {
    let app_state = create_app_state(Env::Production);

    for value in ["Bearer not-a-jwt", "Basic dXNlcjpwYXNz", "Bearer"] {
        let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
        parts.headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_static(value),
        );

        let result = RequestSession::from_request_parts(&mut parts, &app_state).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)), "{value}");
    }
}

#[tokio::test]
async fn test_guest_role_in_token_is_not_authenticated() {
    let app_state = create_app_state(Env::Production);
    let token = create_token(Role::Guest, Duration::hours(1));

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let RequestSession(session) = RequestSession::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(!session.is_authenticated);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let app_state = create_app_state(Env::Local);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(SESSION_ROLE_HEADER),
        header::HeaderValue::from_static("admin"),
    );

    let RequestSession(session) = RequestSession::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(session.is_admin());
    assert_eq!(session.user_id, Some(Uuid::nil()));
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let app_state = create_app_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    // Provide ONLY the local bypass header
    parts.headers.insert(
        header::HeaderName::from_static(SESSION_ROLE_HEADER),
        header::HeaderValue::from_static("admin"),
    );

    let RequestSession(session) = RequestSession::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(!session.is_authenticated);
}
