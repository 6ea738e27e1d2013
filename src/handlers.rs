use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    AppState,
    auth::RequestSession,
    models::{NavigationResponse, RouteSummary},
    navigation::{Recorder, navigate},
};

/// NavigateQuery
///
/// Query parameters of `GET /navigate`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct NavigateQuery {
    /// The path to resolve, e.g. `admin/dashboard` or `/products?sort=asc`.
    pub path: String,
}

/// navigate_path
///
/// Resolves a path for the caller's session exactly like the SPA would, following redirects,
/// and reports every step. The session comes from the `Authorization` header (anonymous
/// without one). Malformed paths are not an HTTP error: they come back as a navigation that
/// was refused and then handed to the fallback.
#[utoipa::path(
    get,
    path = "/navigate",
    params(NavigateQuery),
    responses(
        (status = 200, description = "Navigation settled", body = NavigationResponse),
        (status = 400, description = "Missing 'path' query parameter"),
        (status = 401, description = "Invalid session token")
    )
)]
pub async fn navigate_path(
    RequestSession(session): RequestSession,
    State(state): State<AppState>,
    Query(query): Query<NavigateQuery>,
) -> Json<NavigationResponse> {
    let mut recorder = Recorder::default();
    let navigation = navigate(&state.table, &query.path, &session, &mut recorder);

    tracing::info!(
        path = %query.path,
        authenticated = session.is_authenticated,
        role = %session.role,
        outcome = navigation.outcome.kind(),
        "navigation resolved"
    );

    Json(NavigationResponse::new(navigation, &recorder.events))
}

/// list_routes
///
/// Publishes the route table, flattened to absolute paths, for tooling and the SPA build.
#[utoipa::path(
    get,
    path = "/routes",
    responses((status = 200, description = "Route table", body = [RouteSummary]))
)]
pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteSummary>> {
    let routes = state
        .table
        .entries()
        .into_iter()
        .map(RouteSummary::from)
        .collect();
    Json(routes)
}
