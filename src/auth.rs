use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    session::{Role, Session},
};

/// Header honoured by the local development bypass.
pub const SESSION_ROLE_HEADER: &str = "x-session-role";

/// Claims
///
/// Payload of the session JWT issued by the authentication subsystem.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID.
    pub sub: Uuid,
    /// RBAC role at the time the token was issued.
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// Signs a session token for `user_id` valid for `ttl`. Used by the authentication subsystem
/// and by tests; the gateway itself only verifies tokens.
pub fn issue_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp().max(0) as usize,
        exp: (now + ttl).timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// RequestSession
///
/// The session snapshot a navigation request is resolved for.
///
/// Resolution order:
/// 1. `Env::Local` only: an `x-session-role` header yields an authenticated session with that
///    role (`guest` yields an anonymous one).
/// 2. No `Authorization` header: anonymous.
/// 3. `Bearer <jwt>`: authenticated with the token's role. An expired token simply means the
///    session lapsed, so it resolves as anonymous.
///
/// Any other malformed header or invalid token is rejected with 401, so that a client with a
/// broken token notices instead of silently browsing as a guest.
#[derive(Debug, Clone)]
pub struct RequestSession(pub Session);

impl<S> FromRequestParts<S> for RequestSession
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(role) = parts
                .headers
                .get(SESSION_ROLE_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<Role>().ok())
            {
                tracing::debug!(%role, "local session bypass");
                let session = match role {
                    Role::Guest => Session::anonymous(),
                    role => Session::authenticated(Uuid::nil(), role),
                };
                return Ok(RequestSession(session));
            }
        }

        let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(RequestSession(Session::anonymous()));
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => {
                let claims = data.claims;
                let session = match claims.role {
                    Role::Guest => Session::anonymous(),
                    role => Session::authenticated(claims.sub, role),
                };
                Ok(RequestSession(session))
            }
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("expired session token, resolving as anonymous");
                    Ok(RequestSession(Session::anonymous()))
                }
                _ => {
                    tracing::debug!(error = %e, "rejecting session token");
                    Err(ApiError::Unauthorized)
                }
            },
        }
    }
}
