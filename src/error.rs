use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ConfigurationError
///
/// A route table that violates one of its structural invariants. These are detected once,
/// when the table is built, and must stop the application from starting: at navigation
/// time they would only ever surface as logic bugs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("duplicate route path '{path}' under '{parent}'")]
    DuplicatePath { parent: String, path: String },

    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route '{path}' has no handler, redirect or children")]
    EmptyRoute { path: String },

    #[error("invalid redirect at '{path}': {reason}")]
    InvalidRedirect { path: String, reason: String },

    #[error("the table needs exactly one top-level '**' fallback entry")]
    MissingFallback,

    #[error("invalid '**' fallback entry: {reason}")]
    InvalidFallback { reason: String },

    #[error("redirect cycle: {}", chain.join(" -> "))]
    RedirectCycle { chain: Vec<String> },

    #[error("redirect chain {} needs more than {limit} hop(s)", chain.join(" -> "))]
    RedirectChainTooLong { chain: Vec<String>, limit: usize },

    #[error("target '{target}' referenced from '{source_path}' never reaches a handler")]
    UnresolvableTarget { source_path: String, target: String },

    #[error("the redirect hop bound must be at least 1")]
    InvalidHopBound,
}

/// MalformedPath
///
/// A requested path that fails syntactic validation. Never fatal: the controller turns it
/// into a `Denied` outcome and the navigation continues with the fallback page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed path '{path}': {diagnostic}")]
pub struct MalformedPath {
    pub path: String,
    pub diagnostic: String,
}

/// ConfigError
///
/// Start-up failures while reading the process environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// LoadError
///
/// Reported by a [`crate::loader::HandlerLoader`] when a lazily loaded handler cannot be
/// fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("handler '{0}' is not known to the loader")]
    UnknownHandler(String),

    #[error("fetching handler '{handler}' failed: {reason}")]
    Fetch { handler: String, reason: String },

    #[error("the load task for '{0}' panicked")]
    Panicked(String),
}

/// ApiError
///
/// Errors of the navigation gateway, rendered as `{ "error": ... }` JSON bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid or unreadable session token")]
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
