use std::sync::Arc;

use axum::{Router, extract::FromRef, http::HeaderName, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Route access control core.
pub mod guard;
pub mod routing;
pub mod session;

// Navigation driving and lazy handler loading on top of the core.
pub mod loader;
pub mod navigation;

// The concrete storefront table, segregated by access tier (public, guest-only, admin).
pub mod storefront;

// Ambient services: configuration, errors, and the HTTP navigation gateway.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ConfigurationError;
pub use navigation::{NavigationSink, Navigator, navigate};
pub use routing::{Outcome, Route, RouteTable};
pub use session::{Role, Session, SessionStore};

/// ApiDoc
///
/// OpenAPI description of the navigation gateway, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::navigate_path, handlers::list_routes),
    components(
        schemas(
            models::NavigationResponse, models::OutcomeView, models::RouteSummary,
            models::GuardSummary, session::Role,
        )
    ),
    tags(
        (name = "storefront-nav", description = "Storefront navigation gateway")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request: the immutable route table and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub config: AppConfig,
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the gateway routes and wraps them in the observability layers
/// (request id, tracing, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Load balancer probe.
        .route("/health", get(|| async { "ok" }))
        .route("/navigate", get(handlers::navigate_path))
        .route("/routes", get(handlers::list_routes))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span for one HTTP request, correlated by the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
