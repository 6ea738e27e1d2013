use std::sync::Arc;

use storefront_nav::{
    AppState,
    config::{AppConfig, Env},
    create_router, storefront,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads the configuration, installs logging, builds and validates the storefront route
/// table, then serves the navigation gateway.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_nav=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Gateway starting in {:?} mode", config.env);

    // 3. Route table: a configuration error must keep the process from starting.
    let table = storefront::routes(config.max_redirect_hops)
        .expect("FATAL: storefront route table is misconfigured");
    tracing::info!(
        entries = table.entries().len(),
        max_redirect_hops = table.max_redirect_hops(),
        "route table validated"
    );

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        table: Arc::new(table),
        config,
    });

    // 4. Server
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: could not bind the listen address");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server terminated unexpectedly");
}
