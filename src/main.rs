use std::sync::Arc;

use tenant_portal::{
    AppState,
    auth::{JwtSessionResolver, SessionState},
    backend::{BackendState, HttpBackendClient},
    config::{AppConfig, Env},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, wires the backend client and session resolver
/// into the shared state, and serves HTTP.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    // Fails fast on missing production secrets.
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tenant_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);

    let backend = HttpBackendClient::new(&config.api_base_url, config.api_timeout)
        .expect("FATAL: Failed to build the backend HTTP client.");
    tracing::info!(api_base_url = %config.api_base_url, "backend client ready");

    let app_state = AppState {
        backend: Arc::new(backend) as BackendState,
        sessions: Arc::new(JwtSessionResolver::from_config(&config)) as SessionState,
        config: config.clone(),
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "HTTP server terminated");
    }
}
