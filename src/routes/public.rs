use crate::{AppState, handlers, webhook};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints the gate lets through without a session (apart from `/`, which needs one but
/// accepts any role).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Redirects to the dashboard landing page.
        .route("/", get(handlers::root))
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /login
        // Target of every "no session" redirect.
        .route("/login", get(handlers::login))
        // GET|POST /api/mercadopago/webhook
        // Payment provider notifications, acknowledged without side effects.
        .route(
            webhook::WEBHOOK_PATH,
            get(webhook::receive_notification_query).post(webhook::receive_notification),
        )
}
