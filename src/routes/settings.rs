use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Settings Router Module
///
/// A tenant owner's view of their own organization.
pub fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/settings",
        get(handlers::get_settings).patch(handlers::update_settings),
    )
}
