use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Dashboard Router Module
///
/// The authenticated landing area, open to every known user type.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        // Patient lists are tenant-scoped by the backend through the caller's access token.
        .route("/dashboard/patients", get(handlers::list_patients))
        .route("/dashboard/patients/{id}", get(handlers::get_patient))
}
