use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Tenants Router Module
///
/// Platform administration of customer organizations and their membership plans.
/// Only system_admin sessions reach these handlers; everyone else is sent to /dashboard.
pub fn tenant_routes() -> Router<AppState> {
    Router::new()
        // GET|POST /tenants
        .route(
            "/tenants",
            get(handlers::list_tenants).post(handlers::create_tenant),
        )
        // GET /tenants/memberships
        // Plans available for assignment. The static segment wins over `{id}`.
        .route("/tenants/memberships", get(handlers::list_memberships))
        // GET|PATCH|DELETE /tenants/{id}
        .route(
            "/tenants/{id}",
            get(handlers::get_tenant)
                .patch(handlers::update_tenant)
                .delete(handlers::delete_tenant),
        )
        // PATCH /tenants/{id}/status
        .route("/tenants/{id}/status", patch(handlers::update_tenant_status))
        // POST /tenants/{id}/membership
        .route("/tenants/{id}/membership", post(handlers::assign_membership))
}
