use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
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

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod webhook;

// Routers grouped by the gate prefix protecting them.
pub mod routes;
use routes::{dashboard, public, settings, tenants};

// --- Public Re-exports ---

pub use auth::{JwtSessionResolver, Session, SessionResolver, SessionState};
pub use backend::{BackendApi, BackendState, HttpBackendClient, RetryPolicy};
pub use config::AppConfig;
pub use error::AppError;

/// ApiDoc
///
/// OpenAPI document for the portal's JSON surface, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_dashboard, handlers::list_patients, handlers::get_patient,
        handlers::list_tenants, handlers::create_tenant, handlers::get_tenant,
        handlers::update_tenant, handlers::delete_tenant, handlers::update_tenant_status,
        handlers::list_memberships, handlers::assign_membership,
        handlers::get_settings, handlers::update_settings,
        webhook::receive_notification, webhook::receive_notification_query
    ),
    components(
        schemas(
            models::Tenant, models::TenantStatus, models::CreateTenantRequest,
            models::UpdateTenantRequest, models::UpdateTenantStatusRequest,
            models::Membership, models::AssignMembershipRequest, models::TenantMembership,
            models::Patient, models::PageMeta, models::SessionSummary,
            auth::UserType, auth::Profile,
            webhook::WebhookAck, webhook::WebhookError,
        )
    ),
    tags(
        (name = "tenant-portal", description = "Multi-tenant SaaS portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single shared container for everything a request may need. Cloning is cheap: the
/// collaborators sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Backend REST API client.
    pub backend: BackendState,
    /// Turns request headers into session claims.
    pub sessions: SessionState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl FromRef<AppState> for BackendState {
    fn from_ref(app_state: &AppState) -> BackendState {
        app_state.backend.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree, wraps it in the authorization gate, and adds the
/// observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(dashboard::dashboard_routes())
        .merge(tenants::tenant_routes())
        .merge(settings::settings_routes())
        // The gate sees every path and decides by prefix; unmatched paths pass through.
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            gate::authorization_gate,
        ))
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

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its `x-request-id`.
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
