use crate::{
    AppState,
    auth::{Session, UserType},
    error::AppError,
    models::{
        AssignMembershipRequest, CreateTenantRequest, Membership, Page, Patient, PatientFilter,
        SessionSummary, Tenant, TenantFilter, TenantMembership, UpdateTenantRequest,
        UpdateTenantStatusRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::gate::{DASHBOARD_PATH, LOGIN_PATH};

// --- Entry Points ---

/// root
///
/// [Gated: any session] The bare domain lands on the dashboard.
pub async fn root() -> Redirect {
    Redirect::temporary(DASHBOARD_PATH)
}

/// login
///
/// [Public Route] Sign-in happens at the identity provider. When `LOGIN_URL` is configured
/// the browser is sent there; otherwise the caller gets a JSON hint.
pub async fn login(State(state): State<AppState>) -> Response {
    match &state.config.login_url {
        Some(url) => Redirect::temporary(url).into_response(),
        None => (
            StatusCode::OK,
            Json(json!({
                "authenticated": false,
                "message": "Sign in with the identity provider to obtain a session token.",
                "loginPath": LOGIN_PATH,
            })),
        )
            .into_response(),
    }
}

// --- Dashboard ---

/// get_dashboard
///
/// [Gated: /dashboard] Summary of the signed-in user for the dashboard header.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Current session", body = SessionSummary),
        (status = 307, description = "No session, redirected to /login")
    )
)]
pub async fn get_dashboard(session: Session) -> Json<SessionSummary> {
    let claims = session.claims();
    Json(SessionSummary {
        username: claims.username.clone(),
        user_type: claims.user_type,
        tenant_id: claims.tenant_id,
        profile: claims.profile.clone(),
    })
}

/// list_patients
///
/// [Gated: /dashboard] Patients visible to the caller. The backend scopes the list to the
/// tenant bound to the access token.
#[utoipa::path(
    get,
    path = "/dashboard/patients",
    params(PatientFilter),
    responses((status = 200, description = "Patients", body = Page<Patient>))
)]
pub async fn list_patients(
    session: Session,
    State(state): State<AppState>,
    Query(filter): Query<PatientFilter>,
) -> Result<Json<Page<Patient>>, AppError> {
    let page = state
        .backend
        .list_patients(session.access_token()?, &filter)
        .await?;
    Ok(Json(page))
}

/// get_patient
///
/// [Gated: /dashboard] A single patient. The backend answers 404 for patients outside the
/// caller's tenant.
#[utoipa::path(
    get,
    path = "/dashboard/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_patient(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, AppError> {
    let patient = state
        .backend
        .get_patient(session.access_token()?, id)
        .await?;
    Ok(Json(patient))
}

// --- Tenants (system_admin) ---

/// list_tenants
///
/// [Gated: /tenants] Paginated tenant list with optional search and status filters.
#[utoipa::path(
    get,
    path = "/tenants",
    params(TenantFilter),
    responses((status = 200, description = "Tenants", body = Page<Tenant>))
)]
pub async fn list_tenants(
    session: Session,
    State(state): State<AppState>,
    Query(filter): Query<TenantFilter>,
) -> Result<Json<Page<Tenant>>, AppError> {
    session.require_any(&[UserType::SystemAdmin])?;
    let page = state
        .backend
        .list_tenants(session.access_token()?, &filter)
        .await?;
    Ok(Json(page))
}

/// create_tenant
///
/// [Gated: /tenants] Registers a new tenant. Answers 201 with the created record.
#[utoipa::path(
    post,
    path = "/tenants",
    request_body = CreateTenantRequest,
    responses((status = 201, description = "Created", body = Tenant))
)]
pub async fn create_tenant(
    session: Session,
    State(state): State<AppState>,
    Json(payload): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<Tenant>), AppError> {
    session.require_any(&[UserType::SystemAdmin])?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("tenant name must not be empty".to_string()));
    }

    let tenant = state
        .backend
        .create_tenant(session.access_token()?, &payload)
        .await?;
    tracing::info!(tenant_id = %tenant.id, "tenant created");
    Ok((StatusCode::CREATED, Json(tenant)))
}

/// get_tenant
///
/// [Gated: /tenants] A single tenant by ID.
#[utoipa::path(
    get,
    path = "/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant", body = Tenant),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_tenant(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tenant>, AppError> {
    session.require_any(&[UserType::SystemAdmin])?;
    let tenant = state.backend.get_tenant(session.access_token()?, id).await?;
    Ok(Json(tenant))
}

/// update_tenant
///
/// [Gated: /tenants] Partial update of a tenant's profile fields.
#[utoipa::path(
    patch,
    path = "/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    request_body = UpdateTenantRequest,
    responses((status = 200, description = "Updated", body = Tenant))
)]
pub async fn update_tenant(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTenantRequest>,
) -> Result<Json<Tenant>, AppError> {
    session.require_any(&[UserType::SystemAdmin])?;
    let tenant = state
        .backend
        .update_tenant(session.access_token()?, id, &payload)
        .await?;
    Ok(Json(tenant))
}

/// delete_tenant
///
/// [Gated: /tenants] Removes a tenant. Answers 204.
#[utoipa::path(
    delete,
    path = "/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_tenant(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session.require_any(&[UserType::SystemAdmin])?;
    state
        .backend
        .delete_tenant(session.access_token()?, id)
        .await?;
    tracing::info!(tenant_id = %id, "tenant deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// update_tenant_status
///
/// [Gated: /tenants] Activates, deactivates, or suspends a tenant.
#[utoipa::path(
    patch,
    path = "/tenants/{id}/status",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    request_body = UpdateTenantStatusRequest,
    responses((status = 200, description = "Updated", body = Tenant))
)]
pub async fn update_tenant_status(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTenantStatusRequest>,
) -> Result<Json<Tenant>, AppError> {
    session.require_any(&[UserType::SystemAdmin])?;
    let tenant = state
        .backend
        .update_tenant_status(session.access_token()?, id, &payload)
        .await?;
    tracing::info!(tenant_id = %id, status = ?payload.status, "tenant status changed");
    Ok(Json(tenant))
}

/// list_memberships
///
/// [Gated: /tenants] The membership plans a tenant can be assigned.
#[utoipa::path(
    get,
    path = "/tenants/memberships",
    responses((status = 200, description = "Membership plans", body = [Membership]))
)]
pub async fn list_memberships(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<Vec<Membership>>, AppError> {
    session.require_any(&[UserType::SystemAdmin])?;
    let memberships = state
        .backend
        .list_memberships(session.access_token()?)
        .await?;
    Ok(Json(memberships))
}

/// assign_membership
///
/// [Gated: /tenants] Puts a tenant on a membership plan.
#[utoipa::path(
    post,
    path = "/tenants/{id}/membership",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    request_body = AssignMembershipRequest,
    responses((status = 200, description = "Assigned", body = TenantMembership))
)]
pub async fn assign_membership(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignMembershipRequest>,
) -> Result<Json<TenantMembership>, AppError> {
    session.require_any(&[UserType::SystemAdmin])?;
    if let (Some(starts_at), Some(ends_at)) = (payload.starts_at, payload.ends_at) {
        if ends_at <= starts_at {
            return Err(AppError::BadRequest(
                "membership must end after it starts".to_string(),
            ));
        }
    }

    let assignment = state
        .backend
        .assign_membership(session.access_token()?, id, &payload)
        .await?;
    tracing::info!(
        tenant_id = %id,
        membership_id = %payload.membership_id,
        "membership assigned"
    );
    Ok(Json(assignment))
}

// --- Settings (tenant_owner) ---

/// get_settings
///
/// [Gated: /settings] The owner's own tenant, resolved from the session's `tenantId`.
#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Own tenant", body = Tenant),
        (status = 400, description = "Session not bound to a tenant")
    )
)]
pub async fn get_settings(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<Tenant>, AppError> {
    session.require_any(&[UserType::TenantOwner])?;
    let tenant = state
        .backend
        .get_tenant(session.access_token()?, session.tenant_id()?)
        .await?;
    Ok(Json(tenant))
}

/// update_settings
///
/// [Gated: /settings] The owner edits their own tenant's profile.
#[utoipa::path(
    patch,
    path = "/settings",
    request_body = UpdateTenantRequest,
    responses((status = 200, description = "Updated", body = Tenant))
)]
pub async fn update_settings(
    session: Session,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTenantRequest>,
) -> Result<Json<Tenant>, AppError> {
    session.require_any(&[UserType::TenantOwner])?;
    let tenant = state
        .backend
        .update_tenant(session.access_token()?, session.tenant_id()?, &payload)
        .await?;
    Ok(Json(tenant))
}
