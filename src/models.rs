use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{Profile, UserType};

// --- Backend Envelope ---

/// ResponseCode
///
/// The backend's `code` field. Some endpoints send the HTTP status as a number,
/// others a symbolic string such as `TENANT_NOT_FOUND`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseCode {
    Numeric(i64),
    Text(String),
}

/// ApiEnvelope
///
/// The uniform `{ success, data, code, message }` wrapper around every backend response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub code: Option<ResponseCode>,
    #[serde(default)]
    pub message: Option<String>,
}

/// PaginatedEnvelope
///
/// Paginated variant of the envelope, adding the `meta` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedEnvelope<T> {
    pub success: bool,
    // A plain `default` would make serde demand T: Default.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub code: Option<ResponseCode>,
    #[serde(default)]
    pub message: Option<String>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    #[ts(type = "number")]
    pub total: u64,
    pub total_pages: u32,
}

/// Page
///
/// A page of items as served to the browser by the list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> From<PaginatedEnvelope<T>> for Page<T> {
    fn from(envelope: PaginatedEnvelope<T>) -> Self {
        Page {
            items: envelope.data,
            meta: envelope.meta,
        }
    }
}

// --- Tenants ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TenantStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

/// Tenant
///
/// A customer organization as returned by `GET /tenants/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: TenantStatus,
    #[serde(default)]
    pub membership_id: Option<Uuid>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateTenantRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_id: Option<Uuid>,
}

/// UpdateTenantRequest
///
/// Partial update: only the provided fields are forwarded to `PATCH /tenants/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateTenantRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateTenantStatusRequest {
    pub status: TenantStatus,
}

/// TenantFilter
///
/// Query parameters accepted by `GET /tenants` and forwarded verbatim to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct TenantFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TenantStatus>,
}

// --- Memberships ---

/// Membership
///
/// A subscription plan. `features` toggles product modules on or off, `limits` caps
/// usage counters (users, patients, storage, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Membership {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub features: HashMap<String, bool>,
    #[serde(default)]
    #[ts(type = "Record<string, number>")]
    pub limits: HashMap<String, i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssignMembershipRequest {
    pub membership_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TenantMembership {
    pub tenant_id: Uuid,
    pub membership_id: Uuid,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

// --- Patients ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Patient {
    pub id: Uuid,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct PatientFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

// --- Session ---

/// SessionSummary
///
/// What `GET /dashboard` tells the browser about the signed-in user. The backend access
/// token stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionSummary {
    pub username: String,
    pub user_type: Option<UserType>,
    pub tenant_id: Option<Uuid>,
    pub profile: Option<Profile>,
}
