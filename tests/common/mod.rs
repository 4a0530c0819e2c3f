#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use reqwest::StatusCode as BackendStatus;
use tenant_portal::{
    AppConfig, AppState, create_router,
    auth::{JwtSessionResolver, Profile, SessionClaims, UserType},
    backend::{BackendApi, BackendError},
    models::{
        AssignMembershipRequest, CreateTenantRequest, Membership, Page, PageMeta, Patient,
        PatientFilter, Tenant, TenantFilter, TenantMembership, UpdateTenantRequest,
        UpdateTenantStatusRequest,
    },
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-value-1234567890";
pub const TEST_ACCESS_TOKEN: &str = "backend-access-token";
pub const TEST_TENANT_ID: Uuid = Uuid::from_u128(42);

// --- Tokens ---

pub fn now() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub fn claims_for(user_type: Option<UserType>) -> SessionClaims {
    SessionClaims {
        access_token: Some(TEST_ACCESS_TOKEN.to_string()),
        username: "jdoe".to_string(),
        user_type,
        tenant_id: Some(TEST_TENANT_ID),
        profile: Some(Profile {
            id: Some("user-1".to_string()),
            email: Some("jdoe@example.com".to_string()),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            avatar_url: None,
        }),
        exp: now() + 3600,
        iat: Some(now()),
    }
}

pub fn sign<T: serde::Serialize>(claims: &T) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn token_for(user_type: UserType) -> String {
    sign(&claims_for(Some(user_type)))
}

/// A token whose payload carries an arbitrary `userType` string.
pub fn token_with_raw_user_type(raw: &str) -> String {
    sign(&serde_json::json!({
        "accessToken": TEST_ACCESS_TOKEN,
        "username": "jdoe",
        "userType": raw,
        "exp": now() + 3600,
    }))
}

// --- Mock Backend ---

/// Records every call as "<operation> <token>" and answers with canned data, or with
/// `fail_with` / `reject_with` when set.
#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<String>>,
    pub fail_with: Option<BackendStatus>,
    pub reject_with: Option<String>,
}

impl MockBackend {
    pub fn failing(status: BackendStatus) -> Self {
        Self {
            fail_with: Some(status),
            ..Default::default()
        }
    }

    /// Answers like a backend envelope with `success: false`.
    pub fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &str, token: &str) -> Result<(), BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{operation} {token}"));
        if let Some(message) = &self.reject_with {
            return Err(BackendError::Rejected(message.clone()));
        }
        match self.fail_with {
            Some(status) => Err(BackendError::Status {
                status,
                message: format!("mock failure for {operation}"),
            }),
            None => Ok(()),
        }
    }
}

pub fn sample_tenant(id: Uuid) -> Tenant {
    Tenant {
        id,
        name: "Clinica Central".to_string(),
        slug: Some("clinica-central".to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn list_tenants(
        &self,
        token: &str,
        filter: &TenantFilter,
    ) -> Result<Page<Tenant>, BackendError> {
        self.record("list_tenants", token)?;
        Ok(Page {
            items: vec![sample_tenant(Uuid::from_u128(1)), sample_tenant(Uuid::from_u128(2))],
            meta: PageMeta {
                page: filter.page.unwrap_or(1),
                limit: filter.limit.unwrap_or(10),
                total: 2,
                total_pages: 1,
            },
        })
    }

    async fn get_tenant(&self, token: &str, id: Uuid) -> Result<Tenant, BackendError> {
        self.record("get_tenant", token)?;
        Ok(sample_tenant(id))
    }

    async fn create_tenant(
        &self,
        token: &str,
        req: &CreateTenantRequest,
    ) -> Result<Tenant, BackendError> {
        self.record("create_tenant", token)?;
        Ok(Tenant {
            name: req.name.clone(),
            ..sample_tenant(Uuid::from_u128(7))
        })
    }

    async fn update_tenant(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTenantRequest,
    ) -> Result<Tenant, BackendError> {
        self.record("update_tenant", token)?;
        let mut tenant = sample_tenant(id);
        if let Some(name) = &req.name {
            tenant.name = name.clone();
        }
        Ok(tenant)
    }

    async fn delete_tenant(&self, token: &str, _id: Uuid) -> Result<(), BackendError> {
        self.record("delete_tenant", token)
    }

    async fn update_tenant_status(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTenantStatusRequest,
    ) -> Result<Tenant, BackendError> {
        self.record("update_tenant_status", token)?;
        Ok(Tenant {
            status: req.status,
            ..sample_tenant(id)
        })
    }

    async fn list_memberships(&self, token: &str) -> Result<Vec<Membership>, BackendError> {
        self.record("list_memberships", token)?;
        Ok(vec![Membership {
            id: Uuid::from_u128(100),
            name: "Pro".to_string(),
            ..Default::default()
        }])
    }

    async fn assign_membership(
        &self,
        token: &str,
        tenant_id: Uuid,
        req: &AssignMembershipRequest,
    ) -> Result<TenantMembership, BackendError> {
        self.record("assign_membership", token)?;
        Ok(TenantMembership {
            tenant_id,
            membership_id: req.membership_id,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            status: Some("active".to_string()),
        })
    }

    async fn list_patients(
        &self,
        token: &str,
        _filter: &PatientFilter,
    ) -> Result<Page<Patient>, BackendError> {
        self.record("list_patients", token)?;
        Ok(Page {
            items: vec![],
            meta: PageMeta {
                page: 1,
                limit: 10,
                total: 0,
                total_pages: 0,
            },
        })
    }

    async fn get_patient(&self, token: &str, id: Uuid) -> Result<Patient, BackendError> {
        self.record("get_patient", token)?;
        Ok(Patient {
            id,
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            ..Default::default()
        })
    }
}

// --- App Scaffolding ---

pub fn test_state(backend: Arc<MockBackend>) -> AppState {
    let config = AppConfig {
        jwt_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState {
        backend,
        sessions: Arc::new(JwtSessionResolver::from_config(&config)),
        config,
    }
}

pub fn test_router(backend: Arc<MockBackend>) -> Router {
    create_router(test_state(backend))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Drives one request through the router in-process.
pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request("GET", uri, token, None)
}

pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    json: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match json {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
