use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ApiEnvelope, AssignMembershipRequest, CreateTenantRequest, Membership, Page,
    PaginatedEnvelope, Patient, PatientFilter, Tenant, TenantFilter, TenantMembership,
    UpdateTenantRequest, UpdateTenantStatusRequest,
};

/// BackendError
///
/// Failures talking to the backend REST API.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend answered {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("backend rejected the request: {0}")]
    Rejected(String),

    #[error("backend response carried no data")]
    MissingData,

    #[error("malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// BackendApi
///
/// The subset of the backend REST API the portal consumes. Every call carries the
/// caller's access token; the backend does its own tenant scoping with it.
#[async_trait]
pub trait BackendApi: Send + Sync {
    // --- Tenants ---
    async fn list_tenants(
        &self,
        token: &str,
        filter: &TenantFilter,
    ) -> Result<Page<Tenant>, BackendError>;
    async fn get_tenant(&self, token: &str, id: Uuid) -> Result<Tenant, BackendError>;
    async fn create_tenant(
        &self,
        token: &str,
        req: &CreateTenantRequest,
    ) -> Result<Tenant, BackendError>;
    async fn update_tenant(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTenantRequest,
    ) -> Result<Tenant, BackendError>;
    async fn delete_tenant(&self, token: &str, id: Uuid) -> Result<(), BackendError>;
    async fn update_tenant_status(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTenantStatusRequest,
    ) -> Result<Tenant, BackendError>;

    // --- Memberships ---
    async fn list_memberships(&self, token: &str) -> Result<Vec<Membership>, BackendError>;
    async fn assign_membership(
        &self,
        token: &str,
        tenant_id: Uuid,
        req: &AssignMembershipRequest,
    ) -> Result<TenantMembership, BackendError>;

    // --- Patients ---
    async fn list_patients(
        &self,
        token: &str,
        filter: &PatientFilter,
    ) -> Result<Page<Patient>, BackendError>;
    async fn get_patient(&self, token: &str, id: Uuid) -> Result<Patient, BackendError>;
}

pub type BackendState = Arc<dyn BackendApi>;

/// RequestKind
///
/// Reads and writes get different retry budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Write,
}

impl RequestKind {
    fn of(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD {
            RequestKind::Read
        } else {
            RequestKind::Write
        }
    }
}

/// RetryPolicy
///
/// Exponential backoff for transient failures: `base_delay * 2^attempt`, capped at
/// `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub read_retries: u32,
    pub write_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            read_retries: 3,
            write_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn max_retries(&self, kind: RequestKind) -> u32 {
        match kind {
            RequestKind::Read => self.read_retries,
            RequestKind::Write => self.write_retries,
        }
    }

    /// Delay before retry number `attempt + 1` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// HttpBackendClient
///
/// `BackendApi` over HTTP. Cheap to clone; the inner reqwest client pools connections.
#[derive(Clone)]
pub struct HttpBackendClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpBackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token)
    }

    /// Sends the request built by `build`, rebuilding and resending it while the failure
    /// is transient and the retry budget for its kind lasts.
    async fn execute<F>(&self, method: Method, build: F) -> Result<reqwest::Response, BackendError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let max_retries = self.retry.max_retries(RequestKind::of(&method));
        let mut attempt = 0;

        loop {
            let outcome = build().send().await;
            let transient = match &outcome {
                Ok(response) => is_transient_status(response.status()),
                Err(e) => is_transient_error(e),
            };

            if !transient || attempt >= max_retries {
                return Ok(outcome?);
            }

            let delay = self.retry.delay_for(attempt);
            match &outcome {
                Ok(response) => tracing::warn!(
                    %method,
                    status = %response.status(),
                    attempt = attempt + 1,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "transient backend status, retrying"
                ),
                Err(e) => tracing::warn!(
                    %method,
                    error = %e,
                    attempt = attempt + 1,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "backend request failed, retrying"
                ),
            }
            drop(outcome);

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Reads the body and turns a non-2xx status into `BackendError::Status`, using the
    /// envelope's message when the backend sent one.
    async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, BackendError> {
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let message = serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });

        Err(BackendError::Status { status, message })
    }

    async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, BackendError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let response = self
            .execute(method.clone(), || {
                let request = self.request(method.clone(), path, token);
                match body {
                    Some(body) => request.json(body),
                    None => request,
                }
            })
            .await?;

        let body = Self::read_body(response).await?;
        if body.is_empty() {
            return Ok(None);
        }

        let envelope: ApiEnvelope<T> = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(BackendError::Rejected(
                envelope.message.unwrap_or_else(|| "no reason given".to_string()),
            ));
        }
        Ok(envelope.data)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, BackendError> {
        self.call::<T, ()>(Method::GET, path, token, None)
            .await?
            .ok_or(BackendError::MissingData)
    }

    async fn send<T, B>(&self, method: Method, path: &str, token: &str, body: &B) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        self.call(method, path, token, Some(body))
            .await?
            .ok_or(BackendError::MissingData)
    }

    async fn fetch_page<T, Q>(&self, path: &str, token: &str, query: &Q) -> Result<Page<T>, BackendError>
    where
        T: DeserializeOwned,
        Q: Serialize + Sync,
    {
        let response = self
            .execute(Method::GET, || {
                self.request(Method::GET, path, token).query(query)
            })
            .await?;

        let body = Self::read_body(response).await?;
        let envelope: PaginatedEnvelope<T> = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(BackendError::Rejected(
                envelope.message.unwrap_or_else(|| "no reason given".to_string()),
            ));
        }
        Ok(envelope.into())
    }
}

#[async_trait]
impl BackendApi for HttpBackendClient {
    async fn list_tenants(
        &self,
        token: &str,
        filter: &TenantFilter,
    ) -> Result<Page<Tenant>, BackendError> {
        self.fetch_page("/tenants", token, filter).await
    }

    async fn get_tenant(&self, token: &str, id: Uuid) -> Result<Tenant, BackendError> {
        self.fetch(&format!("/tenants/{id}"), token).await
    }

    async fn create_tenant(
        &self,
        token: &str,
        req: &CreateTenantRequest,
    ) -> Result<Tenant, BackendError> {
        self.send(Method::POST, "/tenants", token, req).await
    }

    async fn update_tenant(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTenantRequest,
    ) -> Result<Tenant, BackendError> {
        self.send(Method::PATCH, &format!("/tenants/{id}"), token, req)
            .await
    }

    async fn delete_tenant(&self, token: &str, id: Uuid) -> Result<(), BackendError> {
        // The backend may answer 204 or an envelope with null data; both mean done.
        self.call::<serde_json::Value, ()>(Method::DELETE, &format!("/tenants/{id}"), token, None)
            .await
            .map(|_| ())
    }

    async fn update_tenant_status(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTenantStatusRequest,
    ) -> Result<Tenant, BackendError> {
        self.send(Method::PATCH, &format!("/tenants/{id}/status"), token, req)
            .await
    }

    async fn list_memberships(&self, token: &str) -> Result<Vec<Membership>, BackendError> {
        self.fetch("/memberships", token).await
    }

    async fn assign_membership(
        &self,
        token: &str,
        tenant_id: Uuid,
        req: &AssignMembershipRequest,
    ) -> Result<TenantMembership, BackendError> {
        self.send(
            Method::POST,
            &format!("/tenants/{tenant_id}/membership"),
            token,
            req,
        )
        .await
    }

    async fn list_patients(
        &self,
        token: &str,
        filter: &PatientFilter,
    ) -> Result<Page<Patient>, BackendError> {
        self.fetch_page("/patients", token, filter).await
    }

    async fn get_patient(&self, token: &str, id: Uuid) -> Result<Patient, BackendError> {
        self.fetch(&format!("/patients/{id}"), token).await
    }
}
