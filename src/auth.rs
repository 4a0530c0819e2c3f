use std::{fmt, str::FromStr, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{config::AppConfig, error::AppError};

/// UserType
///
/// The role claim issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserType {
    /// Platform operator.
    SystemAdmin,
    /// Customer administrator, owns exactly one tenant.
    TenantOwner,
    /// Customer staff.
    TenantUser,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::SystemAdmin => "system_admin",
            UserType::TenantOwner => "tenant_owner",
            UserType::TenantUser => "tenant_user",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system_admin" => Ok(UserType::SystemAdmin),
            "tenant_owner" => Ok(UserType::TenantOwner),
            "tenant_user" => Ok(UserType::TenantUser),
            other => Err(format!("unknown user type '{other}'")),
        }
    }
}

/// Profile
///
/// Identity fields nested inside the session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// SessionClaims
///
/// Payload of the session token. The identity provider owns issuance and expiry; this
/// service only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Bearer credential for the backend API.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub username: String,
    /// `None` when the claim is missing or names a role this service does not know.
    #[serde(default, deserialize_with = "lenient_user_type")]
    pub user_type: Option<UserType>,
    /// `None` when the claim is missing or is not a UUID.
    #[serde(default, deserialize_with = "lenient_tenant_id")]
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub profile: Option<Profile>,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

fn lenient_user_type<'de, D>(deserializer: D) -> Result<Option<UserType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok()))
}

fn lenient_tenant_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok()))
}

/// extract_token
///
/// Locates the raw session token on a request: the `Authorization: Bearer` header wins,
/// then the session cookie.
pub fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    bearer_token(headers).or_else(|| cookie_token(headers, cookie_name))
}

/// Token from `Authorization: Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (scheme, token) = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim()
        .split_once(' ')?;

    Some(token.trim())
        .filter(|token| scheme.eq_ignore_ascii_case("bearer") && !token.is_empty())
}

/// Token from the named session cookie.
pub fn cookie_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|token| !token.is_empty())
}

/// SessionResolver
///
/// The request context seam between the hosting framework and the authorization gate.
/// Implementations turn request headers into typed claims. Resolution is a fast local
/// operation: no I/O, and any failure simply means "no session".
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<SessionClaims>;
}

/// Shared handle to the configured resolver.
pub type SessionState = Arc<dyn SessionResolver>;

/// JwtSessionResolver
///
/// Validates HS256 session tokens signed with the shared `AUTH_SECRET`.
pub struct JwtSessionResolver {
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl JwtSessionResolver {
    pub fn new(secret: &str, cookie_name: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.session_cookie.clone())
    }

    /// Decodes a raw token, treating every failure (malformed, expired, bad signature) as
    /// unauthenticated.
    pub fn decode(&self, token: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                None
            }
        }
    }
}

impl SessionResolver for JwtSessionResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        // A stale Authorization header must not shadow a valid session cookie.
        bearer_token(headers)
            .and_then(|token| self.decode(token))
            .or_else(|| {
                cookie_token(headers, &self.cookie_name).and_then(|token| self.decode(token))
            })
    }
}

/// Session
///
/// The authenticated session of the current request. The gate stores it in the request
/// extensions; handlers take it as an argument.
#[derive(Debug, Clone)]
pub struct Session(pub SessionClaims);

impl Session {
    pub fn claims(&self) -> &SessionClaims {
        &self.0
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.0.user_type
    }

    /// Role check inside handlers, behind the gate's redirect.
    pub fn require_any(&self, allowed: &[UserType]) -> Result<(), AppError> {
        match self.0.user_type {
            Some(user_type) if allowed.contains(&user_type) => Ok(()),
            _ => Err(AppError::Forbidden),
        }
    }

    pub fn access_token(&self) -> Result<&str, AppError> {
        self.0
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)
    }

    pub fn tenant_id(&self) -> Result<Uuid, AppError> {
        self.0
            .tenant_id
            .ok_or_else(|| AppError::BadRequest("session is not bound to a tenant".to_string()))
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        // Routes outside the gated prefixes still get a session when a token is present.
        SessionState::from_ref(state)
            .resolve(&parts.headers)
            .map(Session)
            .ok_or(AppError::Unauthorized)
    }
}
