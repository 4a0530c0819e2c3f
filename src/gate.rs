//! Route authorization gate.
//!
//! Every request passes through [`authorization_gate`]. Paths under a protected prefix need a
//! session whose `userType` is allowed by that prefix's [`RoutePolicy`]; failures become
//! redirects, never errors.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{Session, SessionClaims, SessionState, UserType};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const TENANTS_PATH: &str = "/tenants";
pub const SETTINGS_PATH: &str = "/settings";

/// RoutePolicy
///
/// One protected path prefix, the roles it admits, and where everyone else is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    pub prefix: &'static str,
    pub allowed: &'static [UserType],
    pub on_deny: &'static str,
}

impl RoutePolicy {
    pub fn allows(&self, user_type: Option<UserType>) -> bool {
        user_type.is_some_and(|user_type| self.allowed.contains(&user_type))
    }

    /// Whole-segment prefix match: `/tenants` covers `/tenants` and `/tenants/42`, not
    /// `/tenantsx`.
    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// The fixed policy table. One entry per prefix.
pub const ROUTE_POLICIES: &[RoutePolicy] = &[
    RoutePolicy {
        prefix: TENANTS_PATH,
        allowed: &[UserType::SystemAdmin],
        on_deny: DASHBOARD_PATH,
    },
    RoutePolicy {
        prefix: SETTINGS_PATH,
        allowed: &[UserType::TenantOwner],
        on_deny: DASHBOARD_PATH,
    },
    // The landing page cannot bounce to itself.
    RoutePolicy {
        prefix: DASHBOARD_PATH,
        allowed: &[
            UserType::SystemAdmin,
            UserType::TenantOwner,
            UserType::TenantUser,
        ],
        on_deny: LOGIN_PATH,
    },
];

/// GateDecision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

/// Returns the policy of the longest prefix matching `path`, if any.
pub fn matching_policy(path: &str) -> Option<&'static RoutePolicy> {
    ROUTE_POLICIES
        .iter()
        .filter(|policy| policy.matches(path))
        .max_by_key(|policy| policy.prefix.len())
}

/// Whether `path` needs a session at all. The root only requires one, any role will do.
pub fn is_protected(path: &str) -> bool {
    path == "/" || matching_policy(path).is_some()
}

/// evaluate
///
/// Pure decision function behind the middleware.
pub fn evaluate(path: &str, claims: Option<&SessionClaims>) -> GateDecision {
    if !is_protected(path) {
        return GateDecision::Allow;
    }

    let Some(claims) = claims else {
        return GateDecision::Redirect(LOGIN_PATH);
    };

    match matching_policy(path) {
        Some(policy) if !policy.allows(claims.user_type) => GateDecision::Redirect(policy.on_deny),
        _ => GateDecision::Allow,
    }
}

/// authorization_gate
///
/// Middleware wrapping the whole router. On allow, the decoded session rides along in the
/// request extensions so handlers do not decode the token twice.
pub async fn authorization_gate(
    State(sessions): State<SessionState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = sessions.resolve(request.headers());

    match evaluate(request.uri().path(), claims.as_ref()) {
        GateDecision::Allow => {
            if let Some(claims) = claims {
                request.extensions_mut().insert(Session(claims));
            }
            next.run(request).await
        }
        GateDecision::Redirect(target) => {
            tracing::debug!(
                path = %request.uri().path(),
                user_type = ?claims.as_ref().and_then(|c| c.user_type),
                redirect = target,
                "request redirected by authorization gate"
            );
            Redirect::temporary(target).into_response()
        }
    }
}
