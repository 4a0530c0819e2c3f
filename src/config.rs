use std::{env, time::Duration};

/// AppConfig
///
/// Holds the portal's entire configuration state. Loaded once at startup and never
/// mutated afterwards; handlers and the gate pull it out of the shared state via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls which secrets are mandatory.
    pub env: Env,
    // Shared secret used to validate session tokens issued by the identity provider.
    pub jwt_secret: String,
    // Base URL of the backend REST API (tenants, memberships, patients).
    pub api_base_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Name of the cookie carrying the session token when no Authorization header is sent.
    pub session_cookie: String,
    // External sign-in page. When unset, /login answers with a JSON hint instead.
    pub login_url: Option<String>,
    // Per-request timeout for calls to the backend API.
    pub api_timeout: Duration,
}

/// Env
///
/// Defines the runtime context: local development with permissive fallbacks, or
/// production where every secret must be provided explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SESSION_COOKIE: &str = "session-token";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

const LOCAL_AUTH_SECRET: &str = "local-development-auth-secret";
const LOCAL_API_BASE_URL: &str = "http://localhost:4000/api";

impl Default for AppConfig {
    /// Safe, non-panicking configuration used to scaffold state in tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_AUTH_SECRET.to_string(),
            api_base_url: LOCAL_API_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            login_url: None,
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `AUTH_SECRET` or `API_BASE_URL` is missing, so the
    /// portal never starts with a guessable token secret or a localhost backend.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let (jwt_secret, api_base_url) = match env {
            Env::Production => (
                env::var("AUTH_SECRET").expect("FATAL: AUTH_SECRET must be set in production."),
                env::var("API_BASE_URL").expect("FATAL: API_BASE_URL must be set in production."),
            ),
            Env::Local => (
                env::var("AUTH_SECRET").unwrap_or_else(|_| LOCAL_AUTH_SECRET.to_string()),
                env::var("API_BASE_URL").unwrap_or_else(|_| LOCAL_API_BASE_URL.to_string()),
            ),
        };

        let api_timeout = env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        Self {
            env,
            jwt_secret,
            api_base_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            session_cookie: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string()),
            login_url: env::var("LOGIN_URL").ok().filter(|url| !url.is_empty()),
            api_timeout: Duration::from_secs(api_timeout),
        }
    }
}
