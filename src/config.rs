use std::{env, time::Duration};

/// AppConfig
///
/// Holds the portal's entire configuration state. Immutable once loaded and pulled
/// into handlers via FromRef, the same way every other piece of the Unified State is.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and cookie hardening.
    pub env: Env,
    // Base URL of the brokerage REST API (the auth endpoints live under `/auth`).
    pub api_base_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Shared HS256 secret for validating session tokens locally before asking the API.
    pub token_secret: Option<String>,
    // Upper bound for a single session restore. `None` waits forever.
    pub restore_timeout: Option<Duration>,
    // How long `GET /api/session?wait=true` blocks for a pending restore.
    pub session_wait_timeout: Duration,
    // Clients not seen for this long are torn down by the pruning task.
    pub client_idle_timeout: Duration,
    // Marks session cookies `Secure`.
    pub secure_cookies: bool,
}

/// Env
///
/// Runtime context: local development or hardened production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_RESTORE_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SESSION_WAIT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CLIENT_IDLE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking configuration for test state scaffolding. No environment
    /// variables are read.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            token_secret: None,
            restore_timeout: Some(Duration::from_secs(DEFAULT_RESTORE_TIMEOUT_SECS)),
            session_wait_timeout: Duration::from_secs(DEFAULT_SESSION_WAIT_TIMEOUT_SECS),
            client_idle_timeout: Duration::from_secs(DEFAULT_CLIENT_IDLE_TIMEOUT_SECS),
            secure_cookies: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics when `API_BASE_URL` is missing in production, or when a numeric
    /// setting is not a valid number of seconds. The portal refuses to start
    /// half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => {
                env::var("API_BASE_URL").expect("FATAL: API_BASE_URL must be set in production.")
            }
            Env::Local => {
                env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            }
        };

        // 0 disables the restore bound entirely.
        let restore_timeout = match seconds_var("SESSION_RESTORE_TIMEOUT_SECS", DEFAULT_RESTORE_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            token_secret: env::var("AUTH_TOKEN_SECRET").ok().filter(|s| !s.is_empty()),
            restore_timeout,
            session_wait_timeout: Duration::from_secs(seconds_var(
                "SESSION_WAIT_TIMEOUT_SECS",
                DEFAULT_SESSION_WAIT_TIMEOUT_SECS,
            )),
            client_idle_timeout: Duration::from_secs(seconds_var(
                "CLIENT_IDLE_TIMEOUT_SECS",
                DEFAULT_CLIENT_IDLE_TIMEOUT_SECS,
            )),
            secure_cookies: env == Env::Production,
            env,
        }
    }
}

fn seconds_var(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {name} must be a whole number of seconds, got {raw:?}")),
        Err(_) => default,
    }
}
