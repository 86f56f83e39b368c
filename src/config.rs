use std::env;

/// AppConfig
///
/// Holds the application's configuration state, immutable once loaded and
/// shared across all requests via the application state. Pulled into
/// handlers through `FromRef`.
#[derive(Clone)]
pub struct AppConfig {
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Runtime environment marker. Selects the logging format and cookie hardening.
    pub env: Env,
    // When true, session and csrf cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

/// Env
///
/// Defines the runtime context, used to switch between development
/// conveniences (pretty logs, plain cookies) and production settings
/// (JSON logs, Secure cookies).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Provides a safe, non-panicking AppConfig instance used for test
    /// setup, so tests never depend on ambient environment variables.
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            env: Env::Local,
            cookie_secure: false,
        }
    }
}

impl AppConfig {
    /// The canonical function for initializing the application
    /// configuration at startup. Reads all parameters from environment
    /// variables, falling back to local-development defaults.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            bind_addr,
            cookie_secure: env == Env::Production,
            env,
        }
    }
}
