use std::env;

use crate::{error::ConfigError, routing::DEFAULT_MAX_REDIRECT_HOPS};

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// AppConfig
///
/// Holds the gateway's entire configuration. Loaded once at start-up and immutable afterwards;
/// handlers reach it through the shared `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the log format and the local session bypass.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Secret used to validate incoming session JWTs (HS256).
    pub jwt_secret: String,
    // Upper bound on redirect hops a single navigation may follow.
    pub max_redirect_hops: usize,
}

/// Env
///
/// Local turns on developer conveniences (pretty logs, `x-session-role` bypass); Production
/// demands every secret explicitly and logs JSON.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Test-friendly values that need no environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the process environment:
    ///
    /// - `APP_ENV`: `production` or anything else for local.
    /// - `BIND_ADDR`: defaults to `0.0.0.0:3000`.
    /// - `SESSION_JWT_SECRET`: mandatory in production, falls back to a fixed value locally.
    /// - `NAV_MAX_REDIRECT_HOPS`: positive integer, defaults to 1.
    ///
    /// # Errors
    /// Fails on a missing production secret or an unparsable hop bound, so the binary can
    /// refuse to start with an incomplete configuration.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (env::var("SESSION_JWT_SECRET"), &env) {
            (Ok(secret), _) => secret,
            (Err(_), Env::Production) => return Err(ConfigError::Missing("SESSION_JWT_SECRET")),
            (Err(_), Env::Local) => LOCAL_JWT_SECRET.to_string(),
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let max_redirect_hops = match env::var("NAV_MAX_REDIRECT_HOPS") {
            Err(_) => DEFAULT_MAX_REDIRECT_HOPS,
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(hops) if hops > 0 => hops,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "NAV_MAX_REDIRECT_HOPS",
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            env,
            bind_addr,
            jwt_secret,
            max_redirect_hops,
        })
    }
}
