//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional, with defaults matching the standard local deployment:
//! - `MARIGOLD_AUTH_SERVICE_URL` - auth service base URL (default: http://localhost:8082)
//! - `MARIGOLD_CART_SERVICE_URL` - cart service base URL (default: http://localhost:8084)
//! - `MARIGOLD_ORDER_SERVICE_URL` - order service base URL (default: http://localhost:8085)
//! - `MARIGOLD_PAYMENT_SERVICE_URL` - payment service base URL (default: http://localhost:8086)
//! - `MARIGOLD_REQUEST_TIMEOUT_SECS` - per-request timeout override; unset
//!   means the transport default applies (no step-specific deadlines exist
//!   anywhere in the engine)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Base URLs and transport settings for the client engine.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Auth service base URL (sign-in only; no bearer token required).
    pub auth_service_url: Url,
    /// Cart service base URL.
    pub cart_service_url: Url,
    /// Order service base URL.
    pub order_service_url: Url,
    /// Payment service base URL.
    pub payment_service_url: Url,
    /// Optional per-request timeout. `None` keeps reqwest's defaults.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            auth_service_url: get_url("MARIGOLD_AUTH_SERVICE_URL", "http://localhost:8082")?,
            cart_service_url: get_url("MARIGOLD_CART_SERVICE_URL", "http://localhost:8084")?,
            order_service_url: get_url("MARIGOLD_ORDER_SERVICE_URL", "http://localhost:8085")?,
            payment_service_url: get_url("MARIGOLD_PAYMENT_SERVICE_URL", "http://localhost:8086")?,
            request_timeout: get_timeout("MARIGOLD_REQUEST_TIMEOUT_SECS")?,
        })
    }

    /// Configuration with every service on one base URL.
    ///
    /// Used by tests that stand up a single in-process backend.
    #[must_use]
    pub fn single_host(base: &Url) -> Self {
        Self {
            auth_service_url: base.clone(),
            cart_service_url: base.clone(),
            order_service_url: base.clone(),
            payment_service_url: base.clone(),
            request_timeout: None,
        }
    }
}

fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_url(name: &str, default: &str) -> Result<Url, ConfigError> {
    get_env_or_default(name, default)
        .parse::<Url>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}

fn get_timeout(name: &str) -> Result<Option<Duration>, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
    }
}
