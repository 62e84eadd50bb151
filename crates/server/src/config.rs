//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_API_KEY` - App client ID used for the token exchange
//! - `SHOPIFY_API_SECRET` - App client secret; also signs session tokens
//!
//! ## Optional
//! - `STOCKGATE_HOST` - Bind address (default: 127.0.0.1)
//! - `STOCKGATE_PORT` - Listen port (default: 3002)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-04)
//! - `STOCKGATE_UPSTREAM_TIMEOUT_SECS` - Timeout for calls to Shopify (default: 5)
//! - `STOCKGATE_EXPOSE_DIAGNOSTICS` - Echo access token and raw Admin API
//!   payload in responses; development only (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_API_VERSION: &str = "2024-04";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;

/// Values that indicate a secret was never filled in (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Proxy application configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify app credentials and API version
    pub shopify: ShopifyAppConfig,
    /// Timeout applied to every call to Shopify
    pub upstream_timeout: Duration,
    /// Echo the access token and raw Admin API payload in responses.
    /// Development scaffolding; must stay off in production.
    pub expose_diagnostics: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the client secret. The secret is
/// dual-purpose: it verifies session token signatures and authenticates the
/// token-exchange call.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client ID
    pub api_key: String,
    /// App client secret
    pub api_secret: SecretString,
    /// Admin API version (e.g., 2024-04)
    pub api_version: String,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the client secret looks like an unfilled placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOCKGATE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOCKGATE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("STOCKGATE_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOCKGATE_PORT".to_string(), e.to_string()))?;

        let shopify = ShopifyAppConfig::from_env()?;

        let timeout_secs = get_env_or_default(
            "STOCKGATE_UPSTREAM_TIMEOUT_SECS",
            &DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("STOCKGATE_UPSTREAM_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let expose_diagnostics = parse_bool("STOCKGATE_EXPOSE_DIAGNOSTICS")?;

        Ok(Self {
            host,
            port,
            shopify,
            upstream_timeout: Duration::from_secs(timeout_secs),
            expose_diagnostics,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional boolean flag (absent means false).
fn parse_bool(key: &str) -> Result<bool, ConfigError> {
    match get_optional_env(key) {
        None => Ok(false),
        Some(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        },
    }
}

/// Reject secrets that are obviously placeholders.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
