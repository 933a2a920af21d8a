//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (Postgres backend only)
//! - `LUMA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `LUMA_STORE_BACKEND` - `postgres` (default) or `memory`
//! - `LUMA_HOST` - Bind address (default: 127.0.0.1)
//! - `LUMA_PORT` - Listen port (default: 3000)
//! - `LUMA_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `LUMA_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where catalog, cart and order data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// `PostgreSQL` via `sqlx`.
    #[default]
    Postgres,
    /// In-process store seeded with the demo catalog. Data is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Storage backend
    pub backend: StoreBackend,
    /// `PostgreSQL` database connection URL (contains password). Set whenever
    /// the backend is Postgres.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// How long catalog reads are cached
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. `production`)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let backend = env.parse_or("LUMA_STORE_BACKEND", StoreBackend::default())?;
        let database_url = match backend {
            StoreBackend::Postgres => Some(env.database_url("LUMA_DATABASE_URL")?),
            StoreBackend::Memory => None,
        };

        let host = env.parse_or("LUMA_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?;
        let port = env.parse_or("LUMA_PORT", 3000_u16)?;

        let base_url = env.get_or_default("LUMA_BASE_URL", DEFAULT_BASE_URL);
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("LUMA_BASE_URL".to_string(), e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "LUMA_BASE_URL".to_string(),
                "must be an http or https URL".to_string(),
            ));
        }

        let catalog_cache_ttl = Duration::from_secs(
            env.parse_or("LUMA_CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
        );

        Ok(Self {
            backend,
            database_url,
            host,
            port,
            base_url,
            catalog_cache_ttl,
            sentry_dsn: env.get_optional("SENTRY_DSN"),
            sentry_environment: env.get_optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.sample_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.sample_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Configuration for the in-memory backend with every other value at
    /// its default. Ignores the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` only if the built-in defaults fail to parse.
    pub fn in_memory() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| (key == "LUMA_STORE_BACKEND").then(|| "memory".to_string()))
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (controls secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating empty values as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.get_optional(primary_key)
            .or_else(|| self.get_optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    /// Parse a sample rate between 0.0 and 1.0.
    fn sample_rate(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let rate = self.parse_or(key, default)?;
        if (0.0..=1.0).contains(&rate) {
            Ok(rate)
        } else {
            Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("must be between 0.0 and 1.0 (got {rate})"),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("LUMA_DATABASE_URL", "postgres://localhost/luma")]).unwrap();
        assert_eq!(config.backend, StoreBackend::Postgres);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.base_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
        assert!(config.sentry_traces_sample_rate.abs() < f32::EPSILON);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "LUMA_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fly/luma")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://fly/luma"
        );

        let config = load(&[
            ("LUMA_DATABASE_URL", "postgres://primary/luma"),
            ("DATABASE_URL", "postgres://fly/luma"),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://primary/luma"
        );
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = load(&[("LUMA_STORE_BACKEND", "Memory")]).unwrap();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_in_memory() {
        let config = StorefrontConfig::in_memory().unwrap();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_invalid_values() {
        let base = ("LUMA_STORE_BACKEND", "memory");
        assert!(matches!(
            load(&[base, ("LUMA_PORT", "70000")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[base, ("LUMA_HOST", "localhost")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[base, ("LUMA_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[base, ("LUMA_BASE_URL", "ftp://lumaliving.co.za")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[base, ("SENTRY_SAMPLE_RATE", "1.5")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[("LUMA_STORE_BACKEND", "sqlite")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_https_base_url_is_secure() {
        let config = load(&[
            ("LUMA_STORE_BACKEND", "memory"),
            ("LUMA_BASE_URL", "https://lumaliving.co.za"),
            ("LUMA_CATALOG_CACHE_TTL_SECS", "60"),
        ])
        .unwrap();
        assert!(config.is_secure());
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(60));
    }
}
