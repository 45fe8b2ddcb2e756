//! Server configuration read from the environment.

use std::env;
use std::fmt::Display;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use coursemart_postgres::{MaxConnections, PostgresConfig};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::AdminTokens;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "5000";
const DEFAULT_MAX_CONNECTIONS: &str = "10";
const DEFAULT_ACQUIRE_TIMEOUT_SECS: &str = "30";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: &str = "5242880";

/// Configuration that cannot be used to start the server.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is set but does not parse.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value as found.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host, `COURSEMART_HOST`.
    pub host: String,
    /// Bind port, `COURSEMART_PORT`.
    pub port: u16,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Pool settings used when `database_url` is set.
    pub postgres: PostgresConfig,
    /// Directory uploaded images are written to and served from.
    pub upload_dir: PathBuf,
    /// Request body limit, which bounds image size.
    pub max_upload_bytes: usize,
    /// Bearer tokens accepted for event mutations.
    pub admin_tokens: AdminTokens,
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_connections: NonZeroU32 =
            try_load(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let acquire_timeout_secs: u64 = try_load(
            &lookup,
            "DB_ACQUIRE_TIMEOUT_SECS",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if database_url.is_none() {
            warn!("DATABASE_URL not set, documents will be kept in memory only");
        }

        Ok(Self {
            host: try_load(&lookup, "COURSEMART_HOST", DEFAULT_HOST)?,
            port: try_load(&lookup, "COURSEMART_PORT", DEFAULT_PORT)?,
            database_url,
            postgres: PostgresConfig {
                max_connections: MaxConnections::new(max_connections),
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                ..PostgresConfig::default()
            },
            upload_dir: try_load(&lookup, "COURSEMART_UPLOAD_DIR", DEFAULT_UPLOAD_DIR)?,
            max_upload_bytes: try_load(
                &lookup,
                "COURSEMART_MAX_UPLOAD_BYTES",
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            admin_tokens: AdminTokens::parse(
                lookup("COURSEMART_ADMIN_TOKENS").as_deref().unwrap_or_default(),
            ),
        })
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::InvalidValue {
            key,
            value,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).expect("defaults are valid");

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.database_url, None);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.postgres.acquire_timeout, Duration::from_secs(30));
        assert!(config.admin_tokens.is_empty());
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = config_from(&[
            ("COURSEMART_PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/coursemart"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("COURSEMART_ADMIN_TOKENS", "alpha, beta"),
        ])
        .expect("values are valid");

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/coursemart")
        );
        let max_connections: NonZeroU32 = config.postgres.max_connections.into();
        assert_eq!(max_connections.get(), 4);
        assert!(config.admin_tokens.accepts("beta"));
    }

    #[test]
    fn blank_database_url_selects_memory_store() {
        let config = config_from(&[("DATABASE_URL", "  ")]).expect("blank is allowed");

        assert_eq!(config.database_url, None);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let error = config_from(&[("DB_MAX_CONNECTIONS", "0")]).expect_err("zero connections");

        assert!(matches!(
            error,
            ConfigError::InvalidValue {
                key: "DB_MAX_CONNECTIONS",
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let error = config_from(&[("COURSEMART_PORT", "http")]).expect_err("not a port");

        assert!(error.to_string().starts_with("invalid value \"http\" for COURSEMART_PORT"));
    }
}
