//! Configuration loading and representation.
//!
//! Everything is read from environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `USE_PERSISTENT_STORES` | `false` | use Postgres instead of in-memory stores |
//! | `DATABASE_URL` | (unset) | required when persistent stores are enabled |
//! | `DB_MAX_CONNECTIONS` | `10` | pool size |
//! | `RESERVATION_LOCK_TIMEOUT_MS` | `2000` | bound on acquiring stock locks |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Tuning for the ledger's atomic units of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Upper bound on waiting for per-product exclusivity.
    pub lock_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` means in-memory stores.
    pub database: Option<DatabaseConfig>,
    pub ledger: LedgerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_or(&lookup, "BIND_ADDR", "0.0.0.0:8080".parse().ok())?;
        let lock_timeout_ms: u64 = parse_or(&lookup, "RESERVATION_LOCK_TIMEOUT_MS", Some(2000))?;
        if lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "RESERVATION_LOCK_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let persistent: bool = parse_or(&lookup, "USE_PERSISTENT_STORES", Some(false))?;
        let database = if persistent {
            let url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", Some(10))?;
            Some(DatabaseConfig {
                url,
                max_connections,
            })
        } else {
            None
        };

        Ok(Self {
            bind_addr,
            database,
            ledger: LedgerConfig {
                lock_timeout: Duration::from_millis(lock_timeout_ms),
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Option<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => default.ok_or(ConfigError::Missing(key)),
    }
}
