//! Service configuration
//!
//! Read from `SHOPLIST_*` environment variables on top of built-in defaults,
//! e.g. `SHOPLIST_PORT=9000` or `SHOPLIST_STORE_BACKEND=memory`. Connection
//! strings stay with [`common::database::DatabaseConfig`] and
//! [`common::cache::RedisConfig`].

use std::time::Duration;

use auth::HashConfig;
use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Where lists, items and users are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Where sessions are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    Memory,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub session_ttl_secs: u64,
    pub session_refresh_timeout_ms: u64,
    pub share_validity_days: u64,
    pub request_timeout_secs: u64,
    pub store_backend: StoreBackend,
    pub session_backend: SessionBackend,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl AppConfig {
    /// Load the configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let hash = HashConfig::default();

        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000_i64)?
            .set_default("session_ttl_secs", 120_i64)?
            .set_default("session_refresh_timeout_ms", 2000_i64)?
            .set_default("share_validity_days", 365_i64)?
            .set_default("request_timeout_secs", 10_i64)?
            .set_default("store_backend", "postgres")?
            .set_default("session_backend", "redis")?
            .set_default("hash_memory_kib", i64::from(hash.memory_kib))?
            .set_default("hash_iterations", i64::from(hash.iterations))?
            .set_default("hash_parallelism", i64::from(hash.parallelism))?
            .add_source(Environment::with_prefix("SHOPLIST").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn session_refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.session_refresh_timeout_ms)
    }

    pub fn share_validity(&self) -> Duration {
        Duration::from_secs(self.share_validity_days * 24 * 60 * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn hash_config(&self) -> HashConfig {
        HashConfig {
            memory_kib: self.hash_memory_kib,
            iterations: self.hash_iterations,
            parallelism: self.hash_parallelism,
        }
    }
}
