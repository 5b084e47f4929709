//! Redis cache module for the shopping-list services
//!
//! This module provides functionality for connecting to Redis and performing
//! the handful of key-value operations the services need: set with TTL, get
//! and delete.

use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use crate::error::{CacheError, CacheResult};

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> CacheResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Ok(RedisConfig { url })
    }
}

/// Cheaply cloneable handle to a Redis server
///
/// Every operation checks out a multiplexed connection, so the handle can be
/// shared by any number of concurrent callers.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Initialize a new Redis handle
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.clone()).map_err(CacheError::Connection)?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> CacheResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::Connection)
    }

    /// Set a key-value pair in Redis with optional TTL
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;

        match ttl_seconds {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl)
                .await
                .map_err(CacheError::Command)?,
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(CacheError::Command)?,
        }

        debug!(key, ?ttl_seconds, "cache set");
        Ok(())
    }

    /// Get a value from Redis by key
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(CacheError::Command)?;
        Ok(value)
    }

    /// Delete a key from Redis, returning whether it existed
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        let removed: u64 = conn.del(key).await.map_err(CacheError::Command)?;
        debug!(key, removed, "cache delete");
        Ok(removed > 0)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::Command)?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_redis_config_defaults_to_localhost() {
        unsafe {
            std::env::remove_var("REDIS_URL");
        }

        let config = RedisConfig::from_env().unwrap();
        assert_eq!(config.url, "redis://localhost:6379");
    }

    #[test]
    #[serial]
    fn test_redis_config_reads_url() {
        unsafe {
            std::env::set_var("REDIS_URL", "redis://cache:6380");
        }

        let config = RedisConfig::from_env().unwrap();
        assert_eq!(config.url, "redis://cache:6380");

        unsafe {
            std::env::remove_var("REDIS_URL");
        }
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = RedisConfig {
            url: "not a redis url".to_string(),
        };

        assert!(matches!(
            RedisPool::new(&config),
            Err(CacheError::Connection(_))
        ));
    }
}
