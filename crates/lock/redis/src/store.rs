use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::{AsyncCommands, Script};

use leaselock::error::LockError;
use leaselock::store::LockStore;

use crate::config::RedisConfig;
use crate::scripts;

/// Redis-backed [`LockStore`].
///
/// See the [module-level documentation](crate) for consistency notes.
pub struct RedisLockStore {
    pool: Pool,
    prefix: String,
}

impl RedisLockStore {
    /// Create a new `RedisLockStore` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, LockError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| LockError::Connection(e.to_string()))?
            .map_err(|e| LockError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
        })
    }

    /// Build the full Redis key for a resource.
    fn lock_key(&self, resource: &str) -> String {
        format!("{}:lock:{}", self.prefix, resource)
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, LockError> {
        self.pool
            .get()
            .await
            .map_err(|e| LockError::Connection(e.to_string()))
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn set_if_absent(
        &self,
        resource: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, LockError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let mut conn = self.conn().await?;

        let result: i64 = Script::new(scripts::LOCK_ACQUIRE)
            .key(self.lock_key(resource))
            .arg(token)
            .arg(ttl_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;

        Ok(result == 1)
    }

    async fn compare_and_delete(&self, resource: &str, token: &str) -> Result<bool, LockError> {
        let mut conn = self.conn().await?;

        let result: i64 = Script::new(scripts::LOCK_RELEASE)
            .key(self.lock_key(resource))
            .arg(token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;

        Ok(result == 1)
    }

    async fn compare_and_expire(
        &self,
        resource: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, LockError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let mut conn = self.conn().await?;

        let result: i64 = Script::new(scripts::LOCK_EXTEND)
            .key(self.lock_key(resource))
            .arg(token)
            .arg(ttl_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;

        Ok(result == 1)
    }

    async fn current_holder(&self, resource: &str) -> Result<Option<String>, LockError> {
        let mut conn = self.conn().await?;
        let holder: Option<String> = conn
            .get(self.lock_key(resource))
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;
        Ok(holder)
    }
}
