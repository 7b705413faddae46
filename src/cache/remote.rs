//! Remote Cache Module
//!
//! The remote backing store seen through a small async trait, with the
//! Redis implementation used in production.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use serde::Serialize;

use crate::cache::MAX_TTL_SECONDS;
use crate::error::{CacheError, Result};

// == Remote Info ==
/// Raw server-side counters reported by the remote store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemoteInfo {
    /// Output of `INFO memory`
    pub memory: String,
    /// Output of `INFO keyspace`
    pub keyspace: String,
}

// == Remote Cache Trait ==
/// Key/value operations delegated to a remote cache service.
///
/// Values are already serialized; the remote side owns TTL bookkeeping.
/// Connectivity failures must surface as [`CacheError::Disconnected`] so the
/// store knows to switch to its fallback map.
#[async_trait]
pub trait RemoteCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    /// Returns whether a key was removed.
    async fn del(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Returns whether the key existed and had its expiry updated.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool>;

    async fn flush(&self) -> Result<()>;

    async fn info(&self) -> Result<RemoteInfo>;

    async fn ping(&self) -> Result<()>;
}

// == Redis Remote ==
/// Redis-backed remote cache over a multiplexed connection.
pub struct RedisRemote {
    conn: MultiplexedConnection,
}

impl RedisRemote {
    /// Opens a multiplexed connection, giving up after `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::open(url)?;

        let conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| {
                CacheError::Disconnected(format!("connect timed out after {:?}", timeout))
            })??;

        Ok(Self { conn })
    }
}

#[async_trait]
impl RemoteCache for RedisRemote {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds.min(MAX_TTL_SECONDS))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let count: i64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count > 0)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let mut conn = self.conn.clone();
        let updated: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_seconds.min(MAX_TTL_SECONDS))
            .query_async(&mut conn)
            .await?;
        Ok(updated == 1)
    }

    async fn flush(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn info(&self) -> Result<RemoteInfo> {
        let mut conn = self.conn.clone();
        let memory: String = redis::cmd("INFO").arg("memory").query_async(&mut conn).await?;
        let keyspace: String = redis::cmd("INFO")
            .arg("keyspace")
            .query_async(&mut conn)
            .await?;
        Ok(RemoteInfo { memory, keyspace })
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = RedisRemote::connect("not a url", Duration::from_millis(100)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connect_unreachable_host_fails() {
        // Port 1 on localhost refuses connections
        let result = RedisRemote::connect("redis://127.0.0.1:1", Duration::from_secs(2)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fake_remote_toggles_reachability() {
        let remote = fake::FakeRemote::new();
        remote.set_ex("k", "1", 60).await.unwrap();
        assert_eq!(remote.get("k").await.unwrap().as_deref(), Some("1"));

        remote.set_reachable(false);
        assert!(matches!(
            remote.get("k").await,
            Err(CacheError::Disconnected(_))
        ));

        remote.set_reachable(true);
        assert!(remote.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_fake_remote_rejects_out_of_range_ttl() {
        let remote = fake::FakeRemote::new();

        assert!(matches!(
            remote.set_ex("k", "1", MAX_TTL_SECONDS + 1).await,
            Err(CacheError::Remote(_))
        ));
        remote.set_ex("k", "1", MAX_TTL_SECONDS).await.unwrap();
        assert_eq!(remote.get("k").await.unwrap().as_deref(), Some("1"));
    }
}
