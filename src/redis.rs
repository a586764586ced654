use crate::error::{Result, ShortenError};
use crate::store::{KeyValueStore, Namespace, StoreConnector};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, IntoConnectionInfo};
use std::time::Duration;

/// Opens Redis sessions, one logical database per namespace.
pub struct RedisConnector {
    links: Client,
    quota: Client,
}

impl RedisConnector {
    pub fn new(redis_url: &str) -> Result<Self> {
        Ok(Self {
            links: Self::client_for(redis_url, Namespace::Links)?,
            quota: Self::client_for(redis_url, Namespace::Quota)?,
        })
    }

    fn client_for(redis_url: &str, namespace: Namespace) -> Result<Client> {
        let mut info = redis_url.into_connection_info().map_err(|e| {
            ShortenError::StoreUnavailable(format!("Invalid Redis URL: {}", e))
        })?;
        info.redis.db = namespace.db_index();

        Client::open(info).map_err(|e| {
            ShortenError::StoreUnavailable(format!("Failed to create Redis client: {}", e))
        })
    }
}

#[async_trait]
impl StoreConnector for RedisConnector {
    async fn session(&self, namespace: Namespace) -> Result<Box<dyn KeyValueStore>> {
        let client = match namespace {
            Namespace::Links => &self.links,
            Namespace::Quota => &self.quota,
        };

        let conn = client.get_multiplexed_tokio_connection().await.map_err(|e| {
            tracing::error!(%namespace, error = %e, "Failed to connect to Redis");
            ShortenError::StoreUnavailable("Unable to connect to server".into())
        })?;

        Ok(Box::new(RedisSession { conn }))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// A single connection on one logical database; closed on drop.
pub struct RedisSession {
    conn: MultiplexedConnection,
}

#[async_trait]
impl KeyValueStore for RedisSession {
    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut self.conn)
            .await
            .map_err(|e| ShortenError::StoreUnavailable(format!("GET failed: {}", e)))
    }

    async fn set_ex(&mut self, key: &str, value: &str, seconds: u64) -> Result<()> {
        redis::cmd("SETEX")
            .arg(key)
            .arg(seconds)
            .arg(value)
            .query_async::<_, ()>(&mut self.conn)
            .await
            .map_err(|e| ShortenError::StoreUnavailable(format!("SETEX failed: {}", e)))
    }

    async fn set_nx_ex(&mut self, key: &str, value: &str, seconds: u64) -> Result<bool> {
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .arg("NX")
            .query_async(&mut self.conn)
            .await
            .map_err(|e| ShortenError::StoreUnavailable(format!("SET NX failed: {}", e)))?;

        Ok(reply.is_some())
    }

    async fn decr(&mut self, key: &str) -> Result<i64> {
        redis::cmd("DECR")
            .arg(key)
            .query_async::<_, i64>(&mut self.conn)
            .await
            .map_err(|e| ShortenError::StoreUnavailable(format!("DECR failed: {}", e)))
    }

    async fn ttl(&mut self, key: &str) -> Result<Option<Duration>> {
        let secs: i64 = redis::cmd("TTL")
            .arg(key)
            .query_async(&mut self.conn)
            .await
            .map_err(|e| ShortenError::StoreUnavailable(format!("TTL failed: {}", e)))?;

        // -2 means the key is gone, -1 means it never expires
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    async fn ping(&mut self) -> Result<()> {
        redis::cmd("PING")
            .query_async::<_, String>(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(|e| ShortenError::StoreUnavailable(format!("Ping failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_get_their_own_database() {
        let links = RedisConnector::client_for("redis://127.0.0.1:6379", Namespace::Links).unwrap();
        let quota = RedisConnector::client_for("redis://127.0.0.1:6379/5", Namespace::Quota).unwrap();

        assert_eq!(links.get_connection_info().redis.db, 0);
        assert_eq!(quota.get_connection_info().redis.db, 1);
    }

    #[test]
    fn rejects_non_redis_url() {
        assert!(RedisConnector::new("http://localhost:6379").is_err());
    }
}
