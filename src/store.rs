//! Key-value store abstraction shared by every request.
//!
//! Two logical namespaces are used: one holds short-code mappings and the
//! other holds per-client quota counters. A request opens a session per
//! namespace it needs and drops it when handling ends.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Logical store namespaces, mapped to Redis database indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Links,
    Quota,
}

impl Namespace {
    pub fn db_index(self) -> i64 {
        match self {
            Namespace::Links => 0,
            Namespace::Quota => 1,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Links => write!(f, "links"),
            Namespace::Quota => write!(f, "quota"),
        }
    }
}

/// Operations the service needs from a session on one namespace.
///
/// Individual calls are serialized by the store; sequences of calls are not.
#[async_trait]
pub trait KeyValueStore: Send {
    /// `None` when the key is absent. A present key with an empty value is `Some("")`.
    async fn get(&mut self, key: &str) -> Result<Option<String>>;

    async fn set_ex(&mut self, key: &str, value: &str, seconds: u64) -> Result<()>;

    /// Sets the key only when it is absent. Returns whether the write happened.
    async fn set_nx_ex(&mut self, key: &str, value: &str, seconds: u64) -> Result<bool>;

    /// Decrements the integer stored at `key`, creating it at 0 first if absent.
    async fn decr(&mut self, key: &str) -> Result<i64>;

    /// Remaining lifetime. `None` for absent keys and keys without an expiry.
    async fn ttl(&mut self, key: &str) -> Result<Option<Duration>>;

    async fn ping(&mut self) -> Result<()>;
}

/// Hands out short-lived sessions on a namespace.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn session(&self, namespace: Namespace) -> Result<Box<dyn KeyValueStore>>;

    fn backend(&self) -> &'static str;
}
