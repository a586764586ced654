use crate::error::{Result, ShortenError};
use crate::store::{KeyValueStore, Namespace, StoreConnector};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

type Table = Arc<Mutex<HashMap<String, Entry>>>;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process store for local-only mode and tests. Cloning shares the data.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    links: Table,
    quota: Table,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, namespace: Namespace) -> Table {
        match namespace {
            Namespace::Links => self.links.clone(),
            Namespace::Quota => self.quota.clone(),
        }
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn session(&self, namespace: Namespace) -> Result<Box<dyn KeyValueStore>> {
        Ok(Box::new(MemorySession {
            table: self.table(namespace),
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

pub struct MemorySession {
    table: Table,
}

impl MemorySession {
    /// Locks the table and drops anything that has expired.
    fn live(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>> {
        let mut guard = self.table.lock().map_err(|_| {
            ShortenError::StoreUnavailable("Failed to acquire store lock".into())
        })?;
        let now = Instant::now();
        guard.retain(|_, entry| entry.is_live(now));
        Ok(guard)
    }
}

fn expiry_from_now(seconds: u64) -> Result<Instant> {
    Instant::now()
        .checked_add(Duration::from_secs(seconds))
        .ok_or_else(|| ShortenError::StoreUnavailable("invalid expire time".into()))
}

#[async_trait]
impl KeyValueStore for MemorySession {
    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.live()?.get(key).map(|e| e.value.clone()))
    }

    async fn set_ex(&mut self, key: &str, value: &str, seconds: u64) -> Result<()> {
        let expires_at = expiry_from_now(seconds)?;
        self.live()?.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn set_nx_ex(&mut self, key: &str, value: &str, seconds: u64) -> Result<bool> {
        let expires_at = expiry_from_now(seconds)?;
        let mut table = self.live()?;
        if table.contains_key(key) {
            return Ok(false);
        }
        table.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(expires_at),
            },
        );
        Ok(true)
    }

    async fn decr(&mut self, key: &str) -> Result<i64> {
        let mut table = self.live()?;
        let entry = table.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".into(),
            expires_at: None,
        });

        let current: i64 = entry.value.parse().map_err(|_| {
            ShortenError::StoreUnavailable("value is not an integer or out of range".into())
        })?;
        let next = current - 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn ttl(&mut self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        Ok(self
            .live()?
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn ping(&mut self) -> Result<()> {
        self.live().map(|_| ())
    }
}
