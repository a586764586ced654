//! Short-code allocation against the shared links namespace.

use crate::error::{Result, ShortenError};
use crate::store::KeyValueStore;
use uuid::Uuid;

pub const GENERATED_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct ShortCodeAllocator;

impl ShortCodeAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Six characters from a fresh v4 UUID. Collisions are rare enough that
    /// they surface as conflicts instead of being retried.
    pub fn generate_code() -> String {
        Uuid::new_v4().simple().to_string()[..GENERATED_CODE_LEN].to_string()
    }

    /// Pick a candidate code and make sure nothing is mapped to it yet.
    ///
    /// A key holding an empty value still counts as taken.
    pub async fn allocate(
        &self,
        store: &mut dyn KeyValueStore,
        custom_code: Option<&str>,
    ) -> Result<String> {
        let code = match custom_code {
            Some(code) => code.to_string(),
            None => Self::generate_code(),
        };

        let existing = store.get(&code).await.map_err(|e| {
            tracing::error!(code = %code, error = %e, "Short code lookup failed");
            ShortenError::StoreUnavailable("Unable to look up short code".into())
        })?;

        if existing.is_some() {
            tracing::warn!(code = %code, custom = custom_code.is_some(), "Short code already in use");
            return Err(ShortenError::CodeConflict);
        }

        Ok(code)
    }

    /// Store `code -> url` for `expiry_hours`, refusing to replace a mapping
    /// another writer created after [`ShortCodeAllocator::allocate`] ran.
    pub async fn persist(
        &self,
        store: &mut dyn KeyValueStore,
        code: &str,
        url: &str,
        expiry_hours: u64,
    ) -> Result<()> {
        let written = store
            .set_nx_ex(code, url, expiry_hours.saturating_mul(3600))
            .await
            .map_err(|e| {
                tracing::error!(code, error = %e, "Failed to persist short link");
                ShortenError::StoreUnavailable("Unable to connect to server".into())
            })?;

        if !written {
            tracing::warn!(code, "Short code claimed concurrently");
            return Err(ShortenError::CodeConflict);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnector;
    use crate::store::{Namespace, StoreConnector};
    use std::time::Duration;

    #[test]
    fn generated_codes_are_six_hex_chars() {
        let code = ShortCodeAllocator::generate_code();
        assert_eq!(code.len(), GENERATED_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn custom_code_is_used_verbatim() {
        let store = MemoryConnector::new();
        let mut links = store.session(Namespace::Links).await.unwrap();

        let code = ShortCodeAllocator::new()
            .allocate(links.as_mut(), Some("mycode"))
            .await
            .unwrap();
        assert_eq!(code, "mycode");
    }

    #[tokio::test]
    async fn taken_code_conflicts_even_when_empty() {
        let store = MemoryConnector::new();
        let mut links = store.session(Namespace::Links).await.unwrap();
        links.set_ex("placeholder", "", 60).await.unwrap();

        let result = ShortCodeAllocator::new()
            .allocate(links.as_mut(), Some("placeholder"))
            .await;
        assert!(matches!(result, Err(ShortenError::CodeConflict)));
    }

    #[tokio::test]
    async fn persist_converts_hours_and_never_overwrites() {
        let store = MemoryConnector::new();
        let mut links = store.session(Namespace::Links).await.unwrap();
        let allocator = ShortCodeAllocator::new();

        allocator
            .persist(links.as_mut(), "abc123", "http://example.com", 2)
            .await
            .unwrap();
        let ttl = links.ttl("abc123").await.unwrap().unwrap();
        assert!(ttl > Duration::from_secs(7190) && ttl <= Duration::from_secs(7200));

        let second = allocator
            .persist(links.as_mut(), "abc123", "http://other.com", 2)
            .await;
        assert!(matches!(second, Err(ShortenError::CodeConflict)));
        assert_eq!(
            links.get("abc123").await.unwrap().as_deref(),
            Some("http://example.com")
        );
    }
}
