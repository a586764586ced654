//! Per-client quota tracking on top of an expiring counter.
//!
//! A client's counter is created at the full quota with a 30 minute expiry,
//! decremented once per successful shorten, and disappears when the window
//! elapses. Reading and decrementing are separate round trips, so concurrent
//! requests from one client can slightly overshoot the quota.

use crate::error::{Result, ShortenError};
use crate::store::KeyValueStore;
use std::time::Duration;

pub const QUOTA_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Outcome of an admitted quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Remaining count before this request is accounted.
    pub remaining: i64,
    pub reset_in: Option<Duration>,
}

/// Counter state after a successful request has been accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub remaining: i64,
    pub reset_in: Duration,
}

impl QuotaStatus {
    pub fn reset_in_minutes(&self) -> u64 {
        self.reset_in.as_secs() / 60
    }
}

#[derive(Debug, Clone)]
pub struct QuotaLimiter {
    quota: u32,
    window: Duration,
}

impl QuotaLimiter {
    pub fn new(quota: u32) -> Self {
        Self {
            quota,
            window: QUOTA_WINDOW,
        }
    }

    /// Decide whether `client_id` may perform another operation.
    ///
    /// Denial is reported as `ShortenError::RateLimited`. Nothing is
    /// decremented here; call [`QuotaLimiter::account`] once the protected
    /// operation has succeeded.
    pub async fn admit(&self, store: &mut dyn KeyValueStore, client_id: &str) -> Result<Admission> {
        let Some(raw) = store.get(client_id).await? else {
            // Another request may have initialized it first; either way the window is fresh.
            store
                .set_nx_ex(client_id, &self.quota.to_string(), self.window.as_secs())
                .await?;
            tracing::debug!(client_id, quota = self.quota, "Initialized client quota");

            return Ok(Admission {
                remaining: i64::from(self.quota),
                reset_in: Some(self.window),
            });
        };

        let remaining = parse_counter(&raw)
            .map_err(|_| ShortenError::StoreUnavailable("Cannot convert value to int".into()))?;

        if remaining <= 0 {
            let reset_in = match store.ttl(client_id).await {
                Ok(ttl) => ttl,
                Err(e) => {
                    tracing::warn!(client_id, error = %e, "Could not read quota reset time");
                    None
                }
            };
            tracing::warn!(client_id, "Rate limit exceeded");
            return Err(ShortenError::RateLimited { reset_in });
        }

        Ok(Admission {
            remaining,
            reset_in: None,
        })
    }

    /// Consume one unit for `client_id` and report the updated counter.
    ///
    /// Failures here surface as `QuotaAccounting` even though the protected
    /// operation already happened.
    pub async fn account(&self, store: &mut dyn KeyValueStore, client_id: &str) -> Result<QuotaStatus> {
        store.decr(client_id).await.map_err(accounting)?;

        let raw = store
            .get(client_id)
            .await
            .map_err(accounting)?
            .ok_or_else(|| ShortenError::QuotaAccounting("URL short not found in database".into()))?;
        let mut remaining = parse_counter(&raw)
            .map_err(|_| ShortenError::QuotaAccounting("Cannot convert value to int".into()))?;

        let reset_in = match store.ttl(client_id).await.map_err(accounting)? {
            Some(ttl) => ttl,
            None => {
                // The window lapsed mid-request and DECR recreated the key without expiry.
                remaining = i64::from(self.quota) - 1;
                store
                    .set_ex(client_id, &remaining.to_string(), self.window.as_secs())
                    .await
                    .map_err(accounting)?;
                self.window
            }
        };

        Ok(QuotaStatus { remaining, reset_in })
    }
}

fn parse_counter(raw: &str) -> std::result::Result<i64, std::num::ParseIntError> {
    raw.trim().parse::<i64>()
}

fn accounting(err: ShortenError) -> ShortenError {
    tracing::error!(error = %err, "Quota accounting failed");
    match err {
        ShortenError::StoreUnavailable(msg) => ShortenError::QuotaAccounting(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnector;
    use crate::store::{Namespace, StoreConnector};

    async fn quota_session(store: &MemoryConnector) -> Box<dyn KeyValueStore> {
        store.session(Namespace::Quota).await.unwrap()
    }

    #[tokio::test]
    async fn first_request_initializes_full_quota() {
        let store = MemoryConnector::new();
        let mut session = quota_session(&store).await;
        let limiter = QuotaLimiter::new(10);

        let admission = limiter.admit(session.as_mut(), "10.0.0.1").await.unwrap();
        assert_eq!(admission.remaining, 10);
        assert_eq!(admission.reset_in, Some(QUOTA_WINDOW));
        assert_eq!(session.get("10.0.0.1").await.unwrap().as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn accounting_decrements_once() {
        let store = MemoryConnector::new();
        let mut session = quota_session(&store).await;
        let limiter = QuotaLimiter::new(10);

        limiter.admit(session.as_mut(), "10.0.0.1").await.unwrap();
        let status = limiter.account(session.as_mut(), "10.0.0.1").await.unwrap();

        assert_eq!(status.remaining, 9);
        assert!(status.reset_in <= QUOTA_WINDOW);
        assert!(status.reset_in_minutes() <= 30);
    }

    #[tokio::test]
    async fn exhausted_quota_is_denied_without_decrement() {
        let store = MemoryConnector::new();
        let mut session = quota_session(&store).await;
        session.set_ex("10.0.0.1", "0", 600).await.unwrap();
        let limiter = QuotaLimiter::new(10);

        let err = limiter.admit(session.as_mut(), "10.0.0.1").await.unwrap_err();
        match err {
            ShortenError::RateLimited { reset_in } => {
                let reset_in = reset_in.unwrap();
                assert!(reset_in <= Duration::from_secs(600));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.get("10.0.0.1").await.unwrap().as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn negative_counter_is_denied() {
        let store = MemoryConnector::new();
        let mut session = quota_session(&store).await;
        session.set_ex("10.0.0.1", "-2", 600).await.unwrap();

        let result = QuotaLimiter::new(10).admit(session.as_mut(), "10.0.0.1").await;
        assert!(matches!(result, Err(ShortenError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn unparsable_counter_is_a_store_error() {
        let store = MemoryConnector::new();
        let mut session = quota_session(&store).await;
        session.set_ex("10.0.0.1", "lots", 600).await.unwrap();

        let result = QuotaLimiter::new(10).admit(session.as_mut(), "10.0.0.1").await;
        assert!(matches!(result, Err(ShortenError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn lapsed_window_is_reinitialized_on_accounting() {
        let store = MemoryConnector::new();
        let mut session = quota_session(&store).await;
        let limiter = QuotaLimiter::new(5);

        let status = limiter.account(session.as_mut(), "10.0.0.9").await.unwrap();
        assert_eq!(status.remaining, 4);
        assert_eq!(status.reset_in, QUOTA_WINDOW);
        assert!(session.ttl("10.0.0.9").await.unwrap().is_some());
    }
}
