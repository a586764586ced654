use crate::allocator::ShortCodeAllocator;
use crate::config::Config;
use crate::error::{Result, ShortenError};
use crate::quota::QuotaLimiter;
use crate::response::ShortenResponse;
use crate::store::{KeyValueStore, Namespace, StoreConnector};
use crate::validation::RequestValidator;
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /api/v1`. The expiry field is spelled `expity` on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
    #[serde(default)]
    pub short: Option<String>,
    /// Hours; zero or missing selects the configured default
    #[serde(default, rename = "expity", alias = "expiry")]
    pub expiry: Option<u64>,
}

/// Runs a shorten request through quota check, validation, allocation,
/// persistence and quota accounting. Every failure ends the request; nothing
/// is retried.
pub struct ShortenService {
    store: Arc<dyn StoreConnector>,
    limiter: QuotaLimiter,
    allocator: ShortCodeAllocator,
    validator: RequestValidator,
    domain: String,
    default_expiry_hours: u64,
}

impl ShortenService {
    pub fn new(config: &Config, store: Arc<dyn StoreConnector>) -> Self {
        Self {
            store,
            limiter: QuotaLimiter::new(config.api_quota),
            allocator: ShortCodeAllocator::new(),
            validator: RequestValidator::new(config.domain.clone()),
            domain: config.domain.clone(),
            default_expiry_hours: config.default_expiry_hours,
        }
    }

    pub async fn shorten(&self, client_id: &str, request: ShortenRequest) -> Result<ShortenResponse> {
        let mut quota = self.session(Namespace::Quota).await?;

        let admission = self.limiter.admit(quota.as_mut(), client_id).await?;
        tracing::debug!(client_id, remaining = admission.remaining, "Request admitted");

        self.validator.validate_url(&request.url)?;
        self.validator.check_domain(&request.url).map_err(|e| {
            tracing::warn!(client_id, url = %request.url, "Rejected URL pointing at this service");
            e
        })?;
        let url = RequestValidator::enforce_http(&request.url);

        let custom = request.short.as_deref().filter(|code| !code.is_empty());
        if let Some(code) = custom {
            RequestValidator::validate_custom_short(code)?;
        }

        let expiry = request
            .expiry
            .filter(|hours| *hours > 0)
            .unwrap_or(self.default_expiry_hours);
        RequestValidator::validate_expiry(expiry)?;

        let mut links = self.session(Namespace::Links).await?;
        let code = self.allocator.allocate(links.as_mut(), custom).await?;

        self.allocator
            .persist(links.as_mut(), &code, &url, expiry)
            .await?;

        let status = self.limiter.account(quota.as_mut(), client_id).await?;

        tracing::info!(
            client_id,
            code = %code,
            expiry_hours = expiry,
            remaining = status.remaining,
            "Short link created"
        );

        Ok(ShortenResponse {
            url,
            short: format!("{}/{}", self.domain, code),
            expiry,
            rate_limit: status.remaining,
            rate_limit_res: status.reset_in_minutes(),
        })
    }

    /// Target URL for `code`, if the mapping has not expired.
    pub async fn resolve(&self, code: &str) -> Result<String> {
        let mut links = self.session(Namespace::Links).await?;

        match links.get(code).await {
            Ok(Some(url)) => Ok(url),
            Ok(None) => Err(ShortenError::NotFound),
            Err(e) => {
                tracing::error!(code, error = %e, "Short link lookup failed");
                Err(ShortenError::StoreUnavailable("cannot connect to DB".into()))
            }
        }
    }

    async fn session(&self, namespace: Namespace) -> Result<Box<dyn KeyValueStore>> {
        self.store.session(namespace).await
    }
}
