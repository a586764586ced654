use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::response::{DependencyStatus, HealthResponse, ServiceStatus};
use crate::store::{Namespace, StoreConnector};

static START_TIME: std::sync::LazyLock<SystemTime> = std::sync::LazyLock::new(SystemTime::now);

/// Pings each store namespace and reports how the service is doing.
pub struct HealthChecker {
    store: Arc<dyn StoreConnector>,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn StoreConnector>) -> Self {
        // Uptime counts from construction.
        std::sync::LazyLock::force(&START_TIME);
        Self { store }
    }

    pub async fn check_health(&self) -> HealthResponse {
        let uptime = SystemTime::now()
            .duration_since(*START_TIME)
            .unwrap_or_default()
            .as_secs();

        let dependencies = DependencyStatus {
            links: self.check_namespace(Namespace::Links).await,
            quota: self.check_namespace(Namespace::Quota).await,
        };

        HealthResponse::new(uptime, self.store.backend(), dependencies)
    }

    async fn check_namespace(&self, namespace: Namespace) -> ServiceStatus {
        let start = Instant::now();

        let result = match self.store.session(namespace).await {
            Ok(mut session) => session.ping().await,
            Err(e) => Err(e),
        };
        let elapsed = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => ServiceStatus::healthy(elapsed),
            Err(e) => {
                tracing::warn!(%namespace, error = %e, "Store health check failed");
                ServiceStatus::unavailable(elapsed, e.to_string())
            }
        }
    }
}
