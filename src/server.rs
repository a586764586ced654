use crate::config::Config;
use crate::handlers::{health_check, readiness_check, resolve_url, shorten_url, AppState, SharedState};
use crate::health::HealthChecker;
use crate::memory::MemoryConnector;
use crate::middleware::logging_middleware;
use crate::redis::RedisConnector;
use crate::service::ShortenService;
use crate::store::StoreConnector;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the store selected by the configuration.
pub fn connect_store(config: &Config) -> crate::Result<Arc<dyn StoreConnector>> {
    if config.uses_memory_store() {
        tracing::warn!("No Redis URL configured, running with an in-memory store");
        Ok(Arc::new(MemoryConnector::new()))
    } else {
        Ok(Arc::new(RedisConnector::new(&config.redis_url)?))
    }
}

/// Build the router over an already connected store.
pub fn create_app(config: &Config, store: Arc<dyn StoreConnector>) -> Router {
    let shared_state: SharedState = Arc::new(AppState {
        service: ShortenService::new(config, store.clone()),
        health: HealthChecker::new(store),
        trust_proxy_headers: config.trust_proxy_headers,
    });

    Router::new()
        .route("/api/v1", post(shorten_url))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/:url", get(resolve_url))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(
                    shared_state.clone(),
                    logging_middleware,
                )),
        )
        .with_state(shared_state)
}

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
}

impl Server {
    pub fn new(config: Config) -> crate::Result<Self> {
        let store = connect_store(&config)?;
        let app = create_app(&config, store);

        Ok(Self {
            app,
            bind_addr: config.bind_addr,
        })
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        tracing::info!("Shortener listening on {}", self.bind_addr);
        tracing::info!("Health check available at /health");
        tracing::info!("Readiness check available at /ready");

        // Run server with graceful shutdown
        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
