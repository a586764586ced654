use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::ShortenError;
use crate::health::HealthChecker;
use crate::middleware::client_id;
use crate::response::ShortenResponse;
use crate::service::{ShortenRequest, ShortenService};

/// Shared application state
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub service: ShortenService,
    pub health: HealthChecker,
    pub trust_proxy_headers: bool,
}

/// Shorten a URL, charging one unit of the caller's quota
pub async fn shorten_url(
    State(state): State<SharedState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, ShortenError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        ShortenError::MalformedRequest
    })?;

    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let client = client_id(&headers, peer, state.trust_proxy_headers);

    let response = state.service.shorten(&client, request).await?;
    Ok(Json(response))
}

/// Redirect a short code to its target
pub async fn resolve_url(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ShortenError> {
    let url = state.service.resolve(&code).await?;

    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, url)]))
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.health.check_health().await)
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<SharedState>) -> impl IntoResponse {
    let health = state.health.check_health().await;

    if health.is_healthy() {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "store": health.backend
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "store": health.backend
            })),
        )
    }
}
