use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortenError>;

/// Every way a shorten or resolve request can end early.
#[derive(Debug, Clone, Error)]
pub enum ShortenError {
    #[error("cannot parse JSON")]
    MalformedRequest,

    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Invalid custom short")]
    InvalidCustomShort,

    #[error("Invalid expiry")]
    InvalidExpiry,

    #[error("Domain not allowed")]
    UnsafeDomain,

    #[error("Rate limit exceeded")]
    RateLimited { reset_in: Option<Duration> },

    #[error("URL custom short already in use")]
    CodeConflict,

    #[error("short not found in database")]
    NotFound,

    #[error("{0}")]
    StoreUnavailable(String),

    #[error("{0}")]
    QuotaAccounting(String),
}

impl ShortenError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShortenError::MalformedRequest
            | ShortenError::InvalidUrl
            | ShortenError::InvalidCustomShort
            | ShortenError::InvalidExpiry => StatusCode::BAD_REQUEST,
            ShortenError::UnsafeDomain | ShortenError::RateLimited { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ShortenError::CodeConflict => StatusCode::FORBIDDEN,
            ShortenError::NotFound => StatusCode::NOT_FOUND,
            ShortenError::StoreUnavailable(_) | ShortenError::QuotaAccounting(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_reset: Option<u64>,
}

impl ErrorResponse {
    pub fn from_shorten_error(err: &ShortenError) -> Self {
        let rate_limit_reset = match err {
            ShortenError::RateLimited { reset_in } => reset_in.map(|d| d.as_secs() / 60),
            _ => None,
        };

        Self {
            error: err.to_string(),
            rate_limit_reset,
        }
    }
}

impl IntoResponse for ShortenError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::from_shorten_error(&self))).into_response()
    }
}
