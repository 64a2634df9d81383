/// Unified error types for the site server
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the site
#[derive(Error, Debug)]
pub enum SiteError {
    /// Network-level failure reaching the geolocation service or SMTP relay
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed geolocation response body
    #[error("Decode error: {0}")]
    Decode(String),

    /// Outbound lookup quota exhausted
    #[error("Geolocation lookup rate limit exceeded")]
    RateLimited,

    /// Missing or invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache backend errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Email build or delivery failure
    #[error("Email error: {0}")]
    Email(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON status body shared by form relays and error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Convert SiteError to HTTP response
impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SiteError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            SiteError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            SiteError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            SiteError::Email(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Sorry, there was an error sending your message. Please try again later."
                    .to_string(),
            ),
            // Don't leak details
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(StatusResponse::error(message))).into_response()
    }
}

/// Result type alias for site operations
pub type SiteResult<T> = Result<T, SiteError>;
