use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

const DASHBOARD_HINT: &str =
    "All attempted endpoints returned 'does not exist'. Please verify the API documentation in your RapidAPI dashboard.";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// HTTP-facing error. Every handler failure ends up here and is rendered as
/// `{"error": ..., "details"?: ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            details: self.details,
        });

        (self.status, body).into_response()
    }
}

/// Failure of a single resolution request.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Validation(String),

    #[error("Server configuration error: API Key missing.")]
    MissingApiKey,

    /// Every candidate was tried and none produced a usable response.
    #[error(
        "{message}. Please check your RapidAPI dashboard to verify the correct endpoints and API access."
    )]
    UpstreamUnavailable { message: String, status: StatusCode },

    /// The provider answered successfully but reported an error in its payload.
    #[error("{0}")]
    Upstream(String),

    #[error("Failed to process URL: {0}. Please try again or check the link.")]
    Network(String),
}

impl ResolveError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Upstream(_) => StatusCode::BAD_REQUEST,
            Self::MissingApiKey | Self::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamUnavailable { status, .. } => *status,
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(error: ResolveError) -> Self {
        let api_error = ApiError::new(error.status(), error.to_string());
        match error {
            ResolveError::UpstreamUnavailable { .. } => api_error.with_details(DASHBOARD_HINT),
            _ => api_error,
        }
    }
}
