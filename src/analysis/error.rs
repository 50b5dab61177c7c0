use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::dto::ErrorBody;

pub const ANALYSIS_FAILED: &str = "Failed to analyze image";

/// Problems with what the caller sent. Detected before any transient
/// resource exists.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No image uploaded")]
    NoImage,

    #[error("Only one image may be uploaded")]
    MultipleImages,

    #[error("Image too large")]
    TooLarge,

    #[error("Malformed upload")]
    MalformedUpload,
}

impl ValidationError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Cause is logged server-side and never sent to the caller.
    #[error("Failed to analyze image")]
    Internal(anyhow::Error),
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(v) => (v.status(), v.to_string()),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ANALYSIS_FAILED.to_string()),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
