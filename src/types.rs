// Error types shared by the HTTP layer

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error returned by HTTP handlers.
///
/// Every variant maps to a status code and a stable machine-readable `code`
/// in the JSON body, so clients can tell a rejected job from a timeout.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No image file uploaded.")]
    MissingImage,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Video generation failed: {0}")]
    JobFailed(String),

    #[error("Video generation timed out.")]
    TimedOut,

    #[error("Video generation was cancelled.")]
    Cancelled,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingImage | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::JobFailed(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::TimedOut => StatusCode::GATEWAY_TIMEOUT,
            AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingImage => "MISSING_IMAGE",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::JobFailed(_) => "JOB_FAILED",
            AppError::TimedOut => "TIMED_OUT",
            AppError::Cancelled => "CANCELLED",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::InvalidRequest(err.body_text())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": message,
            "code": self.code(),
        });

        (self.status_code(), axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::MissingImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::JobFailed("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::TimedOut.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(AppError::Cancelled.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::Upstream("x".into()).code(), "UPSTREAM_ERROR");
        assert_eq!(
            AppError::PayloadTooLarge("x".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_internal_error_message_is_sanitized() {
        let response = AppError::Internal("disk full at /var/secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"], "An internal error occurred");
    }
}
