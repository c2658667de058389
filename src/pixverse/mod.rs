//! PixVerse image-to-video API
//!
//! Three calls make up one generation:
//! - `POST /image/upload` (multipart `image`) returns `Resp.img_id`
//! - `POST /video/img/generate` (JSON) returns `Resp.video_id`
//! - `GET /video/result/{video_id}` returns `Resp.status` and, once done, `Resp.url`
//!
//! Every request carries the `API-KEY` header and a fresh `Ai-trace-id`.
//! [`PixVerseClient`] implements [`crate::poller::RemoteJob`], so the numeric
//! status codes never leave this module.

pub mod client;
pub mod types;

pub use client::PixVerseClient;
pub use types::{VideoResult, VideoStatus};

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixVerseError {
    #[error("PixVerse request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("PixVerse API error ({status}): {body}")]
    Http { status: StatusCode, body: String },

    #[error("PixVerse error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Invalid response from PixVerse: {0}")]
    InvalidResponse(String),

    #[error("Failed to read staged image: {0}")]
    Io(#[from] std::io::Error),
}

impl PixVerseError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PixVerseError::Request(e) => e.is_timeout() || e.is_connect(),
            PixVerseError::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
