use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::pixverse::PixVerseError;
use crate::poller::{PollConfig, RemoteJob};

/// Image-to-video generation as a remote job: a staged image goes in, a
/// video URL comes out.
pub type VideoJob =
    dyn RemoteJob<Input = VideoRequest, Handle = i64, Output = String, Error = PixVerseError>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<VideoJob>,
    pub poll: PollConfig,
    /// Cancelled on shutdown; each request polls with a child token.
    pub shutdown: CancellationToken,
}

/// Input for one generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    /// Locally staged copy of the uploaded image.
    pub image_path: PathBuf,
    pub prompt: String,
    pub duration: u32,
}

// API Request/Response types

#[derive(Debug, serde::Serialize)]
pub struct GenerateVideoResponse {
    #[serde(rename = "videoUrl")]
    pub video_url: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
