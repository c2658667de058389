// Wire types for the PixVerse OpenAPI v2

use serde::{Deserialize, Serialize};

use crate::poller::JobStatus;

/// Every PixVerse response is wrapped as `{ "ErrCode", "ErrMsg", "Resp" }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "ErrCode", default)]
    pub err_code: i64,
    #[serde(rename = "ErrMsg", default)]
    pub err_msg: String,
    #[serde(rename = "Resp")]
    pub resp: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResp {
    pub img_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub duration: u32,
    pub img_id: i64,
    pub model: &'a str,
    pub motion_mode: &'a str,
    pub prompt: &'a str,
    pub quality: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResp {
    pub video_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoResult {
    pub status: i64,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    Succeeded,
    Generating,
    ModerationFailed,
    Failed,
    Unknown(i64),
}

impl VideoStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => VideoStatus::Succeeded,
            5 => VideoStatus::Generating,
            7 => VideoStatus::ModerationFailed,
            8 => VideoStatus::Failed,
            other => VideoStatus::Unknown(other),
        }
    }
}

impl VideoResult {
    pub fn status(&self) -> VideoStatus {
        VideoStatus::from_code(self.status)
    }

    pub fn into_job_status(self) -> JobStatus<String> {
        match self.status() {
            VideoStatus::Generating => JobStatus::Pending,
            VideoStatus::Succeeded => match self.url {
                Some(url) if !url.is_empty() => JobStatus::Succeeded(url),
                _ => JobStatus::Failed("generation reported success without a video url".into()),
            },
            VideoStatus::ModerationFailed => JobStatus::Failed("content moderation failed".into()),
            VideoStatus::Failed => JobStatus::Failed("generation failed".into()),
            VideoStatus::Unknown(code) => {
                JobStatus::Failed(format!("unexpected generation status {code}"))
            }
        }
    }
}
