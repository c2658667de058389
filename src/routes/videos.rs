use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, warn};

use crate::config::SUPPORTED_DURATIONS;
use crate::models::{AppState, GenerateVideoResponse, VideoRequest};
use crate::poller::{run_to_completion, PollOutcome};
use crate::types::{AppError, AppResult};
use crate::uploads::{ImageUpload, StagedUpload};

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/api/videos/generate-video", post(generate_video))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Fields accepted by the generation form.
#[derive(Debug)]
struct GenerateForm {
    image: Option<ImageUpload>,
    prompt: Option<String>,
    duration: Option<u32>,
}

impl GenerateForm {
    async fn parse(multipart: &mut Multipart) -> AppResult<Self> {
        let mut form = GenerateForm {
            image: None,
            prompt: None,
            duration: None,
        };

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    if !content_type.starts_with("image/") {
                        return Err(AppError::InvalidRequest(format!(
                            "Unsupported image type '{}'",
                            content_type
                        )));
                    }
                    let data: Bytes = field.bytes().await?;
                    if data.is_empty() {
                        return Err(AppError::MissingImage);
                    }
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        data,
                    });
                }
                "prompt" => {
                    let text = field.text().await?;
                    let text = text.trim();
                    if !text.is_empty() {
                        form.prompt = Some(text.to_string());
                    }
                }
                "duration" => {
                    let text = field.text().await?;
                    let duration: u32 = text.trim().parse().map_err(|_| {
                        AppError::InvalidRequest(format!("Invalid duration '{}'", text.trim()))
                    })?;
                    if !SUPPORTED_DURATIONS.contains(&duration) {
                        return Err(AppError::InvalidRequest(format!(
                            "Duration must be one of {:?} seconds",
                            SUPPORTED_DURATIONS
                        )));
                    }
                    form.duration = Some(duration);
                }
                _ => {} // ignore unknown fields
            }
        }

        Ok(form)
    }
}

/// POST /api/videos/generate-video
///
/// Multipart form with a required `image` file and optional `prompt` and
/// `duration` fields. Blocks until the video is ready, the job fails, the
/// attempt budget runs out, or the server shuts down.
pub async fn generate_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<GenerateVideoResponse>> {
    let form = GenerateForm::parse(&mut multipart).await?;
    let image = form.image.ok_or(AppError::MissingImage)?;

    let pixverse = &state.config.pixverse;
    let prompt = form.prompt.unwrap_or_else(|| pixverse.default_prompt.clone());
    let duration = form.duration.unwrap_or(pixverse.duration);

    info!(
        file_name = %image.file_name,
        bytes = image.data.len(),
        duration,
        "Video generation requested"
    );

    let staged = StagedUpload::stage(&state.config.server.upload_dir, &image).await?;
    let request = VideoRequest {
        image_path: staged.path().to_path_buf(),
        prompt,
        duration,
    };

    let cancel = state.shutdown.child_token();
    let result = run_to_completion(state.videos.as_ref(), &request, &state.poll, &cancel).await;
    staged.discard().await;

    match result {
        Ok(outcome) => {
            info!(outcome = outcome.label(), "Video generation finished");
            match outcome {
                PollOutcome::Success(video_url) => Ok(Json(GenerateVideoResponse { video_url })),
                PollOutcome::Failure(reason) => Err(AppError::JobFailed(reason)),
                PollOutcome::TimedOut => Err(AppError::TimedOut),
                PollOutcome::Cancelled => Err(AppError::Cancelled),
            }
        }
        Err(e) => {
            warn!(error = %e, "Video generation aborted");
            Err(AppError::Upstream(e.into_inner().to_string()))
        }
    }
}
