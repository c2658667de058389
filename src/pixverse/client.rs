use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{Envelope, GenerateRequest, GenerateResp, UploadResp, VideoResult};
use super::PixVerseError;
use crate::config::PixVerseConfig;
use crate::models::VideoRequest;
use crate::poller::{JobStatus, RemoteJob};
use crate::utils::{with_retry, RetryPolicy};

pub struct PixVerseClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    motion_mode: String,
    quality: String,
    retry: RetryPolicy,
}

impl PixVerseClient {
    pub fn new(config: &PixVerseConfig) -> Result<Self, PixVerseError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            motion_mode: config.motion_mode.clone(),
            quality: config.quality.clone(),
            retry: config.retry_policy(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach the auth header and a per-request trace id.
    fn authorized(&self, builder: RequestBuilder) -> (RequestBuilder, Uuid) {
        let trace_id = Uuid::new_v4();
        let builder = builder
            .header("API-KEY", &self.api_key)
            .header("Ai-trace-id", trace_id.to_string());
        (builder, trace_id)
    }

    /// Upload a local image and return the PixVerse image id.
    pub async fn upload_image(&self, path: &Path) -> Result<i64, PixVerseError> {
        let url = format!("{}/image/upload", self.base_url);

        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(mime.essence_str())?;
        let form = Form::new().part("image", part);

        let (request, trace_id) = self.authorized(self.client.post(&url));
        debug!(%trace_id, path = %path.display(), "Uploading image to PixVerse");

        let response = request.multipart(form).send().await?;
        let resp: UploadResp = read_envelope(response).await?;
        let img_id = resp.img_id.ok_or_else(|| {
            PixVerseError::InvalidResponse("image upload response has no img_id".to_string())
        })?;

        info!(img_id, %trace_id, "Image uploaded to PixVerse");
        Ok(img_id)
    }

    /// Start generating a video from an uploaded image.
    pub async fn create_video(
        &self,
        img_id: i64,
        prompt: &str,
        duration: u32,
    ) -> Result<i64, PixVerseError> {
        let url = format!("{}/video/img/generate", self.base_url);
        let payload = GenerateRequest {
            duration,
            img_id,
            model: &self.model,
            motion_mode: &self.motion_mode,
            prompt,
            quality: &self.quality,
        };

        let (request, trace_id) = self.authorized(self.client.post(&url));
        debug!(img_id, duration, %trace_id, "Requesting PixVerse video generation");

        let response = request.json(&payload).send().await?;
        let resp: GenerateResp = read_envelope(response).await?;
        let video_id = resp.video_id.ok_or_else(|| {
            PixVerseError::InvalidResponse("video generation response has no video_id".to_string())
        })?;

        info!(img_id, video_id, %trace_id, "PixVerse video generation started");
        Ok(video_id)
    }

    /// Fetch the current state of a generation job.
    pub async fn get_video_result(&self, video_id: i64) -> Result<VideoResult, PixVerseError> {
        let url = format!("{}/video/result/{}", self.base_url, video_id);

        let (request, trace_id) = self.authorized(self.client.get(&url));
        let response = request.send().await?;
        let result: VideoResult = read_envelope(response).await?;

        debug!(video_id, status = result.status, %trace_id, "PixVerse video status");
        Ok(result)
    }
}

/// Decode a PixVerse envelope, turning HTTP and API-level errors into
/// [`PixVerseError`].
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, PixVerseError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(PixVerseError::Http { status, body });
    }

    let envelope: Envelope<T> = serde_json::from_str(&body)
        .map_err(|e| PixVerseError::InvalidResponse(format!("{}: {}", e, body)))?;

    if envelope.err_code != 0 {
        return Err(PixVerseError::Api {
            code: envelope.err_code,
            message: envelope.err_msg,
        });
    }

    envelope
        .resp
        .ok_or_else(|| PixVerseError::InvalidResponse(format!("missing Resp: {}", body)))
}

#[async_trait]
impl RemoteJob for PixVerseClient {
    type Input = VideoRequest;
    type Handle = i64;
    type Output = String;
    type Error = PixVerseError;

    async fn submit(&self, input: &VideoRequest) -> Result<i64, PixVerseError> {
        let img_id = self.upload_image(&input.image_path).await?;
        self.create_video(img_id, &input.prompt, input.duration).await
    }

    async fn check_status(&self, video_id: &i64) -> Result<JobStatus<String>, PixVerseError> {
        let video_id = *video_id;
        let result = with_retry(
            move || self.get_video_result(video_id),
            &self.retry,
            PixVerseError::is_transient,
        )
        .await?;

        Ok(result.into_job_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(base_url: String, status_retries: u32) -> PixVerseConfig {
        PixVerseConfig {
            api_key: "test-key".to_string(),
            base_url,
            model: "v3.5".to_string(),
            motion_mode: "normal".to_string(),
            quality: "540p".to_string(),
            duration: 5,
            default_prompt: "wave".to_string(),
            request_timeout_secs: 5,
            status_retries,
            retry_base_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_upload_image_returns_img_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/image/upload")
            .match_header("API-KEY", "test-key")
            .match_header("Ai-trace-id", Matcher::Any)
            .match_header("content-type", Matcher::Regex("multipart/form-data".to_string()))
            .match_body(Matcher::Regex(r#"name="image"; filename="face.png""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ErrCode":0,"ErrMsg":"success","Resp":{"img_id":42}}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("face.png");
        tokio::fs::write(&path, b"not really a png").await.unwrap();

        let client = PixVerseClient::new(&test_config(server.url(), 0)).unwrap();
        let img_id = client.upload_image(&path).await.unwrap();

        assert_eq!(img_id, 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_video_sends_generation_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/video/img/generate")
            .match_header("API-KEY", "test-key")
            .match_body(Matcher::Json(json!({
                "duration": 8,
                "img_id": 42,
                "model": "v3.5",
                "motion_mode": "normal",
                "prompt": "wave hello",
                "quality": "540p",
            })))
            .with_status(200)
            .with_body(r#"{"ErrCode":0,"ErrMsg":"success","Resp":{"video_id":1001}}"#)
            .create_async()
            .await;

        let client = PixVerseClient::new(&test_config(server.url(), 0)).unwrap();
        let video_id = client.create_video(42, "wave hello", 8).await.unwrap();

        assert_eq!(video_id, 1001);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_status_maps_vendor_codes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/video/result/5")
            .with_status(200)
            .with_body(r#"{"ErrCode":0,"ErrMsg":"success","Resp":{"id":5,"status":5,"url":""}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/video/result/6")
            .with_status(200)
            .with_body(r#"{"ErrCode":0,"ErrMsg":"success","Resp":{"id":6,"status":1,"url":"https://media.example/6.mp4"}}"#)
            .create_async()
            .await;

        let client = PixVerseClient::new(&test_config(server.url(), 0)).unwrap();

        assert_eq!(client.check_status(&5).await.unwrap(), JobStatus::Pending);
        assert_eq!(
            client.check_status(&6).await.unwrap(),
            JobStatus::Succeeded("https://media.example/6.mp4".to_string())
        );
    }

    #[tokio::test]
    async fn test_api_error_code_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/video/result/9")
            .with_status(200)
            .with_body(r#"{"ErrCode":10005,"ErrMsg":"invalid video id"}"#)
            .create_async()
            .await;

        let client = PixVerseClient::new(&test_config(server.url(), 0)).unwrap();
        let err = client.get_video_result(9).await.unwrap_err();

        match err {
            PixVerseError::Api { code, message } => {
                assert_eq!(code, 10005);
                assert_eq!(message, "invalid video id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_resp_field_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/video/img/generate")
            .with_status(200)
            .with_body(r#"{"ErrCode":0,"ErrMsg":"success","Resp":{}}"#)
            .create_async()
            .await;

        let client = PixVerseClient::new(&test_config(server.url(), 0)).unwrap();
        let err = client.create_video(1, "wave", 5).await.unwrap_err();

        assert!(matches!(err, PixVerseError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_status_check_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/video/result/3")
            .with_status(503)
            .with_body("unavailable")
            .expect(3)
            .create_async()
            .await;

        let client = PixVerseClient::new(&test_config(server.url(), 2)).unwrap();
        let err = client.check_status(&3).await.unwrap_err();

        assert!(matches!(err, PixVerseError::Http { status, .. } if status.as_u16() == 503));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_check_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/video/result/4")
            .with_status(401)
            .with_body("bad key")
            .expect(1)
            .create_async()
            .await;

        let client = PixVerseClient::new(&test_config(server.url(), 2)).unwrap();
        assert!(client.check_status(&4).await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_uploads_then_generates() {
        let mut server = mockito::Server::new_async().await;
        let upload = server
            .mock("POST", "/image/upload")
            .with_status(200)
            .with_body(r#"{"ErrCode":0,"ErrMsg":"success","Resp":{"img_id":77}}"#)
            .create_async()
            .await;
        let generate = server
            .mock("POST", "/video/img/generate")
            .match_body(Matcher::PartialJson(json!({ "img_id": 77, "prompt": "smile" })))
            .with_status(200)
            .with_body(r#"{"ErrCode":0,"ErrMsg":"success","Resp":{"video_id":555}}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.jpg");
        tokio::fs::write(&path, b"jpeg bytes").await.unwrap();

        let client = PixVerseClient::new(&test_config(server.url(), 0)).unwrap();
        let request = VideoRequest {
            image_path: path,
            prompt: "smile".to_string(),
            duration: 5,
        };

        assert_eq!(client.submit(&request).await.unwrap(), 555);
        upload.assert_async().await;
        generate.assert_async().await;
    }
}
