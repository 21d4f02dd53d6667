//! Novita img2video client.
//!
//! Generation is asynchronous on Novita's side: a submission returns a task
//! id, and the task is polled until it succeeds, fails or the attempt budget
//! runs out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::VideoConfig;
use super::error::GenerationError;
use super::preprocess::prepare_image;
use super::traits::VideoGenerator;
use super::types::{GeneratedVideo, GenerationStatus};
use crate::metrics::{GENERATION_OUTCOMES, POLL_ATTEMPTS};
use crate::storage::{ArtifactKey, ArtifactStore, VIDEO_CONTENT_TYPE};

/// Video generator backed by the Novita API.
pub struct NovitaGenerator {
    client: Client,
    config: VideoConfig,
    store: Arc<dyn ArtifactStore>,
}

impl NovitaGenerator {
    /// Creates a generator that uploads finished videos to `store`.
    pub fn new(config: VideoConfig, store: Arc<dyn ArtifactStore>) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            store,
        })
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    fn submit_body(&self, image_file: String, seed: i64) -> SubmitRequest {
        SubmitRequest {
            model_name: self.config.model_name.clone(),
            image_file,
            frames_num: self.config.frames_num,
            frames_per_second: self.config.frames_per_second,
            image_file_resize_mode: self.config.resize_mode.clone(),
            steps: self.config.steps,
            seed,
            enable_frame_interpolation: self.config.enable_frame_interpolation,
            extra: SubmitExtra {
                response_video_type: "mp4".to_string(),
            },
        }
    }

    /// Submits the image and returns the remote task id.
    async fn submit(&self, image: &[u8]) -> Result<String, GenerationError> {
        let url = format!("{}/v3/async/img2video", self.config.base_url());
        let body = self.submit_body(BASE64.encode(image), chrono::Utc::now().timestamp());

        debug!(
            "Submitting img2video task ({} image bytes, model {})",
            image.len(),
            body.model_name
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::SubmissionFailed {
                status: status.as_u16(),
                message,
            });
        }

        let submitted: SubmitResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::SubmissionFailed {
                    status: status.as_u16(),
                    message: format!("Failed to parse submission response: {}", e),
                })?;

        match submitted.task_id {
            Some(task_id) if !task_id.is_empty() => Ok(task_id),
            _ => Err(GenerationError::SubmissionFailed {
                status: status.as_u16(),
                message: "Response did not contain a task id".to_string(),
            }),
        }
    }

    /// Fetches the current state of a task.
    async fn check_status(&self, task_id: &str) -> Result<TaskResultResponse, GenerationError> {
        let url = format!("{}/v3/async/task-result", self.config.base_url());

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .query(&[("task_id", task_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::StatusCheckFailed {
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| {
            GenerationError::generation_failed(format!("Failed to parse task result: {}", e))
        })
    }

    /// Polls until the task reaches a terminal status.
    /// Returns the video URL and the number of status checks made.
    async fn poll(&self, task_id: &str) -> Result<(String, u32), GenerationError> {
        let started = Instant::now();
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            POLL_ATTEMPTS.inc();
            let result = self.check_status(task_id).await?;
            let status = result.status();

            debug!(
                task_id,
                "Status check {}/{}: {:?}", attempt, max_attempts, status
            );

            match status {
                GenerationStatus::Succeeded => {
                    let url = result
                        .videos
                        .into_iter()
                        .map(|v| v.video_url)
                        .find(|url| !url.is_empty())
                        .ok_or_else(|| {
                            GenerationError::generation_failed(
                                "No video URL in successful response",
                            )
                        })?;
                    return Ok((url, attempt));
                }
                GenerationStatus::Failed => {
                    let reason = result
                        .task
                        .and_then(|t| t.reason)
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "Unknown error".to_string());
                    return Err(GenerationError::generation_failed(reason));
                }
                GenerationStatus::Unknown(ref other) => {
                    warn!(task_id, "Unrecognized task status {:?}, still polling", other);
                }
                GenerationStatus::Queued | GenerationStatus::Processing => {}
            }

            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(GenerationError::GenerationTimedOut {
            attempts: max_attempts,
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    async fn download(&self, url: &str) -> Result<Bytes, GenerationError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::DownloadFailed {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }

    async fn run(&self, image: Bytes) -> Result<GeneratedVideo, GenerationError> {
        let preprocess = self.config.preprocess.clone();
        let prepared = tokio::task::spawn_blocking(move || prepare_image(&image, &preprocess))
            .await
            .map_err(|e| GenerationError::Preprocess(format!("Preprocessing task failed: {}", e)))??;

        let task_id = self.submit(&prepared).await?;
        info!(task_id = %task_id, "Video generation task submitted");

        let (source_url, attempts) = self.poll(&task_id).await?;
        info!(
            task_id = %task_id,
            "Video ready after {} status checks", attempts
        );

        let video = self.download(&source_url).await?;
        let key = ArtifactKey::fresh("video", "mp4");
        let stored = self.store.put(video, &key, VIDEO_CONTENT_TYPE).await?;

        Ok(GeneratedVideo {
            task_id,
            source_url,
            url: stored.url,
            key: stored.key,
            size_bytes: stored.size_bytes,
            attempts,
        })
    }
}

#[async_trait]
impl VideoGenerator for NovitaGenerator {
    fn name(&self) -> &str {
        "novita"
    }

    async fn generate(&self, image: Bytes) -> Result<GeneratedVideo, GenerationError> {
        let result = self.run(image).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        GENERATION_OUTCOMES.with_label_values(&[outcome]).inc();

        if let Err(ref e) = result {
            warn!("Video generation failed: {}", e);
        }
        result
    }
}

// Novita API wire types

#[derive(Debug, Serialize)]
struct SubmitRequest {
    model_name: String,
    image_file: String,
    frames_num: u32,
    frames_per_second: u32,
    image_file_resize_mode: String,
    steps: u32,
    seed: i64,
    enable_frame_interpolation: bool,
    extra: SubmitExtra,
}

#[derive(Debug, Serialize)]
struct SubmitExtra {
    response_video_type: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskResultResponse {
    #[serde(default)]
    task: Option<TaskInfo>,
    #[serde(default)]
    videos: Vec<TaskVideo>,
}

impl TaskResultResponse {
    /// A response without a status counts as still running.
    fn status(&self) -> GenerationStatus {
        match self.task.as_ref().and_then(|t| t.status.as_deref()) {
            Some(status) => GenerationStatus::parse(status),
            None => GenerationStatus::Unknown(String::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskInfo {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskVideo {
    video_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockArtifactStore;

    fn generator() -> NovitaGenerator {
        NovitaGenerator::new(
            VideoConfig::new("sk-test", "http://127.0.0.1:1"),
            Arc::new(MockArtifactStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_submit_body_shape() {
        let body = generator().submit_body("aGVsbG8=".to_string(), 1_718_000_000);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model_name": "SVD-XT",
                "image_file": "aGVsbG8=",
                "frames_num": 25,
                "frames_per_second": 6,
                "image_file_resize_mode": "CROP_TO_ASPECT_RATIO",
                "steps": 20,
                "seed": 1_718_000_000,
                "enable_frame_interpolation": true,
                "extra": { "response_video_type": "mp4" }
            })
        );
    }

    #[test]
    fn test_task_result_without_videos() {
        let parsed: TaskResultResponse =
            serde_json::from_str(r#"{"task":{"status":"TASK_STATUS_PROCESSING"}}"#).unwrap();
        assert_eq!(parsed.status(), GenerationStatus::Processing);
        assert!(parsed.videos.is_empty());
        assert!(parsed.task.unwrap().reason.is_none());
    }

    #[test]
    fn test_task_result_without_status_is_still_running() {
        for body in [r#"{}"#, r#"{"task":{}}"#, r#"{"task":{"status":null}}"#] {
            let parsed: TaskResultResponse = serde_json::from_str(body).unwrap();
            let status = parsed.status();
            assert!(!status.is_terminal(), "{} parsed as {:?}", body, status);
        }
    }

    #[test]
    fn test_task_result_with_videos() {
        let parsed: TaskResultResponse = serde_json::from_str(
            r#"{"task":{"status":"TASK_STATUS_SUCCEED","reason":""},
                "videos":[{"video_url":"https://cdn/a.mp4","video_type":"mp4"},{"video_url":"https://cdn/b.mp4"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.videos.len(), 2);
        assert_eq!(parsed.videos[0].video_url, "https://cdn/a.mp4");
    }
}
