//! HTTP adapter for the clip-processing API
//!
//! Talks plain REST/JSON to the remote service. Speed edits are created with a
//! multipart form so a local video can be uploaded alongside the speed factor.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// reqwest-backed implementation of [`ClipApiPort`]
pub struct HttpClipApiAdapter {
    client: Client,
    base_url: String,
}

impl HttpClipApiAdapter {
    /// Create new HTTP adapter for the API rooted at `base_url`
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DomainError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into an API error carrying the server's `detail`
    async fn check(response: Response, fallback: &str) -> Result<Response, DomainError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        debug!(%status, ?body, "API request failed");
        Err(DomainError::Api(error_detail(&body).unwrap_or_else(|| fallback.to_string())))
    }

    /// Artifact URLs may come back relative to the API root
    fn resolve_url(&self, url: &str) -> Result<String, DomainError> {
        match url::Url::parse(url) {
            Ok(absolute) => Ok(absolute.into()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = url::Url::parse(&format!("{}/", self.base_url)).map_err(|e| {
                    DomainError::InternalError(format!("Invalid API base URL: {}", e))
                })?;
                base.join(url)
                    .map(String::from)
                    .map_err(|e| DomainError::Api(format!("Invalid download URL {}: {}", url, e)))
            }
            Err(e) => Err(DomainError::Api(format!("Invalid download URL {}: {}", url, e))),
        }
    }

    async fn upload_part(path: &Path) -> Result<Part, DomainError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            DomainError::ValidationFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.mp4".to_string());

        Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| DomainError::InternalError(format!("Invalid upload mime type: {}", e)))
    }
}

fn network_error(err: reqwest::Error) -> DomainError {
    DomainError::Network(err.to_string())
}

/// `detail` (or `error`) field of an error body
fn error_detail(body: &Value) -> Option<String> {
    body.get("detail")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Ids and sizes come back as either JSON strings or numbers
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches("MB").trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct CreatedWire {
    id: Value,
    #[serde(default)]
    original_size: Value,
}

#[derive(Debug, Deserialize)]
struct ClipWire {
    id: Value,
    #[serde(default)]
    clip: Option<String>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default)]
    size: Value,
}

#[derive(Debug, Deserialize)]
struct ClipStatusWire {
    id: Value,
    status: String,
    #[serde(default)]
    clips: Vec<ClipWire>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeedEditStatusWire {
    id: Value,
    status: String,
    #[serde(default)]
    output_video: Option<String>,
    #[serde(default)]
    output_size: Value,
    #[serde(default)]
    error_message: Option<String>,
}

fn parse_created(wire: CreatedWire) -> Result<JobCreated, DomainError> {
    let id = value_to_string(&wire.id)
        .ok_or_else(|| DomainError::Api("Server returned a job without an id".to_string()))?;
    Ok(JobCreated {
        id: JobId::new(id),
        size_estimate_mb: value_to_f64(&wire.original_size),
    })
}

fn parse_clip_status(wire: ClipStatusWire) -> Result<JobStatusReport, DomainError> {
    let id = value_to_string(&wire.id)
        .ok_or_else(|| DomainError::Api("Status response without an id".to_string()))?;

    let mut result = ClipResult::default();
    for clip in wire.clips {
        // clips still being rendered have no file or resolution yet
        let (Some(url), Some(resolution), Some(artifact_id)) =
            (clip.clip, clip.resolution, value_to_string(&clip.id))
        else {
            continue;
        };
        result.artifacts.insert(
            Resolution::parse(&resolution),
            Artifact::new(artifact_id, url, value_to_f64(&clip.size)),
        );
    }

    Ok(JobStatusReport {
        id: JobId::new(id),
        status: RemoteStatus::parse(&wire.status),
        result: JobResult::Clip(result),
        error_message: wire.error_message,
    })
}

fn parse_speed_edit_status(wire: SpeedEditStatusWire) -> Result<JobStatusReport, DomainError> {
    let id = value_to_string(&wire.id)
        .ok_or_else(|| DomainError::Api("Status response without an id".to_string()))?;

    // the edited video is downloaded by the job id itself
    let output = wire
        .output_video
        .filter(|url| !url.is_empty())
        .map(|url| Artifact::new(id.clone(), url, value_to_f64(&wire.output_size)));

    Ok(JobStatusReport {
        id: JobId::new(id),
        status: RemoteStatus::parse(&wire.status),
        result: JobResult::SpeedEdit(SpeedEditResult { output }),
        error_message: wire.error_message,
    })
}

#[async_trait]
impl ClipApiPort for HttpClipApiAdapter {
    async fn create_clip_job(&self, payload: &ClipPayload) -> Result<JobCreated, DomainError> {
        let body = serde_json::json!({
            "youtube_url": payload.source_url,
            "start_time": payload.range.start.format_hms(),
            "end_time": payload.range.end.format_hms(),
        });

        let response = self
            .client
            .post(self.endpoint("/api/clip-request/"))
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let response = Self::check(response, "Failed to create clip request").await?;
        let wire: CreatedWire = response.json().await.map_err(network_error)?;
        parse_created(wire)
    }

    async fn create_speed_edit_job(
        &self,
        payload: &SpeedEditPayload,
    ) -> Result<JobCreated, DomainError> {
        let mut form = Form::new().text("speed_factor", payload.speed_factor.to_string());
        form = match &payload.source {
            SpeedSource::Clip { artifact_id } => form.text("source_clip", artifact_id.clone()),
            SpeedSource::Upload { path } => form.part("uploaded_video", Self::upload_part(path).await?),
        };

        let response = self
            .client
            .post(self.endpoint("/api/speed-edit/"))
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        let response = Self::check(response, "Failed to start processing").await?;
        let wire: CreatedWire = response.json().await.map_err(network_error)?;
        parse_created(wire)
    }

    async fn job_status(&self, kind: JobKind, id: &JobId) -> Result<JobStatusReport, DomainError> {
        let request = match kind {
            JobKind::Clip => self
                .client
                .get(self.endpoint("/api/clip-request/task_status"))
                .query(&[("clip_request_id", id.as_str())]),
            JobKind::SpeedEdit => self
                .client
                .get(self.endpoint("/api/speed-edit/task_status"))
                .query(&[("speed_edit_request_id", id.as_str())]),
        };

        let response = request.send().await.map_err(network_error)?;
        let response = Self::check(response, "Failed to fetch task status").await?;
        match kind {
            JobKind::Clip => parse_clip_status(response.json().await.map_err(network_error)?),
            JobKind::SpeedEdit => {
                parse_speed_edit_status(response.json().await.map_err(network_error)?)
            }
        }
    }

    async fn cancel_job(&self, kind: JobKind, id: &JobId) -> Result<(), DomainError> {
        let body = serde_json::json!({
            "request_id": id.as_str(),
            "request_type": kind.as_str(),
        });
        let response = self
            .client
            .post(self.endpoint("/api/cancel-request/"))
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        Self::check(response, "Failed to cancel request").await?;
        Ok(())
    }

    async fn download_artifact(
        &self,
        kind: JobKind,
        artifact_id: &str,
    ) -> Result<Vec<u8>, DomainError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/api/download-clip/{}/", artifact_id)))
            .query(&[("file_type", kind.as_str())])
            .send()
            .await
            .map_err(network_error)?;
        let response = Self::check(response, "Failed to download clip").await?;
        let bytes = response.bytes().await.map_err(network_error)?;
        Ok(bytes.to_vec())
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, DomainError> {
        let response = self
            .client
            .get(self.resolve_url(url)?)
            .send()
            .await
            .map_err(network_error)?;
        let response = Self::check(response, "Failed to download file").await?;
        let bytes = response.bytes().await.map_err(network_error)?;
        Ok(bytes.to_vec())
    }

    async fn send_to_email(&self, id: &JobId, email: &str) -> Result<(), DomainError> {
        let response = self
            .client
            .get(self.endpoint("/api/clip-request/send_clip_to_email"))
            .query(&[("clip_request_id", id.as_str()), ("email", email)])
            .send()
            .await
            .map_err(network_error)?;
        Self::check(response, "Failed to send email").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_created_accepts_numeric_id() {
        let wire: CreatedWire =
            serde_json::from_str(r#"{"id": 42, "status": "pending", "original_size": 7.5}"#).unwrap();
        let created = parse_created(wire).unwrap();
        assert_eq!(created.id.as_str(), "42");
        assert_eq!(created.size_estimate_mb, Some(7.5));
    }

    #[test]
    fn test_parse_created_without_id_is_an_api_error() {
        let wire: CreatedWire = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert!(matches!(parse_created(wire), Err(DomainError::Api(_))));
    }

    #[test]
    fn test_parse_clip_status_maps_resolutions() {
        let json = r#"{
            "id": "c1",
            "status": "completed",
            "clips": [
                {"id": 7, "clip": "https://cdn/720.mp4", "resolution": "720p", "size": 12.5},
                {"id": "8", "clip": "https://cdn/480.mp4", "resolution": "480p", "size": "6.1"},
                {"id": 9, "clip": null, "resolution": "360p", "size": null}
            ]
        }"#;
        let report = parse_clip_status(serde_json::from_str(json).unwrap()).unwrap();

        assert_eq!(report.id.as_str(), "c1");
        assert_eq!(report.status, RemoteStatus::Completed);
        assert_eq!(report.result.artifacts().len(), 2);
        let p720 = report.result.find("720p").unwrap();
        assert_eq!(p720.artifact_id, "7");
        assert_eq!(p720.size_label().as_deref(), Some("12.5MB"));
        assert_eq!(report.result.find("480p").unwrap().size_mb, Some(6.1));
    }

    #[test]
    fn test_parse_speed_edit_status_uses_job_id_for_artifact() {
        let json = r#"{"id": 5, "status": "completed", "output_video": "https://cdn/s.mp4"}"#;
        let report = parse_speed_edit_status(serde_json::from_str(json).unwrap()).unwrap();

        let output = report.result.find("speed_edit").unwrap();
        assert_eq!(output.artifact_id, "5");
        assert_eq!(output.download_url, "https://cdn/s.mp4");
    }

    #[test]
    fn test_parse_failed_status_keeps_message() {
        let json = r#"{"id": "c1", "status": "failed", "error_message": "Video unavailable"}"#;
        let report = parse_clip_status(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(report.status, RemoteStatus::Failed);
        assert_eq!(report.error_message.as_deref(), Some("Video unavailable"));
        assert!(report.result.is_empty());
    }

    #[test]
    fn test_error_detail_passthrough() {
        let body = serde_json::json!({"detail": "Invalid YouTube URL"});
        assert_eq!(error_detail(&body).as_deref(), Some("Invalid YouTube URL"));
        assert_eq!(error_detail(&Value::Null), None);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let adapter = HttpClipApiAdapter::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            adapter.endpoint("/api/clip-request/"),
            "http://localhost:8000/api/clip-request/"
        );
    }

    #[test]
    fn test_resolve_url_joins_relative_paths() {
        let adapter = HttpClipApiAdapter::new("http://localhost:8000", Duration::from_secs(5)).unwrap();
        assert_eq!(
            adapter.resolve_url("/media/clips/720.mp4").unwrap(),
            "http://localhost:8000/media/clips/720.mp4"
        );
        assert_eq!(
            adapter.resolve_url("https://cdn.example.com/720.mp4").unwrap(),
            "https://cdn.example.com/720.mp4"
        );
    }
}
