// Clip interactor - Orchestrates the clip request use case

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::mirror::MirrorStore;
use crate::app::tracker::{TaskTracker, TrackerPorts};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Interactor for clip requests
pub struct ClipInteractor {
    ports: TrackerPorts,
    metadata_port: Arc<dyn VideoMetadataPort>,
    mirror: MirrorStore,
    tracker: TaskTracker,
}

impl ClipInteractor {
    /// Create new clip interactor around an existing tracker
    pub fn new(
        ports: TrackerPorts,
        metadata_port: Arc<dyn VideoMetadataPort>,
        tracker: TaskTracker,
    ) -> Self {
        let mirror = MirrorStore::new(Arc::clone(&ports.storage));
        Self {
            ports,
            metadata_port,
            mirror,
            tracker,
        }
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Form fields remembered from the last request
    pub fn saved_form(&self) -> Result<crate::app::mirror::PersistedClipForm, DomainError> {
        self.mirror.load_clip_form()
    }

    pub fn clear_form(&self) -> Result<(), DomainError> {
        self.mirror.clear_clip_form()
    }

    /// Validate the request, remember it and submit it to the server
    pub async fn execute(&self, payload: ClipPayload) -> Result<Job, DomainError> {
        ClipRules::validate(&payload)?;

        let previous = self.mirror.load_clip_form()?;
        if previous.source_url.as_deref() != Some(payload.source_url.as_str()) {
            self.mirror.clear_clip_form()?;
        }
        self.mirror.save_clip_form(&payload)?;

        match self.metadata_port.video_title(&payload.source_url).await {
            Some(title) => {
                info!(%title, "Resolved video title");
                self.mirror.save_video_title(&title)?;
            }
            None => debug!(source_url = %payload.source_url, "No video title available"),
        }

        info!(
            source_url = %payload.source_url,
            start = %payload.range.start,
            end = %payload.range.end,
            "Submitting clip request"
        );
        self.tracker.start(JobPayload::Clip(payload)).await
    }

    /// Wait for the job to settle; Ctrl-C cancels it
    pub async fn wait(&self) -> Result<Job, DomainError> {
        crate::app::wait_interruptible(&self.tracker).await
    }

    /// Download the artifact of one resolution into `dir`
    pub async fn download(&self, resolution: &str, dir: &Path) -> Result<PathBuf, DomainError> {
        let job = self.tracker.snapshot();
        let artifact = job.result.find(resolution).ok_or_else(|| {
            DomainError::ValidationFailed(format!("No {} clip available for download", resolution))
        })?;

        let label = Resolution::parse(resolution).label().to_string();
        let millis = self.ports.clock.now().timestamp_millis();
        let target = dir.join(format!("clip_{}_{}.mp4", label, millis));

        info!(url = %artifact.download_url, path = %target.display(), "Downloading clip");
        let bytes = match self.ports.api.fetch_url(&artifact.download_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, artifact_id = %artifact.artifact_id, "Clip URL failed, trying download endpoint");
                self.ports
                    .api
                    .download_artifact(JobKind::Clip, &artifact.artifact_id)
                    .await?
            }
        };
        crate::app::write_download(&target, &bytes).await?;
        Ok(target)
    }

    /// Ask the server to mail the finished clip
    pub async fn send_email(&self, address: &str) -> Result<(), DomainError> {
        EmailRules::validate(address)?;

        let job = self.tracker.snapshot();
        let id = match (&job.id, job.status) {
            (Some(id), JobStatus::Completed) => id.clone(),
            _ => {
                return Err(DomainError::InvalidState(
                    "Only a completed clip can be sent by email".to_string(),
                ))
            }
        };

        info!(%id, "Sending clip by email");
        self.ports.api.send_to_email(&id, address.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorageAdapter;
    use crate::app::tracker::TrackerConfig;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingApi {
        created: Mutex<Vec<ClipPayload>>,
        emails: Mutex<Vec<(JobId, String)>>,
        fetched: Mutex<Vec<String>>,
        urls_unavailable: bool,
    }

    #[async_trait]
    impl ClipApiPort for RecordingApi {
        async fn create_clip_job(&self, payload: &ClipPayload) -> Result<JobCreated, DomainError> {
            self.created.lock().unwrap().push(payload.clone());
            Ok(JobCreated {
                id: JobId::new("clip-1"),
                size_estimate_mb: None,
            })
        }

        async fn create_speed_edit_job(
            &self,
            _payload: &SpeedEditPayload,
        ) -> Result<JobCreated, DomainError> {
            Err(DomainError::Api("unsupported".to_string()))
        }

        async fn job_status(&self, _kind: JobKind, id: &JobId) -> Result<JobStatusReport, DomainError> {
            let mut result = ClipResult::default();
            result.artifacts.insert(
                Resolution::P720,
                Artifact::new("art-720", "https://cdn/720.mp4", Some(3.5)),
            );
            Ok(JobStatusReport {
                id: id.clone(),
                status: RemoteStatus::Completed,
                result: JobResult::Clip(result),
                error_message: None,
            })
        }

        async fn cancel_job(&self, _kind: JobKind, _id: &JobId) -> Result<(), DomainError> {
            Ok(())
        }

        async fn download_artifact(
            &self,
            _kind: JobKind,
            artifact_id: &str,
        ) -> Result<Vec<u8>, DomainError> {
            Ok(format!("bytes of {}", artifact_id).into_bytes())
        }

        async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, DomainError> {
            self.fetched.lock().unwrap().push(url.to_string());
            if self.urls_unavailable {
                return Err(DomainError::Network("connection refused".to_string()));
            }
            Ok(format!("bytes from {}", url).into_bytes())
        }

        async fn send_to_email(&self, id: &JobId, email: &str) -> Result<(), DomainError> {
            self.emails.lock().unwrap().push((id.clone(), email.to_string()));
            Ok(())
        }
    }

    struct FixedTitle;

    #[async_trait]
    impl VideoMetadataPort for FixedTitle {
        async fn video_title(&self, _source_url: &str) -> Option<String> {
            Some("Never Gonna Give You Up".to_string())
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl ClockPort for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn interactor() -> (ClipInteractor, Arc<RecordingApi>, MemoryStorageAdapter) {
        interactor_with(RecordingApi::default())
    }

    fn interactor_with(api: RecordingApi) -> (ClipInteractor, Arc<RecordingApi>, MemoryStorageAdapter) {
        let api = Arc::new(api);
        let storage = MemoryStorageAdapter::new();
        let ports = TrackerPorts {
            api: api.clone(),
            storage: Arc::new(storage.clone()),
            clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())),
        };
        let tracker = TaskTracker::new(JobKind::Clip, ports.clone(), TrackerConfig::default());
        (
            ClipInteractor::new(ports, Arc::new(FixedTitle), tracker),
            api,
            storage,
        )
    }

    fn payload(start: &str, end: &str) -> ClipPayload {
        ClipPayload {
            source_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            range: CutRange::new(TimeSpec::parse(start).unwrap(), TimeSpec::parse(end).unwrap())
                .unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_persists_form_and_title() {
        let (interactor, api, storage) = interactor();
        let job = interactor.execute(payload("00:00:10", "00:00:40")).await.unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(api.created.lock().unwrap().len(), 1);
        assert_eq!(storage.get("startTime").unwrap().as_deref(), Some("00:00:10"));
        assert_eq!(
            storage.get("videoTitle").unwrap().as_deref(),
            Some("Never Gonna Give You Up")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_rejects_long_clip_without_calling_server() {
        let (interactor, api, _) = interactor();
        let err = interactor
            .execute(payload("00:00:00", "00:10:01"))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::InvalidTimeRange("Max duration is 10 mins".to_string()));
        assert!(api.created.lock().unwrap().is_empty());
        assert_eq!(interactor.tracker().snapshot().status, JobStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_and_email_after_completion() {
        let (interactor, api, _) = interactor();
        interactor.execute(payload("00:00:10", "00:00:40")).await.unwrap();
        let job = interactor.wait().await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);

        let dir = TempDir::new().unwrap();
        let path = interactor.download("720p", dir.path()).await.unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("clip_720p_"));
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"bytes from https://cdn/720.mp4"
        );

        assert!(interactor.download("1080p", dir.path()).await.is_err());

        interactor.send_email("me@example.com").await.unwrap();
        assert_eq!(
            api.emails.lock().unwrap().as_slice(),
            &[(JobId::new("clip-1"), "me@example.com".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_falls_back_to_endpoint_when_url_fails() {
        let (interactor, api, _) = interactor_with(RecordingApi {
            urls_unavailable: true,
            ..RecordingApi::default()
        });
        interactor.execute(payload("00:00:10", "00:00:40")).await.unwrap();
        interactor.wait().await.unwrap();

        let dir = TempDir::new().unwrap();
        let path = interactor.download("720p", dir.path()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes of art-720");
        assert_eq!(
            api.fetched.lock().unwrap().as_slice(),
            &["https://cdn/720.mp4".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_email_requires_completed_job() {
        let (interactor, _, _) = interactor();
        let err = interactor.send_email("me@example.com").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        let err = interactor.send_email("not-an-address").await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }
}
