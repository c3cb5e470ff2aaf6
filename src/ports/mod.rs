// Ports - Interface definitions (contracts)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for the remote clip-processing API
#[async_trait]
pub trait ClipApiPort: Send + Sync {
    /// Create a clip job for a source URL and time range
    async fn create_clip_job(&self, payload: &ClipPayload) -> Result<JobCreated, DomainError>;

    /// Create a speed-edit job from an earlier clip or an uploaded file
    async fn create_speed_edit_job(
        &self,
        payload: &SpeedEditPayload,
    ) -> Result<JobCreated, DomainError>;

    /// Query the status of a job, including any artifacts known so far
    async fn job_status(&self, kind: JobKind, id: &JobId) -> Result<JobStatusReport, DomainError>;

    /// Ask the server to stop working on a job; best effort
    async fn cancel_job(&self, kind: JobKind, id: &JobId) -> Result<(), DomainError>;

    /// Fetch the binary content of an artifact
    async fn download_artifact(
        &self,
        kind: JobKind,
        artifact_id: &str,
    ) -> Result<Vec<u8>, DomainError>;

    /// Fetch the binary content behind an artifact's own download URL
    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, DomainError>;

    /// Email the artifacts of a clip job to an address
    async fn send_to_email(&self, id: &JobId, email: &str) -> Result<(), DomainError>;
}

/// Port for video metadata lookups on the hosting platform
#[async_trait]
pub trait VideoMetadataPort: Send + Sync {
    /// Title of the video behind `source_url`, if it can be found
    async fn video_title(&self, source_url: &str) -> Option<String>;
}

/// Port for the durable key-value mirror
pub trait StoragePort: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;

    fn remove(&self, key: &str) -> Result<(), DomainError>;

    /// Apply several writes as one; a `None` value removes the key
    fn write_batch(&self, changes: &[(String, Option<String>)]) -> Result<(), DomainError> {
        for (key, value) in changes {
            match value {
                Some(value) => self.set(key, value)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }
}

/// Port for wall-clock time
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
