// Speed interactor - Orchestrates the speed edit use case

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::app::mirror::MirrorStore;
use crate::app::tracker::{TaskTracker, TrackerPorts};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::utils::Utils;

/// Interactor for speed edits of an uploaded video or an earlier clip
pub struct SpeedInteractor {
    ports: TrackerPorts,
    mirror: MirrorStore,
    tracker: TaskTracker,
}

impl SpeedInteractor {
    pub fn new(ports: TrackerPorts, tracker: TaskTracker) -> Self {
        let mirror = MirrorStore::new(Arc::clone(&ports.storage));
        Self {
            ports,
            mirror,
            tracker,
        }
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Validate the request and submit it to the server
    pub async fn execute(&self, payload: SpeedEditPayload) -> Result<Job, DomainError> {
        let upload_size = match &payload.source {
            SpeedSource::Upload { path } => Some(
                tokio::fs::metadata(path)
                    .await
                    .map_err(|e| {
                        DomainError::ValidationFailed(format!(
                            "Cannot read {}: {}",
                            path.display(),
                            e
                        ))
                    })?
                    .len(),
            ),
            SpeedSource::Clip { .. } => None,
        };
        SpeedRules::validate(&payload, upload_size)?;

        self.mirror.save_speed_factor(payload.speed_factor)?;
        info!(
            speed_factor = payload.speed_factor,
            source = ?payload.source,
            "Submitting speed edit"
        );
        self.tracker.start(JobPayload::SpeedEdit(payload)).await
    }

    /// Wait for the job to settle; Ctrl-C cancels it
    pub async fn wait(&self) -> Result<Job, DomainError> {
        crate::app::wait_interruptible(&self.tracker).await
    }

    /// Download the edited video as `speed_edited_<factor>x.mp4` into `dir`
    pub async fn download(&self, dir: &Path) -> Result<PathBuf, DomainError> {
        let job = self.tracker.snapshot();
        let artifact = job.result.find("speed_edit").ok_or_else(|| {
            DomainError::ValidationFailed("No edited video available for download".to_string())
        })?;

        let factor = self.mirror.speed_factor()?.unwrap_or(1.0);
        let target = dir.join(format!(
            "speed_edited_{}x.mp4",
            Utils::format_speed_factor(factor)
        ));

        info!(artifact_id = %artifact.artifact_id, path = %target.display(), "Downloading edited video");
        let bytes = match self
            .ports
            .api
            .download_artifact(JobKind::SpeedEdit, &artifact.artifact_id)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, url = %artifact.download_url, "Download endpoint failed, fetching output video directly");
                self.ports.api.fetch_url(&artifact.download_url).await?
            }
        };
        crate::app::write_download(&target, &bytes).await?;
        Ok(target)
    }
}
