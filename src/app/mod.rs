// Application layer - Use case interactors

pub mod clip_interactor;
pub mod container;
pub mod mirror;
pub mod speed_interactor;
pub mod tracker;

// Re-export interactors
pub use clip_interactor::ClipInteractor;
pub use mirror::MirrorStore;
pub use speed_interactor::SpeedInteractor;
pub use tracker::{PollOutcome, TaskTracker, TrackerConfig, TrackerPorts};

use std::path::Path;

use tracing::warn;

use crate::domain::errors::DomainError;
use crate::domain::model::Job;

/// Wait for the tracked job to settle; Ctrl-C while waiting cancels it
pub(crate) async fn wait_interruptible(tracker: &TaskTracker) -> Result<Job, DomainError> {
    tokio::select! {
        job = tracker.wait_until_settled() => Ok(job),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| {
                DomainError::InternalError(format!("Failed to listen for Ctrl-C: {}", e))
            })?;
            warn!(kind = %tracker.kind(), "Interrupted, cancelling job");
            tracker.cancel().await
        }
    }
}

/// Write downloaded bytes, creating the target directory if needed
pub(crate) async fn write_download(target: &Path, bytes: &[u8]) -> Result<(), DomainError> {
    if let Some(dir) = target.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            DomainError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;
    }
    tokio::fs::write(target, bytes)
        .await
        .map_err(|e| DomainError::Storage(format!("Failed to write {}: {}", target.display(), e)))
}
