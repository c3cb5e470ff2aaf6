//! VidClip CLI Library
//!
//! Client side of a remote YouTube clip and speed-edit service. Each long-running
//! server job is followed by a [`TaskTracker`](app::TaskTracker) that polls it to a
//! terminal state, supports cancellation and survives restarts through a durable
//! key-value mirror.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{PollOutcome, TaskTracker, TrackerConfig, TrackerPorts};
pub use config_initialization::ClientConfig;
pub use domain::errors::DomainError;
pub use domain::model::{Job, JobId, JobKind, JobResult, JobStatus};
pub use error::{ClipperError, ClipperResult};
