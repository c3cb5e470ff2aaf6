// Domain models - Core types and data structures

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Which server-side operation a job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Extract a time range from a source video
    Clip,
    /// Re-process a video at a different playback speed
    SpeedEdit,
}

impl JobKind {
    /// Wire name, also used as the mirror key prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Clip => "clip",
            JobKind::SpeedEdit => "speed_edit",
        }
    }

    /// Parse job kind from string
    pub fn parse(kind_str: &str) -> Result<Self, DomainError> {
        match kind_str.trim().to_lowercase().as_str() {
            "clip" => Ok(JobKind::Clip),
            "speed_edit" | "speed-edit" | "speed" => Ok(JobKind::SpeedEdit),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid job kind: {}. Valid kinds: clip, speed-edit",
                kind_str
            ))),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side job status.
///
/// `Pending`, `Completed` and `Failed` mirror what the server reports;
/// `Idle` and `Cancelled` only ever exist on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a persisted status; unknown values yield `None`
    pub fn parse(status_str: &str) -> Option<Self> {
        match status_str.trim() {
            "idle" => Some(JobStatus::Idle),
            "pending" => Some(JobStatus::Pending),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier issued by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolution label of a clip artifact
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Resolution {
    P1080,
    P720,
    P480,
    P360,
    /// Any label the server reports that we do not know about, kept verbatim
    Other(String),
}

impl Resolution {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "1080p" | "1080" => Resolution::P1080,
            "720p" | "720" => Resolution::P720,
            "480p" | "480" => Resolution::P480,
            "360p" | "360" => Resolution::P360,
            _ => Resolution::Other(label.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Resolution::P1080 => "1080p",
            Resolution::P720 => "720p",
            Resolution::P480 => "480p",
            Resolution::P360 => "360p",
            Resolution::Other(label) => label,
        }
    }
}

impl From<String> for Resolution {
    fn from(label: String) -> Self {
        Resolution::parse(&label)
    }
}

impl From<Resolution> for String {
    fn from(resolution: Resolution) -> Self {
        resolution.label().to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One named output of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: String,
    pub download_url: String,
    pub size_mb: Option<f64>,
}

impl Artifact {
    pub fn new(artifact_id: impl Into<String>, download_url: impl Into<String>, size_mb: Option<f64>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            download_url: download_url.into(),
            size_mb,
        }
    }

    /// Size annotation as the server reports it, e.g. `12.5MB`
    pub fn size_label(&self) -> Option<String> {
        self.size_mb.map(|size| format!("{}MB", size))
    }
}

/// Artifacts produced by a clip job, one per resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipResult {
    pub artifacts: BTreeMap<Resolution, Artifact>,
}

/// Artifact produced by a speed-edit job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedEditResult {
    pub output: Option<Artifact>,
}

/// Result of a job, tagged by job kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobResult {
    Clip(ClipResult),
    SpeedEdit(SpeedEditResult),
}

impl JobResult {
    /// Empty result for the given job kind
    pub fn empty(kind: JobKind) -> Self {
        match kind {
            JobKind::Clip => JobResult::Clip(ClipResult::default()),
            JobKind::SpeedEdit => JobResult::SpeedEdit(SpeedEditResult::default()),
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            JobResult::Clip(_) => JobKind::Clip,
            JobResult::SpeedEdit(_) => JobKind::SpeedEdit,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            JobResult::Clip(clip) => clip.artifacts.is_empty(),
            JobResult::SpeedEdit(speed) => speed.output.is_none(),
        }
    }

    /// Merge newly reported artifacts into this result.
    ///
    /// An artifact for an already populated slot replaces it, artifacts for other
    /// slots accumulate. Nothing is ever removed. Returns whether anything changed;
    /// an update of a different kind is ignored.
    pub fn merge(&mut self, update: JobResult) -> bool {
        match (self, update) {
            (JobResult::Clip(current), JobResult::Clip(update)) => {
                let mut changed = false;
                for (resolution, artifact) in update.artifacts {
                    if current.artifacts.get(&resolution) != Some(&artifact) {
                        current.artifacts.insert(resolution, artifact);
                        changed = true;
                    }
                }
                changed
            }
            (JobResult::SpeedEdit(current), JobResult::SpeedEdit(update)) => match update.output {
                Some(artifact) if current.output.as_ref() != Some(&artifact) => {
                    current.output = Some(artifact);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// All artifacts with their slot label, highest resolution first
    pub fn artifacts(&self) -> Vec<(String, &Artifact)> {
        match self {
            JobResult::Clip(clip) => clip
                .artifacts
                .iter()
                .map(|(resolution, artifact)| (resolution.label().to_string(), artifact))
                .collect(),
            JobResult::SpeedEdit(speed) => speed
                .output
                .iter()
                .map(|artifact| ("speed_edit".to_string(), artifact))
                .collect(),
        }
    }

    /// Find an artifact by slot label; speed edits have a single `speed_edit` slot
    pub fn find(&self, label: &str) -> Option<&Artifact> {
        match self {
            JobResult::Clip(clip) => clip.artifacts.get(&Resolution::parse(label)),
            JobResult::SpeedEdit(speed) => speed.output.as_ref(),
        }
    }
}

/// One server-side job tracked by the client
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Option<JobId>,
    pub kind: JobKind,
    pub status: JobStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub result: JobResult,
    pub error_message: Option<String>,
}

impl Job {
    /// Initial state for a job kind
    pub fn idle(kind: JobKind) -> Self {
        Self {
            id: None,
            kind,
            status: JobStatus::Idle,
            created_at: None,
            result: JobResult::empty(kind),
            error_message: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == JobStatus::Pending
    }

    /// Time elapsed since creation, if the job was created
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.created_at.map(|created| now - created)
    }
}

/// Time of day in a source video, `HH:MM:SS` with whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpec {
    seconds: u32,
}

impl TimeSpec {
    /// Largest representable value, 23:59:59
    pub const MAX_SECONDS: u32 = 23 * 3600 + 59 * 60 + 59;

    pub fn from_seconds(seconds: u32) -> Result<Self, DomainError> {
        if seconds > Self::MAX_SECONDS {
            return Err(DomainError::BadArgs(format!(
                "Time {}s exceeds 23:59:59",
                seconds
            )));
        }
        Ok(Self { seconds })
    }

    /// Create a TimeSpec from hours, minutes and seconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32) -> Result<Self, DomainError> {
        if hours > 23 {
            return Err(DomainError::BadArgs("Hours must be between 00 and 23".to_string()));
        }
        if minutes > 59 {
            return Err(DomainError::BadArgs("Minutes must be less than 60".to_string()));
        }
        if seconds > 59 {
            return Err(DomainError::BadArgs("Seconds must be less than 60".to_string()));
        }
        Ok(Self {
            seconds: hours * 3600 + minutes * 60 + seconds,
        })
    }

    /// Parse `HH:MM:SS`
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.len() != 2 || !p.bytes().all(|b| b.is_ascii_digit())) {
            return Err(DomainError::BadArgs(format!(
                "Invalid time '{}'. Format: HH:MM:SS",
                trimmed
            )));
        }

        let field = |s: &str| {
            s.parse::<u32>()
                .map_err(|_| DomainError::BadArgs(format!("Invalid time '{}'. Format: HH:MM:SS", trimmed)))
        };
        Self::from_components(field(parts[0])?, field(parts[1])?, field(parts[2])?)
    }

    pub fn as_seconds(&self) -> u32 {
        self.seconds
    }

    /// Format as HH:MM:SS
    pub fn format_hms(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.seconds / 3600,
            (self.seconds % 3600) / 60,
            self.seconds % 60
        )
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Requested clip range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutRange {
    pub start: TimeSpec,
    pub end: TimeSpec,
}

impl CutRange {
    /// Create a new cut range with validation
    pub fn new(start: TimeSpec, end: TimeSpec) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::InvalidTimeRange(
                "End time must be after start time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn duration_secs(&self) -> u32 {
        self.end.as_seconds() - self.start.as_seconds()
    }
}

/// Payload of a clip job
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPayload {
    pub source_url: String,
    pub range: CutRange,
}

/// Where a speed edit takes its input from
#[derive(Debug, Clone, PartialEq)]
pub enum SpeedSource {
    /// A clip artifact the server produced earlier
    Clip { artifact_id: String },
    /// A local video file uploaded with the request
    Upload { path: PathBuf },
}

/// Payload of a speed-edit job
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedEditPayload {
    pub speed_factor: f64,
    pub source: SpeedSource,
}

/// Kind-specific job payload
#[derive(Debug, Clone, PartialEq)]
pub enum JobPayload {
    Clip(ClipPayload),
    SpeedEdit(SpeedEditPayload),
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::Clip(_) => JobKind::Clip,
            JobPayload::SpeedEdit(_) => JobKind::SpeedEdit,
        }
    }
}

/// Status as reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Unknown(String),
}

impl RemoteStatus {
    pub fn parse(status_str: &str) -> Self {
        match status_str.trim().to_lowercase().as_str() {
            "pending" | "queued" => RemoteStatus::Pending,
            "processing" | "running" | "in_progress" => RemoteStatus::Processing,
            "completed" | "done" | "success" => RemoteStatus::Completed,
            "failed" | "error" => RemoteStatus::Failed,
            "cancelled" | "canceled" => RemoteStatus::Cancelled,
            other => RemoteStatus::Unknown(other.to_string()),
        }
    }
}

/// Answer to a job-creation call
#[derive(Debug, Clone, PartialEq)]
pub struct JobCreated {
    pub id: JobId,
    /// Server estimate of the input size, used to pick the polling cadence
    pub size_estimate_mb: Option<f64>,
}

/// Answer to a status poll
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusReport {
    pub id: JobId,
    pub status: RemoteStatus,
    /// Artifacts known so far; may be partial while the job is pending
    pub result: JobResult,
    pub error_message: Option<String>,
}
