// Domain rules - Validation, polling policy and status transitions

use std::time::Duration;

use url::Url;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Longest clip the service accepts, in seconds
pub const MAX_CLIP_DURATION_SECS: u32 = 600;

/// Largest local file accepted for a speed edit upload
pub const MAX_UPLOAD_SIZE_MB: u64 = 50;
pub const MAX_UPLOAD_SIZE_BYTES: u64 = MAX_UPLOAD_SIZE_MB * 1024 * 1024;

pub const MIN_SPEED_FACTOR: f64 = 0.25;
pub const MAX_SPEED_FACTOR: f64 = 2.0;

/// Client-side budget before a pending job is declared failed
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How long a cancelled job stays visible before decaying to idle
pub const DEFAULT_CANCEL_RESET_DELAY: Duration = Duration::from_millis(1000);

/// Allowed edges of the job state machine
pub struct StatusTransitions;

impl StatusTransitions {
    /// Whether `from -> to` is an edge of the state machine.
    ///
    /// Superseding a job with a new one is not an edge here: `start` first resets
    /// to `Idle` and then takes `Idle -> Pending`.
    pub fn is_allowed(from: JobStatus, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (from, to),
            (Idle, Pending)
                | (Pending, Idle)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Cancelled, Idle)
        )
    }
}

/// Validation for clip requests
pub struct ClipRules;

impl ClipRules {
    /// Validate a clip payload before a job is created
    pub fn validate(payload: &ClipPayload) -> Result<(), DomainError> {
        Self::validate_source_url(&payload.source_url)?;
        if payload.range.duration_secs() > MAX_CLIP_DURATION_SECS {
            return Err(DomainError::InvalidTimeRange(
                "Max duration is 10 mins".to_string(),
            ));
        }
        Ok(())
    }

    /// The URL must be present and identify a single video
    pub fn validate_source_url(source_url: &str) -> Result<(), DomainError> {
        if source_url.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "YouTube URL is required".to_string(),
            ));
        }
        if Self::video_id(source_url).is_none() {
            return Err(DomainError::ValidationFailed(format!(
                "Not a YouTube video link: {}",
                source_url
            )));
        }
        Ok(())
    }

    /// Extract the video id from a `watch?v=` link or a `youtu.be/<id>` short link
    pub fn video_id(source_url: &str) -> Option<String> {
        let url = Url::parse(source_url.trim()).ok()?;
        let host = url.host_str()?.trim_start_matches("www.").to_lowercase();

        let id = if host == "youtu.be" {
            url.path_segments()?.next().map(str::to_string)
        } else {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        };

        id.filter(|id| !id.is_empty())
    }
}

/// Validation for speed-edit requests
pub struct SpeedRules;

impl SpeedRules {
    /// Validate a speed-edit payload; `upload_size` is the local file size in bytes
    pub fn validate(payload: &SpeedEditPayload, upload_size: Option<u64>) -> Result<(), DomainError> {
        Self::validate_speed_factor(payload.speed_factor)?;

        match &payload.source {
            SpeedSource::Clip { artifact_id } => {
                if artifact_id.trim().is_empty() {
                    return Err(DomainError::ValidationFailed(
                        "A source clip id is required".to_string(),
                    ));
                }
            }
            SpeedSource::Upload { path } => {
                let size = upload_size.ok_or_else(|| {
                    DomainError::ValidationFailed(format!(
                        "Cannot determine size of {}",
                        path.display()
                    ))
                })?;
                if size > MAX_UPLOAD_SIZE_BYTES {
                    return Err(DomainError::ValidationFailed(format!(
                        "Video size must not exceed {}MB. Your file is {:.1}MB.",
                        MAX_UPLOAD_SIZE_MB,
                        size as f64 / (1024.0 * 1024.0)
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn validate_speed_factor(speed_factor: f64) -> Result<(), DomainError> {
        if !speed_factor.is_finite()
            || !(MIN_SPEED_FACTOR..=MAX_SPEED_FACTOR).contains(&speed_factor)
        {
            return Err(DomainError::BadArgs(format!(
                "Speed factor must be between {}x and {}x",
                MIN_SPEED_FACTOR, MAX_SPEED_FACTOR
            )));
        }
        Ok(())
    }
}

/// Validation for email delivery
pub struct EmailRules;

impl EmailRules {
    pub fn validate(address: &str) -> Result<(), DomainError> {
        let address = address.trim();
        let valid = match address.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        };
        if !valid {
            return Err(DomainError::ValidationFailed(format!(
                "Invalid email address: {}",
                address
            )));
        }
        Ok(())
    }
}

/// Polling cadence, chosen once when a job starts
pub struct PollingPolicy;

impl PollingPolicy {
    /// Cadence for a clip job, from the requested clip length
    pub fn for_clip(range: &CutRange) -> Duration {
        match range.duration_secs() {
            d if d < 60 => Duration::from_millis(2000),
            d if d < 180 => Duration::from_millis(5000),
            _ => Duration::from_millis(7000),
        }
    }

    /// Cadence for a speed edit, from the server's size estimate
    pub fn for_speed_edit(size_estimate_mb: Option<f64>) -> Duration {
        match size_estimate_mb {
            None => Duration::from_millis(1500),
            Some(mb) if mb < 1.0 => Duration::from_millis(1500),
            Some(mb) if mb < 5.0 => Duration::from_millis(2500),
            Some(mb) if mb < 15.0 => Duration::from_millis(4000),
            Some(_) => Duration::from_millis(7000),
        }
    }

    pub fn for_payload(payload: &JobPayload, created: &JobCreated) -> Duration {
        match payload {
            JobPayload::Clip(clip) => Self::for_clip(&clip.range),
            JobPayload::SpeedEdit(_) => Self::for_speed_edit(created.size_estimate_mb),
        }
    }
}

/// Message recorded when the client gives up on a job
pub fn timeout_message(timeout: Duration) -> String {
    format!(
        "Processing timed out after {} seconds",
        timeout.as_secs()
    )
}

#[cfg(test)]
mod tests;
