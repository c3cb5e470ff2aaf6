// Mirror store - Typed view of the durable key-value mirror

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::StoragePort;

const SOURCE_URL_KEY: &str = "youtubeUrl";
const START_TIME_KEY: &str = "startTime";
const END_TIME_KEY: &str = "endTime";
const VIDEO_TITLE_KEY: &str = "videoTitle";

const REQUEST_ID: &str = "requestId";
const STATUS: &str = "status";
const CREATED_AT: &str = "createdAt";
const POLL_INTERVAL_MS: &str = "pollIntervalMs";
const RESULTS: &str = "results";
const ERROR_MESSAGE: &str = "errorMessage";
const SPEED_FACTOR: &str = "speedFactor";

const JOB_FIELDS: [&str; 6] = [
    REQUEST_ID,
    STATUS,
    CREATED_AT,
    POLL_INTERVAL_MS,
    RESULTS,
    ERROR_MESSAGE,
];

/// Job state as found in the mirror
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedJob {
    pub id: Option<JobId>,
    pub status: JobStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub poll_interval: Option<Duration>,
    pub result: JobResult,
    pub error_message: Option<String>,
}

/// Clip form fields as found in the mirror
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedClipForm {
    pub source_url: Option<String>,
    pub start: Option<TimeSpec>,
    pub end: Option<TimeSpec>,
    pub video_title: Option<String>,
}

impl PersistedClipForm {
    /// Requested range, if both ends are present and ordered
    pub fn range(&self) -> Option<CutRange> {
        CutRange::new(self.start?, self.end?).ok()
    }
}

/// Reads and writes tracker state under flat string keys.
///
/// Job keys are prefixed with the job kind (`clip.status`, `speed_edit.status`);
/// form fields use the same names the web front end used.
#[derive(Clone)]
pub struct MirrorStore {
    storage: Arc<dyn StoragePort>,
}

impl MirrorStore {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    fn key(kind: JobKind, field: &str) -> String {
        format!("{}.{}", kind.as_str(), field)
    }

    /// Persist the full state of a job
    pub fn save_job(&self, job: &Job, poll_interval: Option<Duration>) -> Result<(), DomainError> {
        let kind = job.kind;
        let results = serde_json::to_string(&job.result)
            .map_err(|e| DomainError::Storage(format!("Failed to encode results: {}", e)))?;

        self.storage.write_batch(&[
            (
                Self::key(kind, REQUEST_ID),
                job.id.as_ref().map(|id| id.as_str().to_string()),
            ),
            (Self::key(kind, STATUS), Some(job.status.as_str().to_string())),
            (
                Self::key(kind, CREATED_AT),
                job.created_at.map(|at| at.to_rfc3339()),
            ),
            (
                Self::key(kind, POLL_INTERVAL_MS),
                poll_interval.map(|every| every.as_millis().to_string()),
            ),
            (Self::key(kind, RESULTS), Some(results)),
            (Self::key(kind, ERROR_MESSAGE), job.error_message.clone()),
        ])
    }

    /// Load the persisted job of a kind; `None` when nothing was persisted
    pub fn load_job(&self, kind: JobKind) -> Result<Option<PersistedJob>, DomainError> {
        let Some(raw_status) = self.storage.get(&Self::key(kind, STATUS))? else {
            return Ok(None);
        };
        let Some(status) = JobStatus::parse(&raw_status) else {
            warn!(%kind, status = %raw_status, "Ignoring unknown persisted status");
            return Ok(None);
        };

        let id = self
            .storage
            .get(&Self::key(kind, REQUEST_ID))?
            .filter(|id| !id.is_empty())
            .map(JobId::new);

        let created_at = self
            .storage
            .get(&Self::key(kind, CREATED_AT))?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|at| at.with_timezone(&Utc));

        let poll_interval = self
            .storage
            .get(&Self::key(kind, POLL_INTERVAL_MS))?
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis);

        let result = match self.storage.get(&Self::key(kind, RESULTS))? {
            Some(raw) => match serde_json::from_str::<JobResult>(&raw) {
                Ok(result) if result.kind() == kind => result,
                Ok(_) | Err(_) => {
                    warn!(%kind, "Discarding unreadable persisted results");
                    JobResult::empty(kind)
                }
            },
            None => JobResult::empty(kind),
        };

        Ok(Some(PersistedJob {
            id,
            status,
            created_at,
            poll_interval,
            result,
            error_message: self.storage.get(&Self::key(kind, ERROR_MESSAGE))?,
        }))
    }

    /// Remove every job key of a kind
    pub fn clear_job(&self, kind: JobKind) -> Result<(), DomainError> {
        let changes: Vec<(String, Option<String>)> = JOB_FIELDS
            .iter()
            .map(|field| (Self::key(kind, field), None))
            .collect();
        self.storage.write_batch(&changes)
    }

    pub fn save_clip_form(&self, payload: &ClipPayload) -> Result<(), DomainError> {
        self.storage.write_batch(&[
            (SOURCE_URL_KEY.to_string(), Some(payload.source_url.clone())),
            (START_TIME_KEY.to_string(), Some(payload.range.start.format_hms())),
            (END_TIME_KEY.to_string(), Some(payload.range.end.format_hms())),
        ])
    }

    pub fn load_clip_form(&self) -> Result<PersistedClipForm, DomainError> {
        let time = |key: &str| -> Result<Option<TimeSpec>, DomainError> {
            Ok(self
                .storage
                .get(key)?
                .and_then(|raw| TimeSpec::parse(&raw).ok()))
        };
        Ok(PersistedClipForm {
            source_url: self.storage.get(SOURCE_URL_KEY)?,
            start: time(START_TIME_KEY)?,
            end: time(END_TIME_KEY)?,
            video_title: self.storage.get(VIDEO_TITLE_KEY)?,
        })
    }

    pub fn save_video_title(&self, title: &str) -> Result<(), DomainError> {
        self.storage.set(VIDEO_TITLE_KEY, title)
    }

    /// Forget the clip form, e.g. when the user starts over with another video
    pub fn clear_clip_form(&self) -> Result<(), DomainError> {
        let changes: Vec<(String, Option<String>)> = [SOURCE_URL_KEY, START_TIME_KEY, END_TIME_KEY, VIDEO_TITLE_KEY]
            .into_iter()
            .map(|key| (key.to_string(), None))
            .collect();
        self.storage.write_batch(&changes)
    }

    pub fn save_speed_factor(&self, speed_factor: f64) -> Result<(), DomainError> {
        self.storage
            .set(&Self::key(JobKind::SpeedEdit, SPEED_FACTOR), &speed_factor.to_string())
    }

    pub fn speed_factor(&self) -> Result<Option<f64>, DomainError> {
        Ok(self
            .storage
            .get(&Self::key(JobKind::SpeedEdit, SPEED_FACTOR))?
            .and_then(|raw| raw.parse().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorageAdapter;

    fn store() -> (MirrorStore, MemoryStorageAdapter) {
        let storage = MemoryStorageAdapter::new();
        (MirrorStore::new(Arc::new(storage.clone())), storage)
    }

    fn pending_clip_job() -> Job {
        let mut result = ClipResult::default();
        result.artifacts.insert(
            Resolution::P720,
            Artifact::new("a720", "https://cdn/720.mp4", Some(10.0)),
        );
        Job {
            id: Some(JobId::new("job-1")),
            kind: JobKind::Clip,
            status: JobStatus::Pending,
            created_at: Some(Utc::now()),
            result: JobResult::Clip(result),
            error_message: None,
        }
    }

    #[test]
    fn test_job_round_trip() {
        let (mirror, storage) = store();
        let job = pending_clip_job();
        mirror.save_job(&job, Some(Duration::from_millis(2000))).unwrap();

        assert_eq!(storage.get("clip.status").unwrap().as_deref(), Some("pending"));
        assert_eq!(storage.get("clip.requestId").unwrap().as_deref(), Some("job-1"));

        let loaded = mirror.load_job(JobKind::Clip).unwrap().unwrap();
        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.status, JobStatus::Pending);
        assert_eq!(loaded.poll_interval, Some(Duration::from_millis(2000)));
        assert_eq!(loaded.result, job.result);
        assert_eq!(
            loaded.created_at.map(|at| at.timestamp()),
            job.created_at.map(|at| at.timestamp())
        );
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let (mirror, _) = store();
        mirror.save_job(&pending_clip_job(), None).unwrap();
        assert_eq!(mirror.load_job(JobKind::SpeedEdit).unwrap(), None);
    }

    #[test]
    fn test_clear_job_removes_every_key() {
        let (mirror, storage) = store();
        mirror.save_job(&pending_clip_job(), Some(Duration::from_secs(2))).unwrap();
        mirror.clear_job(JobKind::Clip).unwrap();
        assert!(storage.is_empty());
        assert_eq!(mirror.load_job(JobKind::Clip).unwrap(), None);
    }

    #[test]
    fn test_unreadable_results_fall_back_to_empty() {
        let (mirror, storage) = store();
        storage.set("clip.status", "completed").unwrap();
        storage.set("clip.results", "{broken").unwrap();

        let loaded = mirror.load_job(JobKind::Clip).unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Completed);
        assert!(loaded.result.is_empty());
    }

    #[test]
    fn test_clip_form_round_trip() {
        let (mirror, _) = store();
        let payload = ClipPayload {
            source_url: "https://youtu.be/abc".to_string(),
            range: CutRange::new(
                TimeSpec::parse("00:00:10").unwrap(),
                TimeSpec::parse("00:00:40").unwrap(),
            )
            .unwrap(),
        };
        mirror.save_clip_form(&payload).unwrap();
        mirror.save_video_title("A video").unwrap();

        let form = mirror.load_clip_form().unwrap();
        assert_eq!(form.source_url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(form.range(), Some(payload.range));
        assert_eq!(form.video_title.as_deref(), Some("A video"));

        mirror.clear_clip_form().unwrap();
        assert_eq!(mirror.load_clip_form().unwrap(), PersistedClipForm::default());
    }

    /// Counts how often the backing store is written
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorageAdapter,
        writes: std::sync::atomic::AtomicUsize,
    }

    impl CountingStorage {
        fn writes(&self) -> usize {
            self.writes.load(std::sync::atomic::Ordering::SeqCst)
        }

        fn count(&self) {
            self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl StoragePort for CountingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
            self.count();
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), DomainError> {
            self.count();
            self.inner.remove(key)
        }

        fn write_batch(&self, changes: &[(String, Option<String>)]) -> Result<(), DomainError> {
            self.count();
            self.inner.write_batch(changes)
        }
    }

    #[test]
    fn test_job_mutations_write_once() {
        let storage = Arc::new(CountingStorage::default());
        let mirror = MirrorStore::new(storage.clone());

        mirror.save_job(&pending_clip_job(), Some(Duration::from_secs(2))).unwrap();
        assert_eq!(storage.writes(), 1);

        mirror.clear_job(JobKind::Clip).unwrap();
        assert_eq!(storage.writes(), 2);
        assert!(storage.inner.is_empty());
    }

    #[test]
    fn test_speed_factor_round_trip() {
        let (mirror, _) = store();
        assert_eq!(mirror.speed_factor().unwrap(), None);
        mirror.save_speed_factor(1.75).unwrap();
        assert_eq!(mirror.speed_factor().unwrap(), Some(1.75));
    }
}
