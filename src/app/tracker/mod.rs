// Task tracker - Lifecycle of one long-running server job per kind

mod task_guard;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::app::mirror::MirrorStore;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

use task_guard::TaskGuard;

/// Cadence used when a resumed job has no persisted cadence
const RESUME_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Timing knobs of the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Budget after which a pending job is failed on the client
    pub timeout: Duration,
    /// How long `Cancelled` is shown before decaying to `Idle`
    pub cancel_reset_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_JOB_TIMEOUT,
            cancel_reset_delay: DEFAULT_CANCEL_RESET_DELAY,
        }
    }
}

/// External collaborators of the tracker
#[derive(Clone)]
pub struct TrackerPorts {
    pub api: Arc<dyn ClipApiPort>,
    pub storage: Arc<dyn StoragePort>,
    pub clock: Arc<dyn ClockPort>,
}

/// What a single poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No pending job with an id, nothing was asked
    Skipped,
    /// Server still working; partial artifacts may have been merged
    StillPending,
    Completed,
    Failed,
    /// Client budget exhausted; job forced to failed
    TimedOut,
    /// Response no longer matched the live job and was dropped
    Discarded,
    /// Transient error; the next tick tries again
    Retrying,
}

struct TrackerState {
    job: Job,
    /// Bumped by every start and reset; async completions compare against it
    generation: u64,
    poll_interval: Option<Duration>,
    cancelling: bool,
    poller: Option<TaskGuard>,
    reset_task: Option<TaskGuard>,
}

struct Shared {
    kind: JobKind,
    ports: TrackerPorts,
    mirror: MirrorStore,
    config: TrackerConfig,
    state: Mutex<TrackerState>,
    updates: watch::Sender<Job>,
}

/// Tracks one outstanding server job of a given kind.
///
/// Every mutation is published to subscribers and written to the durable
/// mirror. Responses from the API are applied only if the job they belong to
/// is still the live one, so a late poll can never overwrite a cancellation or
/// a newer job.
pub struct TaskTracker {
    shared: Arc<Shared>,
}

impl TaskTracker {
    /// Create an idle tracker without looking at the mirror
    pub fn new(kind: JobKind, ports: TrackerPorts, config: TrackerConfig) -> Self {
        let job = Job::idle(kind);
        let (updates, _) = watch::channel(job.clone());
        let mirror = MirrorStore::new(Arc::clone(&ports.storage));

        Self {
            shared: Arc::new(Shared {
                kind,
                ports,
                mirror,
                config,
                state: Mutex::new(TrackerState {
                    job,
                    generation: 0,
                    poll_interval: None,
                    cancelling: false,
                    poller: None,
                    reset_task: None,
                }),
                updates,
            }),
        }
    }

    /// Rebuild a tracker from the durable mirror.
    ///
    /// A persisted pending job resumes polling right away; a persisted
    /// cancellation is never resumed and yields an idle tracker.
    pub fn restore(
        kind: JobKind,
        ports: TrackerPorts,
        config: TrackerConfig,
    ) -> Result<Self, DomainError> {
        let tracker = Self::new(kind, ports, config);
        tracker.shared.restore_from_mirror(true)?;
        Ok(tracker)
    }

    /// Rebuild a tracker from the durable mirror without resuming polling.
    ///
    /// For one-shot commands that ask the server at most once themselves.
    pub fn load(kind: JobKind, ports: TrackerPorts, config: TrackerConfig) -> Result<Self, DomainError> {
        let tracker = Self::new(kind, ports, config);
        tracker.shared.restore_from_mirror(false)?;
        Ok(tracker)
    }

    pub fn kind(&self) -> JobKind {
        self.shared.kind
    }

    /// Current state of the job
    pub fn snapshot(&self) -> Job {
        self.shared.lock().job.clone()
    }

    /// Cadence chosen for the current job
    pub fn poll_interval(&self) -> Option<Duration> {
        self.shared.lock().poll_interval
    }

    /// Whether a poll timer is currently alive
    pub fn is_polling(&self) -> bool {
        self.shared
            .lock()
            .poller
            .as_ref()
            .map(|poller| !poller.is_finished())
            .unwrap_or(false)
    }

    /// Receive every state change of the job
    pub fn subscribe(&self) -> watch::Receiver<Job> {
        self.shared.updates.subscribe()
    }

    /// Wait until the job leaves `Pending` and return that state
    pub async fn wait_until_settled(&self) -> Job {
        let mut updates = self.subscribe();
        loop {
            let job = updates.borrow_and_update().clone();
            if !job.is_pending() {
                return job;
            }
            if updates.changed().await.is_err() {
                return job;
            }
        }
    }

    /// Create a job on the server and start tracking it
    pub async fn start(&self, payload: JobPayload) -> Result<Job, DomainError> {
        self.shared.start(payload).await
    }

    /// Run a single status poll of the current job
    pub async fn poll(&self) -> PollOutcome {
        self.shared.poll().await
    }

    /// Cancel the pending job
    pub async fn cancel(&self) -> Result<Job, DomainError> {
        self.shared.cancel().await
    }

    /// Drop the current job and go back to idle
    pub fn reset(&self) {
        self.shared.reset();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist and broadcast the current state
    fn publish(&self, state: &TrackerState) {
        let persisted = if state.job.status == JobStatus::Idle {
            self.mirror.clear_job(self.kind)
        } else {
            self.mirror.save_job(&state.job, state.poll_interval)
        };
        if let Err(e) = persisted {
            error!(kind = %self.kind, error = %e, "Failed to persist job state");
        }
        self.updates.send_replace(state.job.clone());
    }

    /// Move along one edge of the state machine; anything else is refused
    fn transition(&self, state: &mut TrackerState, to: JobStatus) -> bool {
        let from = state.job.status;
        if !StatusTransitions::is_allowed(from, to) {
            warn!(kind = %self.kind, %from, %to, "Refusing status transition");
            return false;
        }
        debug!(kind = %self.kind, %from, %to, "Job status transition");
        state.job.status = to;
        true
    }

    fn timed_out(&self, job: &Job) -> bool {
        job.elapsed(self.ports.clock.now())
            .and_then(|elapsed| elapsed.to_std().ok())
            .map(|elapsed| elapsed > self.config.timeout)
            .unwrap_or(false)
    }

    fn fail_with_timeout(&self, state: &mut TrackerState) {
        warn!(
            kind = %self.kind,
            id = ?state.job.id,
            timeout_secs = self.config.timeout.as_secs(),
            "Job timed out on the client"
        );
        if self.transition(state, JobStatus::Failed) {
            state.job.error_message = Some(timeout_message(self.config.timeout));
        }
        state.poller = None;
        self.publish(state);
    }

    /// Whether the poller for `generation` should keep ticking
    fn keeps_polling(&self, generation: u64) -> bool {
        let state = self.lock();
        state.generation == generation && state.job.is_pending() && !state.cancelling
    }

    fn spawn_poller(self: &Arc<Self>, state: &mut TrackerState, every: Duration) {
        let shared = Arc::downgrade(self);
        let generation = state.generation;
        state.poller = Some(TaskGuard::spawn(
            "poller",
            run_poller(shared, generation, every),
        ));
    }

    fn spawn_reset(self: &Arc<Self>, state: &mut TrackerState) {
        let shared = Arc::downgrade(self);
        let generation = state.generation;
        let delay = self.config.cancel_reset_delay;
        state.reset_task = Some(TaskGuard::spawn(
            "cancel-reset",
            run_cancel_reset(shared, generation, delay),
        ));
    }

    fn restore_from_mirror(self: &Arc<Self>, resume: bool) -> Result<(), DomainError> {
        let Some(persisted) = self.mirror.load_job(self.kind)? else {
            return Ok(());
        };

        let mut state = self.lock();
        match (persisted.status, persisted.id) {
            (JobStatus::Pending, Some(id)) => {
                let every = match persisted.poll_interval {
                    Some(every) => every,
                    None => self.fallback_interval()?,
                };
                state.generation += 1;
                state.job = Job {
                    id: Some(id),
                    kind: self.kind,
                    status: JobStatus::Pending,
                    created_at: Some(persisted.created_at.unwrap_or_else(|| self.ports.clock.now())),
                    result: persisted.result,
                    error_message: None,
                };
                state.poll_interval = Some(every);
                self.publish(&state);
                if resume {
                    info!(kind = %self.kind, id = ?state.job.id, "Resuming tracking of pending job");
                    self.spawn_poller(&mut state, every);
                }
            }
            (status @ (JobStatus::Completed | JobStatus::Failed), id) => {
                state.job = Job {
                    id,
                    kind: self.kind,
                    status,
                    created_at: persisted.created_at,
                    result: persisted.result,
                    error_message: persisted.error_message,
                };
                state.poll_interval = persisted.poll_interval;
                self.updates.send_replace(state.job.clone());
            }
            (status, _) => {
                // cancellations are never resumed; a pending job without id never got created
                debug!(kind = %self.kind, %status, "Discarding persisted job");
                self.mirror.clear_job(self.kind)?;
            }
        }
        Ok(())
    }

    /// Cadence for a resumed job that has none persisted
    fn fallback_interval(&self) -> Result<Duration, DomainError> {
        if self.kind == JobKind::Clip {
            if let Some(range) = self.mirror.load_clip_form()?.range() {
                return Ok(PollingPolicy::for_clip(&range));
            }
        }
        Ok(RESUME_POLL_INTERVAL)
    }

    async fn start(self: &Arc<Self>, payload: JobPayload) -> Result<Job, DomainError> {
        if payload.kind() != self.kind {
            return Err(DomainError::BadArgs(format!(
                "A {} payload cannot start a {} job",
                payload.kind(),
                self.kind
            )));
        }

        let generation = {
            let mut state = self.lock();
            state.poller = None;
            state.reset_task = None;
            state.cancelling = false;
            state.generation += 1;
            if state.job.status != JobStatus::Idle {
                info!(
                    kind = %self.kind,
                    id = ?state.job.id,
                    status = %state.job.status,
                    "Superseding previous job"
                );
            }
            state.job = Job::idle(self.kind);
            state.poll_interval = None;
            self.publish(&state);

            self.transition(&mut state, JobStatus::Pending);
            self.publish(&state);
            state.generation
        };

        let created = match &payload {
            JobPayload::Clip(clip) => self.ports.api.create_clip_job(clip).await,
            JobPayload::SpeedEdit(speed) => self.ports.api.create_speed_edit_job(speed).await,
        };

        let mut state = self.lock();
        if state.generation != generation {
            warn!(kind = %self.kind, "Discarding creation response of a superseded job");
            return Err(DomainError::InvalidState(
                "Job was superseded before it was created".to_string(),
            ));
        }

        match created {
            Err(e) => {
                warn!(kind = %self.kind, error = %e, "Job creation failed");
                self.transition(&mut state, JobStatus::Idle);
                state.job = Job::idle(self.kind);
                self.publish(&state);
                Err(e)
            }
            Ok(created) => {
                let every = PollingPolicy::for_payload(&payload, &created);
                state.job.id = Some(created.id);
                state.job.created_at = Some(self.ports.clock.now());
                state.poll_interval = Some(every);
                self.publish(&state);
                self.spawn_poller(&mut state, every);

                info!(
                    kind = %self.kind,
                    id = ?state.job.id,
                    poll_interval_ms = every.as_millis() as u64,
                    "Job created"
                );
                Ok(state.job.clone())
            }
        }
    }

    async fn poll(&self) -> PollOutcome {
        let (id, generation) = {
            let mut state = self.lock();
            if !state.job.is_pending() || state.cancelling {
                return PollOutcome::Skipped;
            }
            let Some(id) = state.job.id.clone() else {
                return PollOutcome::Skipped;
            };
            if self.timed_out(&state.job) {
                self.fail_with_timeout(&mut state);
                return PollOutcome::TimedOut;
            }
            (id, state.generation)
        };

        let report = match self.ports.api.job_status(self.kind, &id).await {
            Ok(report) => report,
            Err(e) => {
                warn!(kind = %self.kind, %id, error = %e, "Status poll failed; will retry");
                return PollOutcome::Retrying;
            }
        };

        let mut state = self.lock();
        if state.generation != generation
            || state.job.id.as_ref() != Some(&id)
            || !state.job.is_pending()
            || state.cancelling
        {
            debug!(kind = %self.kind, %id, "Discarding poll response for a job that moved on");
            return PollOutcome::Discarded;
        }
        if report.id != id {
            warn!(kind = %self.kind, expected = %id, got = %report.id, "Discarding poll response for another job");
            return PollOutcome::Discarded;
        }
        if self.timed_out(&state.job) {
            self.fail_with_timeout(&mut state);
            return PollOutcome::TimedOut;
        }

        let merged = state.job.result.merge(report.result);
        let outcome = match report.status {
            RemoteStatus::Completed => {
                self.transition(&mut state, JobStatus::Completed);
                state.poller = None;
                info!(kind = %self.kind, %id, artifacts = state.job.result.artifacts().len(), "Job completed");
                PollOutcome::Completed
            }
            status @ (RemoteStatus::Failed | RemoteStatus::Cancelled) => {
                let message = match report.error_message.filter(|m| !m.trim().is_empty()) {
                    Some(message) => message,
                    None if status == RemoteStatus::Cancelled => {
                        "Job was cancelled on the server".to_string()
                    }
                    None => "Processing failed".to_string(),
                };
                warn!(kind = %self.kind, %id, %message, "Job failed");
                self.transition(&mut state, JobStatus::Failed);
                state.job.error_message = Some(message);
                state.poller = None;
                PollOutcome::Failed
            }
            other => {
                debug!(kind = %self.kind, %id, status = ?other, merged, "Job still pending");
                PollOutcome::StillPending
            }
        };

        if merged || outcome != PollOutcome::StillPending {
            self.publish(&state);
        }
        outcome
    }

    async fn cancel(self: &Arc<Self>) -> Result<Job, DomainError> {
        let (id, generation) = {
            let mut state = self.lock();
            if !state.job.is_pending() {
                return Err(DomainError::InvalidState(format!(
                    "No pending {} job to cancel",
                    self.kind
                )));
            }
            let Some(id) = state.job.id.clone() else {
                return Err(DomainError::InvalidState(
                    "Job has not been created yet".to_string(),
                ));
            };
            if state.cancelling {
                return Err(DomainError::InvalidState(
                    "Cancellation already in progress".to_string(),
                ));
            }
            // stop the timer first so no late poll races the cancellation
            state.cancelling = true;
            state.poller = None;
            (id, state.generation)
        };

        info!(kind = %self.kind, %id, "Cancelling job");
        let cancelled = self.ports.api.cancel_job(self.kind, &id).await;

        let mut state = self.lock();
        if state.generation != generation {
            return Err(DomainError::InvalidState(
                "Job was superseded during cancellation".to_string(),
            ));
        }
        state.cancelling = false;

        match cancelled {
            Err(e) => {
                warn!(kind = %self.kind, %id, error = %e, "Cancellation failed; resuming polling");
                if let Some(every) = state.poll_interval {
                    self.spawn_poller(&mut state, every);
                }
                Err(e)
            }
            Ok(()) => {
                if self.transition(&mut state, JobStatus::Cancelled) {
                    self.publish(&state);
                    self.spawn_reset(&mut state);
                }
                Ok(state.job.clone())
            }
        }
    }

    /// Delayed second half of a cancellation
    fn decay_cancelled(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation || state.job.status != JobStatus::Cancelled {
            return;
        }
        if self.transition(&mut state, JobStatus::Idle) {
            state.job = Job::idle(self.kind);
            state.poll_interval = None;
            state.reset_task = None;
            info!(kind = %self.kind, "Cancelled job cleared");
            self.publish(&state);
        }
    }

    fn reset(&self) {
        let mut state = self.lock();
        state.poller = None;
        state.reset_task = None;
        state.cancelling = false;
        state.generation += 1;
        state.job = Job::idle(self.kind);
        state.poll_interval = None;
        self.publish(&state);
    }
}

async fn run_poller(shared: Weak<Shared>, generation: u64, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.keeps_polling(generation) {
            break;
        }
        shared.poll().await;
        if !shared.keeps_polling(generation) {
            break;
        }
    }
}

async fn run_cancel_reset(shared: Weak<Shared>, generation: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    if let Some(shared) = shared.upgrade() {
        shared.decay_cancelled(generation);
    }
}
