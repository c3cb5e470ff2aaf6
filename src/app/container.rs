use std::sync::Arc;

use crate::adapters::{
    FileStorageAdapter, HttpClipApiAdapter, NoembedAdapter, SystemClockAdapter,
};
use crate::app::{
    clip_interactor::ClipInteractor, speed_interactor::SpeedInteractor, TaskTracker,
    TrackerConfig, TrackerPorts,
};
use crate::config_initialization::ClientConfig;
use crate::domain::errors::DomainError;
use crate::domain::model::JobKind;
use crate::ports::{ClipApiPort, ClockPort, StoragePort, VideoMetadataPort};

pub trait AppContainer: Send + Sync {
    fn clip_interactor(&self) -> Arc<ClipInteractor>;
    fn speed_interactor(&self) -> Arc<SpeedInteractor>;
}

pub struct DefaultAppContainer {
    clip_interactor: Arc<ClipInteractor>,
    speed_interactor: Arc<SpeedInteractor>,
}

impl DefaultAppContainer {
    /// Wire the production adapters and restore both trackers from the mirror file.
    ///
    /// With `resume_polling`, restored pending jobs resume polling at once, so
    /// this must then be called inside a tokio runtime.
    pub fn new(config: &ClientConfig, resume_polling: bool) -> Result<Self, DomainError> {
        let api_port = Arc::new(HttpClipApiAdapter::new(
            &config.api_base_url,
            config.request_timeout(),
        )?);
        let metadata_port = Arc::new(NoembedAdapter::new(
            &config.metadata_url,
            config.request_timeout(),
        )?);
        let storage_port = Arc::new(FileStorageAdapter::open(config.mirror_path.clone())?);

        Self::with_ports(
            TrackerPorts {
                api: api_port as Arc<dyn ClipApiPort>,
                storage: storage_port as Arc<dyn StoragePort>,
                clock: Arc::new(SystemClockAdapter) as Arc<dyn ClockPort>,
            },
            metadata_port as Arc<dyn VideoMetadataPort>,
            config.tracker_config(),
            resume_polling,
        )
    }

    /// Wire arbitrary ports, e.g. in-memory ones
    pub fn with_ports(
        ports: TrackerPorts,
        metadata_port: Arc<dyn VideoMetadataPort>,
        tracker_config: TrackerConfig,
        resume_polling: bool,
    ) -> Result<Self, DomainError> {
        let restore = if resume_polling {
            TaskTracker::restore
        } else {
            TaskTracker::load
        };
        let clip_tracker = restore(JobKind::Clip, ports.clone(), tracker_config)?;
        let speed_tracker = restore(JobKind::SpeedEdit, ports.clone(), tracker_config)?;

        let clip_interactor = Arc::new(ClipInteractor::new(
            ports.clone(),
            metadata_port,
            clip_tracker,
        ));
        let speed_interactor = Arc::new(SpeedInteractor::new(ports, speed_tracker));

        Ok(Self {
            clip_interactor,
            speed_interactor,
        })
    }

    /// Tracker of a job kind
    pub fn tracker(&self, kind: JobKind) -> &TaskTracker {
        match kind {
            JobKind::Clip => self.clip_interactor.tracker(),
            JobKind::SpeedEdit => self.speed_interactor.tracker(),
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn clip_interactor(&self) -> Arc<ClipInteractor> {
        Arc::clone(&self.clip_interactor)
    }

    fn speed_interactor(&self) -> Arc<SpeedInteractor> {
        Arc::clone(&self.speed_interactor)
    }
}
