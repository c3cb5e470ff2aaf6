//! Configuration initialization and hierarchy management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::{FileConfig, TomlConfigAdapter};
use crate::app::TrackerConfig;
use crate::cli::Cli;
use crate::error::{ClipperError, ClipperResult};
use crate::utils::logging::{LogFormat, LogLevel, LoggingConfig};

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub metadata_url: String,
    pub request_timeout_secs: u64,
    pub job_timeout_secs: u64,
    pub cancel_reset_delay_ms: u64,
    pub mirror_path: PathBuf,
    pub download_dir: PathBuf,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            metadata_url: "https://noembed.com/embed".to_string(),
            request_timeout_secs: 30,
            job_timeout_secs: 300,
            cancel_reset_delay_ms: 1000,
            mirror_path: PathBuf::from("vidclip_session.json"),
            download_dir: PathBuf::from("."),
            log_level: LogLevel::Info,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            timeout: Duration::from_secs(self.job_timeout_secs),
            cancel_reset_delay: Duration::from_millis(self.cancel_reset_delay_ms),
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level,
            format: self.log_format,
            ..LoggingConfig::default()
        }
    }

    /// Overlay the values present in a config file
    fn apply_file(&mut self, file: FileConfig) -> ClipperResult<()> {
        if let Some(url) = file.api_base_url {
            self.api_base_url = url;
        }
        if let Some(url) = file.metadata_url {
            self.metadata_url = url;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = file.job_timeout_secs {
            self.job_timeout_secs = secs;
        }
        if let Some(ms) = file.cancel_reset_delay_ms {
            self.cancel_reset_delay_ms = ms;
        }
        if let Some(path) = file.mirror_path {
            self.mirror_path = path;
        }
        if let Some(dir) = file.download_dir {
            self.download_dir = dir;
        }
        if let Some(level) = file.log_level {
            self.log_level = LogLevel::parse(&level)?;
        }
        if let Some(format) = file.log_format {
            self.log_format = LogFormat::parse(&format)?;
        }
        Ok(())
    }

    /// Overlay `VIDCLIP_*` variables supplied by `lookup`
    fn apply_env<F>(&mut self, lookup: F) -> ClipperResult<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = 0;

        if let Some(url) = lookup("VIDCLIP_API_BASE_URL") {
            self.api_base_url = url;
            overrides += 1;
        }
        if let Some(url) = lookup("VIDCLIP_METADATA_URL") {
            self.metadata_url = url;
            overrides += 1;
        }
        if let Some(raw) = lookup("VIDCLIP_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("request_timeout_secs", &raw)?;
            overrides += 1;
        }
        if let Some(raw) = lookup("VIDCLIP_JOB_TIMEOUT_SECS") {
            self.job_timeout_secs = parse_number("job_timeout_secs", &raw)?;
            overrides += 1;
        }
        if let Some(raw) = lookup("VIDCLIP_CANCEL_RESET_DELAY_MS") {
            self.cancel_reset_delay_ms = parse_number("cancel_reset_delay_ms", &raw)?;
            overrides += 1;
        }
        if let Some(path) = lookup("VIDCLIP_MIRROR_PATH") {
            self.mirror_path = PathBuf::from(path);
            overrides += 1;
        }
        if let Some(dir) = lookup("VIDCLIP_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
            overrides += 1;
        }
        if let Some(level) = lookup("VIDCLIP_LOG_LEVEL") {
            self.log_level = LogLevel::parse(&level)?;
            overrides += 1;
        }
        if let Some(format) = lookup("VIDCLIP_LOG_FORMAT") {
            self.log_format = LogFormat::parse(&format)?;
            overrides += 1;
        }

        Ok(overrides)
    }

    /// Overlay global command-line options
    fn apply_cli(&mut self, cli: &Cli) -> ClipperResult<usize> {
        let mut overrides = 0;

        if let Some(url) = &cli.api_base_url {
            self.api_base_url = url.clone();
            overrides += 1;
        }
        if let Some(path) = &cli.mirror {
            self.mirror_path = path.clone();
            overrides += 1;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::parse(level)?;
            overrides += 1;
        }
        if let Some(format) = &cli.log_format {
            self.log_format = LogFormat::parse(format)?;
            overrides += 1;
        }

        Ok(overrides)
    }

    /// Reject values no client could work with
    pub fn validate(&self) -> ClipperResult<()> {
        for (key, value) in [
            ("api_base_url", &self.api_base_url),
            ("metadata_url", &self.metadata_url),
        ] {
            url::Url::parse(value).map_err(|e| ClipperError::ConfigValue {
                key: key.to_string(),
                message: format!("{} is not a valid URL: {}", value, e),
            })?;
        }
        for (key, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("job_timeout_secs", self.job_timeout_secs),
        ] {
            if value == 0 {
                return Err(ClipperError::ConfigValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> ClipperResult<u64> {
    raw.trim().parse().map_err(|_| ClipperError::ConfigValue {
        key: key.to_string(),
        message: format!("{} is not a whole number", raw),
    })
}

/// Resolve configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> ClipperResult<ClientConfig> {
    resolve(cli, &TomlConfigAdapter::default(), |key| std::env::var(key).ok())
}

fn resolve<F>(cli: &Cli, files: &TomlConfigAdapter, env: F) -> ClipperResult<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ClientConfig::default();

    match files.load(cli.config.as_deref())? {
        Some(file) => config.apply_file(file)?,
        None => debug!("No configuration file found, using defaults"),
    }

    let env_overrides = config.apply_env(env)?;
    if env_overrides > 0 {
        info!("Applied {} environment variable overrides", env_overrides);
    }

    let cli_overrides = config.apply_cli(cli)?;
    if cli_overrides > 0 {
        debug!("Applied {} CLI configuration overrides", cli_overrides);
    }

    config.validate()?;
    Ok(config)
}
