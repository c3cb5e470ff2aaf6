// TOML config adapter - Configuration file loading

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ClipperError, ClipperResult};

/// Settings that may appear in the `[vidclip]` section of a config file.
/// Every field is optional; missing ones fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_base_url: Option<String>,
    pub metadata_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub job_timeout_secs: Option<u64>,
    pub cancel_reset_delay_ms: Option<u64>,
    pub mirror_path: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    vidclip: FileConfig,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    search_paths: Vec<PathBuf>,
}

impl Default for TomlConfigAdapter {
    fn default() -> Self {
        Self {
            search_paths: vec![
                PathBuf::from("vidclip.toml"),
                PathBuf::from("config").join("vidclip.toml"),
            ],
        }
    }
}

impl TomlConfigAdapter {
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Parse a config document
    pub fn parse(content: &str) -> ClipperResult<FileConfig> {
        let document: ConfigDocument = toml::from_str(content)?;
        Ok(document.vidclip)
    }

    /// Load a specific file; it must exist
    pub fn load_file(path: &Path) -> ClipperResult<FileConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| ClipperError::ConfigValue {
            key: "config".to_string(),
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let config = Self::parse(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the explicit file if given, otherwise the first file found on the search path
    pub fn load(&self, explicit: Option<&Path>) -> ClipperResult<Option<FileConfig>> {
        if let Some(path) = explicit {
            return Self::load_file(path).map(Some);
        }
        for path in &self.search_paths {
            if path.exists() {
                return Self::load_file(path).map(Some);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_section() {
        let config = TomlConfigAdapter::parse(
            r#"
            [vidclip]
            api_base_url = "https://clips.example.com"
            job_timeout_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("https://clips.example.com"));
        assert_eq!(config.job_timeout_secs, Some(120));
        assert_eq!(config.mirror_path, None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = TomlConfigAdapter::parse("[vidclip]\napi_url = \"x\"\n").unwrap_err();
        assert!(matches!(err, ClipperError::ConfigError(_)));
    }

    #[test]
    fn test_empty_document_is_all_defaults() {
        assert_eq!(TomlConfigAdapter::parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_search_path_discovery() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vidclip.toml");
        std::fs::write(&path, "[vidclip]\nlog_level = \"debug\"\n").unwrap();

        let missing = TomlConfigAdapter::with_search_paths(vec![dir.path().join("nope.toml")]);
        assert_eq!(missing.load(None).unwrap(), None);

        let found = TomlConfigAdapter::with_search_paths(vec![path]);
        let config = found.load(None).unwrap().unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let adapter = TomlConfigAdapter::default();
        assert!(adapter.load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
