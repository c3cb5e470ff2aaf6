// Adapters - External system implementations

pub mod file_storage;
pub mod http_api;
pub mod memory_storage;
pub mod noembed;
pub mod system_clock;
pub mod toml_config;

// Re-export adapters
pub use file_storage::FileStorageAdapter;
pub use http_api::HttpClipApiAdapter;
pub use memory_storage::MemoryStorageAdapter;
pub use noembed::NoembedAdapter;
pub use system_clock::SystemClockAdapter;
pub use toml_config::{FileConfig, TomlConfigAdapter};
