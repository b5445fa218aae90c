use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional web UI build served for any unmatched route
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the collection JSON documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Root that local episode sources are resolved against
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_content_root() -> PathBuf {
    PathBuf::from("./videos")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            content_root: default_content_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Read size for each body chunk when streaming files
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Value for the `Cache-Control` header on video responses (omitted if unset)
    #[serde(default)]
    pub cache_control: Option<String>,
}

fn default_chunk_size() -> usize {
    64 * 1024
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            cache_control: None,
        }
    }
}
