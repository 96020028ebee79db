//! Application settings, read from `settings.toml` in the app config directory.
//!
//! ```toml
//! [upload]
//! endpoint = "http://localhost:5000/upload"
//! field_name = "file"
//! chunk_size = 65536
//! timeout_secs = 120
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_FILENAME: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upload: UploadSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Analysis service upload URL.
    pub endpoint: String,
    /// Multipart field carrying the file.
    pub field_name: String,
    /// Body chunk size in bytes; one progress event per chunk.
    pub chunk_size: usize,
    /// Whole-request timeout. No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/upload".to_string(),
            field_name: "file".to_string(),
            chunk_size: 64 * 1024,
            timeout_secs: None,
        }
    }
}

/// Load settings from `config_dir`, falling back to defaults when the file
/// is missing or unreadable.
pub fn load_config(config_dir: &Path) -> AppConfig {
    let config_path = config_dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return AppConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                debug!("Loaded settings from {:?}", config_path);
                config
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                AppConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            AppConfig::default()
        }
    }
}
