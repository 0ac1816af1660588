use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::submission::SubmissionOptions;

const CONFIG_FILE: &str = "config.toml";

/// Default translate endpoint of a locally running service
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/translate";

/// Credential storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Keep credentials on disk between runs
    #[serde(default = "default_true")]
    pub persistent: bool,

    /// Storage database path (defaults to $XDG_DATA_HOME/pdf-client/storage)
    pub path: Option<PathBuf>,
}

const fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persistent: true,
            path: None,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// URL of the service's translate endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Credential storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Where translated documents are saved (defaults to the working directory)
    pub download_dir: Option<PathBuf>,

    /// Interval of the progress estimate in milliseconds
    #[serde(default = "default_progress_tick_ms")]
    pub progress_tick_ms: u64,

    /// Request timeout in seconds (unset = wait for the server indefinitely)
    pub request_timeout_secs: Option<u64>,

    /// Defaults for per-request options
    #[serde(default)]
    pub options: SubmissionOptions,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

const fn default_progress_tick_ms() -> u64 {
    500
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            storage: StorageConfig::default(),
            download_dir: None,
            progress_tick_ms: default_progress_tick_ms(),
            request_timeout_secs: None,
            options: SubmissionOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Config files tried by [`ClientConfig::load`], in order
    pub fn search_paths() -> Vec<PathBuf> {
        let app_dirs = [crate::util::config_dir(), crate::util::data_dir()];
        app_dirs
            .into_iter()
            .flatten()
            .map(|dir| dir.join("pdf-client").join(CONFIG_FILE))
            .chain(std::iter::once(PathBuf::from(CONFIG_FILE)))
            .collect()
    }

    /// Load the first usable file from [`ClientConfig::search_paths`],
    /// falling back to defaults
    pub fn load() -> Self {
        Self::load_first(&Self::search_paths())
    }

    fn load_first(candidates: &[PathBuf]) -> Self {
        for path in candidates.iter().filter(|p| p.is_file()) {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::debug!("Using config {}", path.display());
                    return config;
                }
                // A broken file should not hide the next candidate
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        tracing::debug!("No usable config among {} candidates", candidates.len());
        Self::default()
    }

    pub fn validate(&self) -> Result<(), crate::error::Error> {
        if self.progress_tick_ms == 0 {
            return Err(crate::error::Error::ConfigInvalid {
                field: "progress_tick_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub const fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
