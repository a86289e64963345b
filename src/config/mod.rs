//! Configuration management for mergefeeds.
//!
//! Settings are read from `~/.config/mergefeeds/config.toml` unless a path is
//! given on the command line. If the default file doesn't exist, it is created
//! with comments. Endpoints (base URLs and tokens) live in a separate JSON file,
//! see [`endpoints`].

pub mod endpoints;

pub use endpoints::load_endpoints;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

/// HTTP retry, timeout and debug-throttling settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per fetch call before giving up (default: 3)
    pub max_attempts: u32,

    /// Backoff unit; the wait before attempt n+1 is `n * backoff_base_ms` (default: 250)
    pub backoff_base_ms: u64,

    /// Deadline for a single attempt, in seconds (default: 120)
    pub attempt_timeout_secs: u64,

    /// Outer safety timeout on the HTTP client, in seconds (default: 350)
    pub client_timeout_secs: u64,

    /// Delay before every call when `slow_mode` is set, in milliseconds (default: 1000)
    pub slow_delay_ms: u64,

    /// Only one HTTP call in flight across all feeds (debug aid)
    pub serialize_requests: bool,

    /// Sleep `slow_delay_ms` before every call
    pub slow_mode: bool,

    /// Skip TLS certificate verification
    pub insecure: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 250,
            attempt_timeout_secs: 120,
            client_timeout_secs: 350,
            slow_delay_ms: 1000,
            serialize_requests: false,
            slow_mode: false,
            insecure: false,
        }
    }
}

impl FetchConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    /// Delay to apply before each call. Serialized mode takes precedence over
    /// slow mode, so the two never stack.
    pub fn slow_delay(&self) -> Option<Duration> {
        if self.slow_mode && !self.serialize_requests {
            Some(Duration::from_millis(self.slow_delay_ms))
        } else {
            None
        }
    }
}

/// Pipeline shape: what to request, how to dedup, channel sizes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Appended to every endpoint's base URL to form the first page URL
    pub path_suffix: String,

    /// JSON field holding a record's identity (default: "id")
    pub identity_field: String,

    /// Successful pages per feed before stopping; 0 means no limit
    pub max_pages: usize,

    pub page_channel_capacity: usize,
    pub error_channel_capacity: usize,
    pub output_channel_capacity: usize,

    /// Log per-feed page counts and the duplicate report at the end of a run
    pub diagnostics: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            path_suffix: "den/cpo/1.0/locations/?limit=1000&offset=0".to_string(),
            identity_field: "id".to_string(),
            max_pages: 0,
            page_channel_capacity: 16,
            error_channel_capacity: 4,
            output_channel_capacity: 32,
            diagnostics: false,
        }
    }
}

impl PipelineConfig {
    pub fn max_pages(&self) -> Option<usize> {
        (self.max_pages > 0).then_some(self.max_pages)
    }
}

/// Where the artifacts go.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub records_file: String,
    pub errors_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".output"),
            records_file: "stations.json".to_string(),
            errors_file: "error.log".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn records_path(&self) -> PathBuf {
        self.dir.join(&self.records_file)
    }

    pub fn errors_path(&self) -> PathBuf {
        self.dir.join(&self.errors_file)
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// An explicit path must exist. A missing default file is created with
    /// comments and the defaults are returned. Missing fields use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        Self::from_file(&config_path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/mergefeeds/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("mergefeeds").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# mergefeeds configuration
#
# Command-line flags override these values.

[fetch]
# Attempts per page before the feed reports an error
max_attempts = 3

# Wait before attempt n+1 is n * backoff_base_ms
backoff_base_ms = 250

# Deadline for one attempt (seconds)
attempt_timeout_secs = 120

# Outer HTTP client timeout (seconds)
client_timeout_secs = 350

# Debug aids: one request at a time, or a fixed pause before each request
serialize_requests = false
slow_mode = false
slow_delay_ms = 1000

# Skip TLS certificate verification (dangerous)
insecure = false

[pipeline]
# Appended to each endpoint's baseUrl
path_suffix = "den/cpo/1.0/locations/?limit=1000&offset=0"

# Field used to detect the same record across feeds
identity_field = "id"

# Stop each feed after this many pages (0 = no limit)
max_pages = 0

page_channel_capacity = 16
error_channel_capacity = 4
output_channel_capacity = 32

# Log per-feed counts and duplicate identities when the run ends
diagnostics = false

[output]
dir = ".output"
records_file = "stations.json"
errors_file = "error.log"
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse endpoints file at {path}: {source}")]
    Endpoints {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
