//! Run configuration.
//!
//! Loaded from an optional TOML file; the CLI then overrides individual fields.
//!
//! ```toml
//! root_directory = "/src/elasticsearch"
//! scan_path = "server/src/main/java/org/elasticsearch"
//! service_endpoint = "localhost:7000"
//! output_path = "elasticsearchSettings.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::java::{DEFAULT_FILE_EXTENSION, DEFAULT_PROPERTY_ANCHOR, DEFAULT_SETTING_TYPE};
use crate::error::ConfigError;
use crate::infrastructure::RetryPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Json,
    JsonPretty,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// `host:port` of the parsing service. Unset means trees are read from JSON files.
    pub service_endpoint: Option<String>,
    /// Provenance paths are relative to this directory.
    pub root_directory: PathBuf,
    /// Sub-path of `root_directory` to walk; the whole root when unset.
    pub scan_path: Option<PathBuf>,
    pub file_extension: String,
    /// `-` writes to stdout.
    pub output_path: String,
    pub setting_type_name: String,
    pub property_anchor_name: String,
    /// Directory of pre-exported trees mirroring `root_directory`.
    pub tree_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    /// `1` runs sequentially, `0` picks a worker count from the CPU count.
    pub jobs: usize,
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub timeout_ms: u64,
    /// Abort on the first file whose tree cannot be obtained.
    pub fail_fast: bool,
    pub format: OutputFormat,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            service_endpoint: None,
            root_directory: PathBuf::from("."),
            scan_path: None,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            output_path: "settings.json".to_string(),
            setting_type_name: DEFAULT_SETTING_TYPE.to_string(),
            property_anchor_name: DEFAULT_PROPERTY_ANCHOR.to_string(),
            tree_dir: None,
            cache_dir: None,
            jobs: 1,
            retries: 3,
            retry_backoff_ms: 200,
            timeout_ms: 30_000,
            fail_fast: false,
            format: OutputFormat::Json,
        }
    }
}

impl ExtractorConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, or the given file when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check invariants and normalize the extension filter to `.ext`.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.setting_type_name.trim().is_empty() {
            return Err(ConfigError::Invalid("setting_type_name must not be empty".to_string()));
        }
        if self.property_anchor_name.trim().is_empty() {
            return Err(ConfigError::Invalid("property_anchor_name must not be empty".to_string()));
        }
        let extension = self.file_extension.trim().trim_start_matches('.');
        if extension.is_empty() {
            return Err(ConfigError::Invalid("file_extension must not be empty".to_string()));
        }
        self.file_extension = format!(".{}", extension);
        if self.output_path.trim().is_empty() {
            return Err(ConfigError::Invalid("output_path must not be empty".to_string()));
        }
        if let Some(endpoint) = &self.service_endpoint {
            if !endpoint.contains(':') {
                return Err(ConfigError::Invalid(format!(
                    "service_endpoint must be host:port, got `{}`",
                    endpoint
                )));
            }
        }
        Ok(self)
    }

    /// Directory or file that is actually walked.
    pub fn scan_root(&self) -> PathBuf {
        match &self.scan_path {
            Some(sub) => self.root_directory.join(sub),
            None => self.root_directory.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
