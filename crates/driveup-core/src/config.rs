//! Configuration module for driveup.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::chunk::{chunk_size_for_multiple, DEFAULT_CHUNK_MULTIPLE};
use crate::usecases::resumable_upload::{UploadOptions, DEFAULT_MAX_RETRIES};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for driveup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upload: UploadConfig,
    pub graph: GraphConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Chunking and retry settings for resumable uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Chunk size expressed in units of 320 KiB.
    pub chunk_size_kib_multiple: u64,
    /// Consecutive failed attempts after which the upload is abandoned.
    pub max_retries: u32,
    /// Milliseconds to wait after a failed attempt before the next one.
    pub retry_delay_ms: u64,
}

/// Microsoft Graph endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Base URL for Graph API requests.
    pub base_url: String,
}

/// Authentication settings.
///
/// driveup does not run an OAuth flow itself; the access token is read from
/// the environment variable named here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Name of the environment variable holding the bearer token.
    pub access_token_env: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/driveup/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("driveup")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size_kib_multiple: DEFAULT_CHUNK_MULTIPLE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: 0,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.microsoft.com/v1.0".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_env: "DRIVEUP_ACCESS_TOKEN".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl UploadConfig {
    /// Effective chunk size in bytes.
    pub fn chunk_size(&self) -> u64 {
        chunk_size_for_multiple(self.chunk_size_kib_multiple)
    }
}

impl From<&UploadConfig> for UploadOptions {
    fn from(config: &UploadConfig) -> Self {
        UploadOptions {
            chunk_size: config.chunk_size(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"upload.max_retries"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Chunks must stay below 60 MiB; 191 * 320 KiB is the largest aligned size that does.
const MAX_CHUNK_MULTIPLE: u64 = 191;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- upload ---
        if self.upload.chunk_size_kib_multiple == 0
            || self.upload.chunk_size_kib_multiple > MAX_CHUNK_MULTIPLE
        {
            errors.push(ValidationError {
                field: "upload.chunk_size_kib_multiple".into(),
                message: format!("must be in range 1..={MAX_CHUNK_MULTIPLE}"),
            });
        }
        if self.upload.max_retries == 0 {
            errors.push(ValidationError {
                field: "upload.max_retries".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- graph ---
        if !(self.graph.base_url.starts_with("https://")
            || self.graph.base_url.starts_with("http://"))
        {
            errors.push(ValidationError {
                field: "graph.base_url".into(),
                message: format!("must be an http(s) URL: '{}'", self.graph.base_url),
            });
        }

        // --- auth ---
        if self.auth.access_token_env.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.access_token_env".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use driveup_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .upload_max_retries(3)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- upload ---

    pub fn upload_chunk_size_kib_multiple(mut self, multiple: u64) -> Self {
        self.config.upload.chunk_size_kib_multiple = multiple;
        self
    }

    pub fn upload_max_retries(mut self, n: u32) -> Self {
        self.config.upload.max_retries = n;
        self
    }

    pub fn upload_retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.upload.retry_delay_ms = ms;
        self
    }

    // --- graph ---

    pub fn graph_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.graph.base_url = url.into();
        self
    }

    // --- auth ---

    pub fn auth_access_token_env(mut self, name: impl Into<String>) -> Self {
        self.config.auth.access_token_env = name.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Consume the builder and return the [`Config`] (no validation).
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::DEFAULT_CHUNK_SIZE;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.upload.chunk_size_kib_multiple, 100);
        assert_eq!(cfg.upload.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(cfg.upload.max_retries, 5);
        assert_eq!(cfg.upload.retry_delay_ms, 0);
        assert_eq!(cfg.graph.base_url, "https://graph.microsoft.com/v1.0");
        assert_eq!(cfg.auth.access_token_env, "DRIVEUP_ACCESS_TOKEN");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
upload:
  chunk_size_kib_multiple: 10
  max_retries: 3
  retry_delay_ms: 250
graph:
  base_url: http://localhost:8080
auth:
  access_token_env: MY_TOKEN
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.upload.chunk_size_kib_multiple, 10);
        assert_eq!(cfg.upload.chunk_size(), 3_276_800);
        assert_eq!(cfg.upload.max_retries, 3);
        assert_eq!(cfg.upload.retry_delay_ms, 250);
        assert_eq!(cfg.graph.base_url, "http://localhost:8080");
        assert_eq!(cfg.auth.access_token_env, "MY_TOKEN");
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"upload:\n  max_retries: 8\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).unwrap();
        assert_eq!(cfg.upload.max_retries, 8);
        assert_eq!(cfg.upload.chunk_size_kib_multiple, 100);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.upload.max_retries, 5);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"upload: [not, a, map").unwrap();
        tmp.flush().unwrap();
        assert!(Config::load(tmp.path()).is_err());
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("driveup/config.yaml"));
    }

    // -- Validation --

    #[test]
    fn validate_catches_bad_chunk_multiple() {
        let cfg = ConfigBuilder::new().upload_chunk_size_kib_multiple(0).build();
        assert!(cfg
            .validate()
            .iter()
            .any(|e| e.field == "upload.chunk_size_kib_multiple"));

        let cfg = ConfigBuilder::new().upload_chunk_size_kib_multiple(192).build();
        assert!(cfg
            .validate()
            .iter()
            .any(|e| e.field == "upload.chunk_size_kib_multiple"));

        let cfg = ConfigBuilder::new().upload_chunk_size_kib_multiple(191).build();
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_catches_zero_max_retries() {
        let cfg = ConfigBuilder::new().upload_max_retries(0).build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upload.max_retries");
    }

    #[test]
    fn validate_catches_bad_base_url_and_token_env() {
        let cfg = ConfigBuilder::new()
            .graph_base_url("graph.microsoft.com")
            .auth_access_token_env(" ")
            .build();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"graph.base_url".to_string()));
        assert!(fields.contains(&"auth.access_token_env".to_string()));
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let cfg = ConfigBuilder::new().logging_level("verbose").build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("verbose"));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let cfg = ConfigBuilder::new().logging_level(*level).build();
            assert!(cfg.validate().is_empty(), "level {level} should be valid");
        }
    }

    // -- Builder --

    #[test]
    fn builder_build_validated() {
        assert!(ConfigBuilder::new().build_validated().is_ok());
        let errors = ConfigBuilder::new()
            .upload_max_retries(0)
            .logging_level("loud")
            .build_validated()
            .unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn upload_options_from_config() {
        let cfg = ConfigBuilder::new()
            .upload_chunk_size_kib_multiple(2)
            .upload_max_retries(7)
            .upload_retry_delay_ms(1500)
            .build();
        let options = UploadOptions::from(&cfg.upload);
        assert_eq!(options.chunk_size, 655_360);
        assert_eq!(options.max_retries, 7);
        assert_eq!(options.retry_delay, Duration::from_millis(1500));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "upload.max_retries".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(err.to_string(), "upload.max_retries: must be greater than 0");
    }
}
