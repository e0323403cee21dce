// crates/bucketeer-mcp-config/src/config.rs
// ============================================================================
// Module: Bucketeer MCP Configuration
// Description: Configuration loading and validation for Bucketeer MCP.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is read from an optional TOML file and then overlaid with
//! environment variables, which always win. The merged result is validated
//! as a whole and every violation is reported together, one line per field.
//! Missing required settings fail closed so the server never starts without
//! a host and an API key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename probed in the working directory.
const DEFAULT_CONFIG_NAME: &str = "bucketeer-mcp.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "BUCKETEER_MCP_CONFIG";
/// Environment variable carrying the remote host.
pub const HOST_ENV_VAR: &str = "BUCKETEER_HOST";
/// Environment variable carrying the API key.
pub const API_KEY_ENV_VAR: &str = "BUCKETEER_API_KEY";
/// Environment variable carrying the default environment id.
pub const ENVIRONMENT_ENV_VAR: &str = "BUCKETEER_ENVIRONMENT_ID";
/// Environment variable carrying the log level.
pub const LOG_LEVEL_ENV_VAR: &str = "LOG_LEVEL";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default outbound request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Minimum outbound request timeout in milliseconds.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 1_000;
/// Maximum outbound request timeout in milliseconds.
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;
/// Default maximum inbound message size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Minimum inbound message size limit in bytes.
pub const MIN_MAX_BODY_BYTES: usize = 1024;
/// Maximum inbound message size limit in bytes.
pub const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level Bucketeer MCP configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketeerMcpConfig {
    /// Remote service settings.
    #[serde(default)]
    pub bucketeer: BucketeerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Protocol server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// File the configuration was read from, if any (not serialized).
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl BucketeerMcpConfig {
    /// Loads configuration from the resolved file and process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| env::var(name).ok())
    }

    /// Loads configuration using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match resolve_path(path, &lookup) {
            Some(resolved) => Self::read_file(&resolved)?,
            None => Self::default(),
        };
        config.apply_env(&lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration file without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Overlays non-empty environment values onto the configuration.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());
        if let Some(host) = read(HOST_ENV_VAR) {
            self.bucketeer.host = host;
        }
        if let Some(api_key) = read(API_KEY_ENV_VAR) {
            self.bucketeer.api_key = api_key;
        }
        if let Some(environment_id) = read(ENVIRONMENT_ENV_VAR) {
            self.bucketeer.environment_id = Some(environment_id);
        }
        if let Some(level) = read(LOG_LEVEL_ENV_VAR) {
            self.logging.level = level;
        }
    }

    /// Validates the configuration, normalizing empty optional values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] listing every violation.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let mut violations = Vec::new();
        self.bucketeer.validate(&mut violations);
        self.logging.validate(&mut violations);
        self.server.validate(&mut violations);
        if violations.is_empty() { Ok(()) } else { Err(ConfigError::Validation(violations)) }
    }
}

/// Remote feature-flag service settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketeerConfig {
    /// Bare host name, optionally with port.
    pub host: String,
    /// Static API key sent in the `Authorization` header.
    pub api_key: String,
    /// Default environment id for calls that do not name one.
    pub environment_id: Option<String>,
    /// Outbound request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for BucketeerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            api_key: String::new(),
            environment_id: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl fmt::Debug for BucketeerConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BucketeerConfig")
            .field("host", &self.host)
            .field("api_key", &"<redacted>")
            .field("environment_id", &self.environment_id)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl BucketeerConfig {
    /// Returns the service base URL.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}", self.host)
    }

    /// Returns the outbound request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Collects service setting violations.
    fn validate(&mut self, violations: &mut Vec<ConfigViolation>) {
        if self.environment_id.as_deref().is_some_and(str::is_empty) {
            self.environment_id = None;
        }
        let host = self.host.trim();
        if host.is_empty() {
            violations.push(ConfigViolation::new(
                "bucketeer.host",
                format!("{HOST_ENV_VAR} is required"),
            ));
        } else if host.contains("://") {
            violations.push(ConfigViolation::new(
                "bucketeer.host",
                "must be a bare host without a scheme",
            ));
        } else if host.contains('/') || host.contains(char::is_whitespace) {
            violations.push(ConfigViolation::new(
                "bucketeer.host",
                "must be a bare host without a path",
            ));
        }
        if self.api_key.is_empty() {
            violations.push(ConfigViolation::new(
                "bucketeer.api_key",
                format!("{API_KEY_ENV_VAR} is required"),
            ));
        }
        if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            violations.push(ConfigViolation::new(
                "bucketeer.request_timeout_ms",
                format!("must be between {MIN_REQUEST_TIMEOUT_MS} and {MAX_REQUEST_TIMEOUT_MS}"),
            ));
        }
    }
}

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational events.
    #[default]
    Info,
    /// Debug detail.
    Debug,
}

impl LogLevel {
    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Parses a lowercase label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level label; validated against [`LogLevel`].
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info.as_str().to_string(),
        }
    }
}

impl LoggingConfig {
    /// Returns the validated level, falling back to `info`.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        LogLevel::parse(&self.level).unwrap_or_default()
    }

    /// Collects logging violations.
    fn validate(&self, violations: &mut Vec<ConfigViolation>) {
        if LogLevel::parse(&self.level).is_none() {
            violations.push(ConfigViolation::new(
                "logging.level",
                format!("must be one of error, warn, info, debug (got {})", self.level),
            ));
        }
    }
}

/// Protocol server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Maximum inbound message size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Collects server violations.
    fn validate(&self, violations: &mut Vec<ConfigViolation>) {
        if !(MIN_MAX_BODY_BYTES..=MAX_MAX_BODY_BYTES).contains(&self.max_body_bytes) {
            violations.push(ConfigViolation::new(
                "server.max_body_bytes",
                format!("must be between {MIN_MAX_BODY_BYTES} and {MAX_MAX_BODY_BYTES}"),
            ));
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// A single configuration field violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    /// Dotted field path.
    pub field: String,
    /// Description of the problem.
    pub message: String,
}

impl ConfigViolation {
    /// Creates a violation.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration file.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Field-level validation failures.
    #[error("{}", render_violations(.0))]
    Validation(Vec<ConfigViolation>),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI, environment, or the default file.
fn resolve_path(path: Option<&Path>, lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(path) = path {
        return Some(path.to_path_buf());
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(env_path));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_NAME);
    fallback.is_file().then_some(fallback)
}

/// Renders violations as a header line followed by one line per field.
fn render_violations(violations: &[ConfigViolation]) -> String {
    let mut rendered = String::from("Configuration validation error:");
    for violation in violations {
        rendered.push_str("\n  - ");
        rendered.push_str(&violation.field);
        rendered.push_str(": ");
        rendered.push_str(&violation.message);
    }
    rendered
}
