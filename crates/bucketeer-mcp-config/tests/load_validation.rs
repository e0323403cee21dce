// crates/bucketeer-mcp-config/tests/load_validation.rs
// =============================================================================
// Module: Config Loading and Validation Tests
// Description: File loading, environment overrides, and field validation.
// Purpose: Ensure startup fails closed with a field-by-field message.
// =============================================================================

//! Config loading and validation tests for bucketeer-mcp-config.

#![allow(clippy::use_debug, reason = "Debug formatting is asserted for redaction.")]

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use bucketeer_mcp_config::BucketeerMcpConfig;
use bucketeer_mcp_config::ConfigError;
use bucketeer_mcp_config::LogLevel;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

/// Builds an environment lookup over fixed pairs.
fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |name| map.get(name).cloned()
}

/// Writes `contents` to a temporary TOML file.
fn temp_config(contents: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(contents.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

/// Asserts that `result` failed with a message containing `needle`.
fn assert_invalid(result: Result<BucketeerMcpConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn environment_only_config_validates_with_defaults() -> TestResult {
    let config = BucketeerMcpConfig::load_with(
        None,
        env_of(&[("BUCKETEER_HOST", "api.example.io"), ("BUCKETEER_API_KEY", "secret")]),
    )
    .map_err(|err| err.to_string())?;
    if config.bucketeer.base_url() != "https://api.example.io" {
        return Err(format!("unexpected base url {}", config.bucketeer.base_url()));
    }
    if config.bucketeer.request_timeout() != Duration::from_secs(30) {
        return Err("default timeout should be 30 seconds".to_string());
    }
    if config.logging.level() != LogLevel::Info {
        return Err("default log level should be info".to_string());
    }
    if config.bucketeer.environment_id.is_some() {
        return Err("environment should be unset".to_string());
    }
    Ok(())
}

#[test]
fn missing_required_settings_are_reported_together() -> TestResult {
    let result = BucketeerMcpConfig::load_with(None, env_of(&[("LOG_LEVEL", "verbose")]));
    let Err(error) = result else {
        return Err("expected invalid config".to_string());
    };
    let message = error.to_string();
    let expected = [
        "Configuration validation error:",
        "  - bucketeer.host: BUCKETEER_HOST is required",
        "  - bucketeer.api_key: BUCKETEER_API_KEY is required",
        "  - logging.level: must be one of error, warn, info, debug (got verbose)",
    ];
    let lines: Vec<&str> = message.lines().collect();
    if lines != expected {
        return Err(format!("unexpected message:\n{message}"));
    }
    Ok(())
}

#[test]
fn environment_overrides_file_values() -> TestResult {
    let file = temp_config(
        r#"
[bucketeer]
host = "file.example.io"
api_key = "file-key"
environment_id = "staging"
request_timeout_ms = 5000

[logging]
level = "warn"

[server]
max_body_bytes = 4096
"#,
    )?;
    let config = BucketeerMcpConfig::load_with(
        Some(file.path()),
        env_of(&[("BUCKETEER_HOST", "env.example.io"), ("BUCKETEER_ENVIRONMENT_ID", "")]),
    )
    .map_err(|err| err.to_string())?;
    if config.bucketeer.host != "env.example.io" {
        return Err("environment host should win".to_string());
    }
    if config.bucketeer.api_key != "file-key" {
        return Err("file api key should be kept".to_string());
    }
    if config.bucketeer.environment_id.as_deref() != Some("staging") {
        return Err("empty environment variable should not clear file value".to_string());
    }
    if config.logging.level() != LogLevel::Warn || config.server.max_body_bytes != 4096 {
        return Err("file settings should be applied".to_string());
    }
    if config.source.as_deref() != Some(file.path()) {
        return Err("source path should be recorded".to_string());
    }
    Ok(())
}

#[test]
fn config_path_can_come_from_environment() -> TestResult {
    let file = temp_config("[bucketeer]\nhost = \"h.example.io\"\napi_key = \"k\"\n")?;
    let path = file.path().to_string_lossy().to_string();
    let config = BucketeerMcpConfig::load_with(None, env_of(&[("BUCKETEER_MCP_CONFIG", path.as_str())]))
        .map_err(|err| err.to_string())?;
    if config.bucketeer.host != "h.example.io" {
        return Err("config file from environment path should load".to_string());
    }
    Ok(())
}

#[test]
fn host_with_scheme_or_path_is_rejected() -> TestResult {
    assert_invalid(
        BucketeerMcpConfig::load_with(
            None,
            env_of(&[("BUCKETEER_HOST", "https://api.example.io"), ("BUCKETEER_API_KEY", "k")]),
        ),
        "bucketeer.host: must be a bare host without a scheme",
    )?;
    assert_invalid(
        BucketeerMcpConfig::load_with(
            None,
            env_of(&[("BUCKETEER_HOST", "api.example.io/v1"), ("BUCKETEER_API_KEY", "k")]),
        ),
        "bucketeer.host: must be a bare host without a path",
    )
}

#[test]
fn out_of_range_limits_are_rejected() -> TestResult {
    let file = temp_config(
        "[bucketeer]\nhost = \"h\"\napi_key = \"k\"\nrequest_timeout_ms = 10\n\n[server]\nmax_body_bytes = 1\n",
    )?;
    let result = BucketeerMcpConfig::load_with(Some(file.path()), env_of(&[]));
    assert_invalid(result, "bucketeer.request_timeout_ms: must be between 1000 and 120000")?;
    let result = BucketeerMcpConfig::load_with(Some(file.path()), env_of(&[]));
    assert_invalid(result, "server.max_body_bytes: must be between 1024 and 16777216")
}

#[test]
fn malformed_and_missing_files_fail() -> TestResult {
    let file = temp_config("[bucketeer\nhost = ")?;
    assert_invalid(BucketeerMcpConfig::load_with(Some(file.path()), env_of(&[])), "config parse error")?;
    assert_invalid(
        BucketeerMcpConfig::load_with(Some(Path::new("/nonexistent/bucketeer-mcp.toml")), env_of(&[])),
        "config io error",
    )
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xff, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(
        BucketeerMcpConfig::load_with(Some(file.path()), env_of(&[])),
        "config file must be utf-8",
    )
}

#[test]
fn debug_output_redacts_api_key() -> TestResult {
    let config = BucketeerMcpConfig::load_with(
        None,
        env_of(&[("BUCKETEER_HOST", "h.example.io"), ("BUCKETEER_API_KEY", "super-secret")]),
    )
    .map_err(|err| err.to_string())?;
    let rendered = format!("{config:?}");
    if rendered.contains("super-secret") || !rendered.contains("<redacted>") {
        return Err(format!("api key leaked: {rendered}"));
    }
    Ok(())
}
