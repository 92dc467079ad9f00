use std::io::Write;

use muninn_gate_lib::config::load_from_path;
use tempfile::NamedTempFile;

#[test]
fn test_config_loads_valid_file() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
listen = "127.0.0.1:0"

[rate_limit]
max_requests = 5
window_secs = 30
"#
    )?;

    let config = load_from_path(file.path())?;
    assert_eq!(config.listen.to_string(), "127.0.0.1:0");
    assert_eq!(config.rate_limit.max_requests, 5);
    assert_eq!(config.rate_limit.window_secs, 30);

    Ok(())
}

#[test]
fn test_config_applies_defaults_for_missing_sections(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, r#"listen = "127.0.0.1:0""#)?;

    let config = load_from_path(file.path())?;
    assert_eq!(config.rate_limit.max_requests, 100);
    assert_eq!(config.rate_limit.window_secs, 60);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.timeout.shutdown_secs, 30);
    assert_eq!(config.telemetry.metrics_path, "/metrics");

    Ok(())
}

#[test]
fn test_config_rejects_zero_window() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
listen = "127.0.0.1:0"

[rate_limit]
window_secs = 0
"#
    )?;

    let err = load_from_path(file.path()).expect_err("zero window must be rejected");
    assert!(err.to_string().contains("window_secs"));

    Ok(())
}

#[test]
fn test_config_rejects_relative_metrics_path(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
listen = "127.0.0.1:0"

[telemetry]
metrics_path = "metrics"
"#
    )?;

    let err = load_from_path(file.path()).expect_err("relative metrics path must be rejected");
    assert!(err.to_string().contains("metrics_path"));

    Ok(())
}

#[test]
fn test_config_missing_file_is_an_error() {
    let err = load_from_path("/nonexistent/muninn-gate.toml")
        .expect_err("missing file must be an error");
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_config_zero_max_requests_is_accepted() -> Result<(), Box<dyn std::error::Error + Send + Sync>>
{
    // A zero limit is a valid (if harsh) configuration; each client still
    // gets its first request through.
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
listen = "127.0.0.1:0"

[rate_limit]
max_requests = 0
"#
    )?;

    let config = load_from_path(file.path())?;
    assert_eq!(config.rate_limit.max_requests, 0);

    Ok(())
}
