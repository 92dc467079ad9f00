use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{GateError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| GateError::Config(format!("Failed to read config file: {e}")))?;
    let cfg: Config = toml::from_str(&txt)
        .map_err(|e| GateError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.rate_limit.window_secs == 0 {
        return Err(GateError::Config(
            "rate_limit.window_secs must be greater than zero".to_string(),
        ));
    }

    if !cfg.telemetry.metrics_path.starts_with('/') {
        return Err(GateError::Config(format!(
            "telemetry.metrics_path must start with '/': {}",
            cfg.telemetry.metrics_path
        )));
    }

    Ok(())
}
