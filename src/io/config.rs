// src/io/config.rs

use crate::error::ConfigError;
use crate::simulation::config::SimulationConfig;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Loads and validates a JSON configuration. Missing fields take defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimulationConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parses and validates a JSON configuration string.
pub fn parse_config(text: &str) -> Result<SimulationConfig, ConfigError> {
    let config: SimulationConfig = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
}
