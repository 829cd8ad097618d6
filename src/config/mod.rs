//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<TonematchConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {:?}", path))?;
    let config: TonematchConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config: {:?}", path))?;
    config.validate()?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the built-in defaults
pub fn load_or_default(path: &Path) -> Result<TonematchConfig> {
    if path.exists() {
        load_config(path)
    } else {
        debug!(?path, "config file not found; using defaults");
        Ok(TonematchConfig::default())
    }
}
