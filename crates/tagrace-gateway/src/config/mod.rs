//! Gateway config loader (strict parsing + env overrides).

pub mod schema;

use std::fs;

use tagrace_core::error::{Result, TagRaceError};

pub use schema::{GatewayConfig, ServerSection};

/// Load config from `path` (or defaults when `None`), then apply environment
/// overrides through `lookup` and validate the result.
pub fn load<F>(path: Option<&str>, lookup: F) -> Result<GatewayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match path {
        Some(p) => load_from_file(p)?,
        None => GatewayConfig::default(),
    };
    cfg.apply_env(lookup)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TagRaceError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| TagRaceError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
