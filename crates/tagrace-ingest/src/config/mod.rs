//! Ingest config loader (strict parsing + env overrides).

pub mod schema;

use std::fs;

use tagrace_core::error::{Result, TagRaceError};

pub use schema::{Credentials, IngestConfig, StreamSection, WatchSection};

/// Load config from `path` (or defaults when `None`), then apply environment
/// overrides through `lookup` and validate the result.
pub fn load<F>(path: Option<&str>, lookup: F) -> Result<IngestConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match path {
        Some(p) => load_from_file(p)?,
        None => IngestConfig::default(),
    };
    cfg.apply_env(lookup)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<IngestConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TagRaceError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

/// Parse without validating: watch tags and credentials usually come from the
/// environment afterwards.
pub fn load_from_str(s: &str) -> Result<IngestConfig> {
    serde_yaml::from_str(s).map_err(|e| TagRaceError::Config(format!("invalid yaml: {e}")))
}
