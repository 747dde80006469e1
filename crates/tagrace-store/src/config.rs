//! Store connection settings.
//!
//! Resolution order: YAML section (or defaults), then a platform service
//! binding document (`VCAP_SERVICES`), then explicit `REDIS_*` variables.

use serde::Deserialize;
use serde_json::Value;
use tagrace_core::{Result, TagRaceError};

/// Name of the bound redis service looked up in `VCAP_SERVICES`.
pub const DEFAULT_SERVICE_NAME: &str = "twitterboat_redis";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub db: i64,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: String::new(),
            db: 0,
            service_name: default_service_name(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(TagRaceError::Config("store.host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(TagRaceError::Config("store.port must not be 0".into()));
        }
        if self.db < 0 {
            return Err(TagRaceError::Config("store.db must not be negative".into()));
        }
        Ok(())
    }

    /// Apply environment overrides through `lookup` (usually `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(vcap) = lookup("VCAP_SERVICES") {
            self.apply_service_bindings(&vcap)?;
        }
        if let Some(host) = lookup("REDIS_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("REDIS_PORT") {
            self.port = parse_port(&port)?;
        }
        if let Some(password) = lookup("REDIS_PASSWORD") {
            self.password = password;
        }
        Ok(())
    }

    /// Take credentials from the service named `service_name` in a
    /// `VCAP_SERVICES` document. A document without that service is an error.
    pub fn apply_service_bindings(&mut self, vcap: &str) -> Result<()> {
        let doc: Value = serde_json::from_str(vcap)
            .map_err(|e| TagRaceError::Config(format!("invalid VCAP_SERVICES: {e}")))?;

        let creds = doc
            .as_object()
            .into_iter()
            .flat_map(|m| m.values())
            .filter_map(|v| v.as_array())
            .flatten()
            .find(|svc| svc.get("name").and_then(Value::as_str) == Some(self.service_name.as_str()))
            .and_then(|svc| svc.get("credentials"))
            .ok_or_else(|| {
                TagRaceError::Config(format!("no bound service named {}", self.service_name))
            })?;

        if let Some(host) = creds
            .get("hostname")
            .or_else(|| creds.get("host"))
            .and_then(Value::as_str)
        {
            self.host = host.to_string();
        }
        match creds.get("port") {
            Some(Value::String(s)) => self.port = parse_port(s)?,
            Some(Value::Number(n)) => {
                self.port = n
                    .as_u64()
                    .and_then(|p| u16::try_from(p).ok())
                    .ok_or_else(|| TagRaceError::Config(format!("invalid port: {n}")))?;
            }
            _ => {}
        }
        if let Some(password) = creds.get("password").and_then(Value::as_str) {
            self.password = password.to_string();
        }
        Ok(())
    }
}

fn parse_port(s: &str) -> Result<u16> {
    s.trim()
        .parse::<u16>()
        .map_err(|e| TagRaceError::Config(format!("invalid port {s:?}: {e}")))
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    6379
}
fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.into()
}
