use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use tagrace_core::error::{Result, TagRaceError};
use tagrace_store::StoreConfig;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerSection::default(),
            store: StoreConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TagRaceError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.store.validate()?;
        Ok(())
    }

    /// `PORT` replaces the listen port; store variables go to the store section.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| TagRaceError::Config(format!("invalid PORT {port:?}: {e}")))?;
            let mut addr = self.server.listen_addr()?;
            addr.set_port(port);
            self.server.listen = addr.to_string();
        }
        self.store.apply_env(lookup)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Cap on reading a request body.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Cap on one streaming response (session lifetime).
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Lines buffered per session before the ticker waits on the client.
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            read_timeout_ms: default_read_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_body_bytes: default_max_body_bytes(),
            session_buffer: default_session_buffer(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(10..=60_000).contains(&self.poll_interval_ms) {
            return Err(TagRaceError::Config(
                "server.poll_interval_ms must be between 10 and 60000".into(),
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(TagRaceError::Config("server.read_timeout_ms must be > 0".into()));
        }
        if self.write_timeout_ms < self.poll_interval_ms {
            return Err(TagRaceError::Config(
                "server.write_timeout_ms must be >= poll_interval_ms".into(),
            ));
        }
        if self.max_body_bytes == 0 || self.session_buffer == 0 {
            return Err(TagRaceError::Config(
                "server.max_body_bytes and server.session_buffer must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| TagRaceError::Config(format!("server.listen {:?}: {e}", self.listen)))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_version() -> u32 {
    1
}
fn default_listen() -> String {
    "0.0.0.0:3333".into()
}
fn default_read_timeout_ms() -> u64 {
    5_000
}
fn default_write_timeout_ms() -> u64 {
    300_000
}
fn default_poll_interval_ms() -> u64 {
    250
}
fn default_max_body_bytes() -> usize {
    4096
}
fn default_session_buffer() -> usize {
    16
}
