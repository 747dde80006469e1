use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tagrace_core::error::{Result, TagRaceError};
use tagrace_core::WatchList;
use tagrace_store::StoreConfig;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub stream: StreamSection,

    #[serde(default)]
    pub store: StoreConfig,

    /// Environment only, never read from the file.
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            watch: WatchSection::default(),
            stream: StreamSection::default(),
            store: StoreConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TagRaceError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.watch_list()?;
        self.stream.validate()?;
        self.store.validate()?;
        self.credentials.validate()
    }

    /// Normalized watch list; empty or colliding tags are config errors.
    pub fn watch_list(&self) -> Result<WatchList> {
        WatchList::new(&self.watch.tags)
            .map_err(|e| TagRaceError::Config(format!("watch.tags: {e}")))
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(keys) = lookup("WATCH_KEYS") {
            self.watch.tags = keys
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }
        let creds = &mut self.credentials;
        for (var, slot) in [
            ("TWITTER_CONSUMER_KEY", &mut creds.consumer_key),
            ("TWITTER_CONSUMER_SECRET", &mut creds.consumer_secret),
            ("TWITTER_ACCESS_TOKEN", &mut creds.access_token),
            ("TWITTER_ACCESS_SECRET", &mut creds.access_secret),
        ] {
            if let Some(v) = lookup(var) {
                *slot = v;
            }
        }
        self.store.apply_env(lookup)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_true")]
    pub stall_warnings: bool,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Reconnects allowed after the stream was open once. 0 disables.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,

    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            stall_warnings: true,
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect_attempts: default_reconnect_attempts(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

impl StreamSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(TagRaceError::Config("stream.endpoint must be an http(s) url".into()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(TagRaceError::Config("stream.connect_timeout_ms must be > 0".into()));
        }
        if self.backoff_initial_ms == 0 || self.backoff_max_ms < self.backoff_initial_ms {
            return Err(TagRaceError::Config(
                "stream.backoff_initial_ms must be > 0 and <= backoff_max_ms".into(),
            ));
        }
        if self.max_line_bytes < 1024 {
            return Err(TagRaceError::Config("stream.max_line_bytes must be >= 1024".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Delay before reconnect `attempt` (1-based): doubles from the initial
    /// value, capped at the max.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let ms = self
            .backoff_initial_ms
            .saturating_mul(1u64 << shift)
            .min(self.backoff_max_ms);
        Duration::from_millis(ms)
    }
}

/// OAuth 1.0a user-context credentials for the stream provider.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("TWITTER_CONSUMER_KEY", &self.consumer_key),
            ("TWITTER_CONSUMER_SECRET", &self.consumer_secret),
            ("TWITTER_ACCESS_TOKEN", &self.access_token),
            ("TWITTER_ACCESS_SECRET", &self.access_secret),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(TagRaceError::Config(format!(
                "missing stream credentials: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://stream.twitter.com/1.1/statuses/filter.json".into()
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_reconnect_attempts() -> u32 {
    5
}
fn default_backoff_initial_ms() -> u64 {
    250
}
fn default_backoff_max_ms() -> u64 {
    16_000
}
fn default_max_line_bytes() -> usize {
    1 << 20
}
