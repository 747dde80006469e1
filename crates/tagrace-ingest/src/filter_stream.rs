//! Filter-stream client for the stream provider.
//!
//! Lifecycle:
//! - `open`: one signed `POST` with `track` + `stall_warnings`; any failure is fatal
//! - read: body chunks -> `LineFramer` -> `decode_message`
//! - interruption after a successful open: bounded reconnects with backoff
//! - `stop`: drop the response, closing the connection

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::AUTHORIZATION;
use tracing::{debug, info, warn};

use tagrace_core::protocol::frame::LineFramer;
use tagrace_core::protocol::stream::{decode_message, StreamMessage};
use tagrace_core::{Result, TagRaceError, WatchList};

use crate::config::{Credentials, StreamSection};
use crate::oauth::{self, Nonce};
use crate::source::MessageSource;

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

pub struct FilterStream {
    http: reqwest::Client,
    cfg: StreamSection,
    creds: Credentials,
    form: Vec<(String, String)>,
    body: Option<ByteStream>,
    framer: LineFramer,
    failures: u32,
}

impl FilterStream {
    /// Open the stream filtered by the watch list's track terms.
    pub async fn open(cfg: &StreamSection, creds: &Credentials, watch: &WatchList) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .user_agent(concat!("tagrace-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TagRaceError::Internal(format!("http client: {e}")))?;

        let mut form = vec![("track".to_string(), watch.track_terms().join(","))];
        if cfg.stall_warnings {
            form.push(("stall_warnings".to_string(), "true".to_string()));
        }

        let mut stream = Self {
            http,
            cfg: cfg.clone(),
            creds: creds.clone(),
            form,
            body: None,
            framer: LineFramer::new(cfg.max_line_bytes),
            failures: 0,
        };
        stream.body = Some(connect(&stream.http, &stream.cfg, &stream.creds, &stream.form).await?);
        info!(endpoint = %stream.cfg.endpoint, "stream opened");
        Ok(stream)
    }

    async fn reconnect(&mut self, reason: &str) -> Result<()> {
        self.body = None;
        self.framer = LineFramer::new(self.cfg.max_line_bytes);
        loop {
            self.failures += 1;
            if self.failures > self.cfg.reconnect_attempts {
                return Err(TagRaceError::Stream(format!(
                    "giving up after {} reconnect attempts: {reason}",
                    self.cfg.reconnect_attempts
                )));
            }
            let delay = self.cfg.backoff(self.failures);
            warn!(attempt = self.failures, ?delay, reason, "stream interrupted, reconnecting");
            tokio::time::sleep(delay).await;

            match connect(&self.http, &self.cfg, &self.creds, &self.form).await {
                Ok(body) => {
                    self.body = Some(body);
                    info!(attempt = self.failures, "stream reconnected");
                    return Ok(());
                }
                Err(e) => warn!(attempt = self.failures, error = %e, "reconnect failed"),
            }
        }
    }
}

/// Takes the fields it needs rather than `&FilterStream`: the response body
/// is `Send` but not `Sync`.
async fn connect(
    http: &reqwest::Client,
    cfg: &StreamSection,
    creds: &Credentials,
    form: &[(String, String)],
) -> Result<ByteStream> {
    let params: Vec<(&str, &str)> = form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let auth = oauth::authorization_header("POST", &cfg.endpoint, &params, creds, &Nonce::generate())?;

    let resp = http
        .post(&cfg.endpoint)
        .header(AUTHORIZATION, auth)
        .form(form)
        .send()
        .await
        .map_err(|e| TagRaceError::Stream(format!("connect failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TagRaceError::Stream(format!(
            "provider answered {status}: {}",
            body.trim()
        )));
    }
    Ok(Box::pin(resp.bytes_stream()))
}

#[async_trait]
impl MessageSource for FilterStream {
    async fn next_message(&mut self) -> Result<Option<StreamMessage>> {
        loop {
            match self.framer.next_line() {
                Ok(Some(line)) => match decode_message(&line) {
                    Ok(msg) => {
                        self.failures = 0;
                        return Ok(Some(msg));
                    }
                    Err(e) => {
                        warn!(error = %e, "undecodable stream line skipped");
                        continue;
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "oversized stream line dropped");
                    continue;
                }
            }

            let Some(body) = self.body.as_mut() else {
                return Ok(None);
            };
            let chunk = body.next().await;
            match chunk {
                Some(Ok(chunk)) => {
                    debug!(bytes = chunk.len(), "chunk");
                    self.framer.push(&chunk);
                }
                Some(Err(e)) => self.reconnect(&format!("read failed: {e}")).await?,
                None => self.reconnect("stream closed by provider").await?,
            }
        }
    }

    async fn stop(&mut self) {
        if self.body.take().is_some() {
            info!("stream stopped");
        }
    }
}
