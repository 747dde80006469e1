//! HTTP entry points for poll sessions.
//!
//! - `POST /` with `{"me": "<tag>", "opponent": "<tag>"}` streams ratio lines
//! - `GET /:id` streams the raw counter of `id`
//!
//! Both answer `200` right away and stream `"<int>\n"` lines until the client
//! disconnects, the process shuts down, or the write timeout elapses.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use tagrace_core::{CounterKey, Result, TagRaceError};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::poll::reading::PollTarget;
use crate::poll::session::PollSession;

#[derive(Debug, Deserialize)]
pub struct RaceRequest {
    pub me: String,
    pub opponent: String,
}

pub async fn poll_ratio(State(app): State<AppState>, body: Body) -> Response {
    match parse_race(&app, body).await {
        Ok(target) => open_stream(&app, target),
        Err(e) => reject(&app, e),
    }
}

pub async fn poll_raw(State(app): State<AppState>, Path(id): Path<String>) -> Response {
    match CounterKey::from_client(&id) {
        Ok(key) => open_stream(&app, PollTarget::Raw { key }),
        Err(e) => reject(&app, e),
    }
}

async fn parse_race(app: &AppState, body: Body) -> Result<PollTarget> {
    let server = &app.cfg().server;
    let bytes = tokio::time::timeout(
        server.read_timeout(),
        axum::body::to_bytes(body, server.max_body_bytes),
    )
    .await
    .map_err(|_| TagRaceError::Timeout("request body not received in time".into()))?
    .map_err(|e| TagRaceError::BadRequest(format!("read body failed: {e}")))?;

    let req: RaceRequest = serde_json::from_slice(&bytes)
        .map_err(|e| TagRaceError::BadRequest(format!("invalid race request: {e}")))?;

    Ok(PollTarget::Ratio {
        me: CounterKey::from_client(&req.me)?,
        opponent: CounterKey::from_client(&req.opponent)?,
    })
}

fn reject(app: &AppState, e: TagRaceError) -> Response {
    warn!(error = %e, "poll request rejected");
    app.metrics()
        .request_errors
        .inc(&[("code", e.client_code().as_str())]);
    ApiError(e).into_response()
}

/// Spawn the session and stream its lines; each line is its own body frame.
fn open_stream(app: &AppState, target: PollTarget) -> Response {
    let rx = PollSession::new(app.clone(), target).spawn();
    let lines = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (Ok::<_, Infallible>(line), rx))
    });
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(lines),
    )
        .into_response()
}
