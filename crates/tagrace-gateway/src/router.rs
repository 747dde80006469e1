//! Axum router wiring.
//!
//! Ops routes are exact paths, so they win over the `/:id` counter route.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, poll};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(poll::handler::poll_ratio))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .route("/:id", get(poll::handler::poll_raw))
        .with_state(state)
}
