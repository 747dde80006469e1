//! tagrace ratio gateway library.
//!
//! Wires config, the shared counter store, poll sessions and ops endpoints
//! into an axum router. Consumed by the binary (`main.rs`) and integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod obs;
pub mod ops;
pub mod poll;
pub mod router;
