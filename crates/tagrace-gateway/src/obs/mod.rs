//! Lightweight in-process metrics.
//!
//! Poll sessions record tick outcomes and store read latency here; the
//! `/metrics` handler renders them in Prometheus text format.

pub mod metrics;
