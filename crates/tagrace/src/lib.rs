//! Top-level facade crate for tagrace.
//!
//! Re-exports the core model, the counter store, the ratio gateway and the
//! stream ingestor so users can depend on a single crate.

pub mod core {
    pub use tagrace_core::*;
}

pub mod store {
    pub use tagrace_store::*;
}

pub mod gateway {
    pub use tagrace_gateway::*;
}

pub mod ingest {
    pub use tagrace_ingest::*;
}
