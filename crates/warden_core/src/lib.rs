//! Shared primitives for the Warden enrichment and scoring pipeline:
//! the validated CVE identifier, the crate-wide error type, the per-endpoint
//! rate gate, and tracing bootstrap.

pub mod error;
pub mod ids;
pub mod rate_gate;
pub mod telemetry;

pub use error::{WardenError, WardenResult};
pub use ids::CveId;
pub use rate_gate::RateGate;
pub use telemetry::init_tracing;
