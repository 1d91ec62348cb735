//! The enrichment and scoring pipeline: per-scan state, single-flight
//! fetch coalescing, host roll-ups, and the process-wide dispatch hub.

pub mod cache;
pub mod collaborators;
pub mod context;
pub mod detection;
pub mod enrich;
pub mod hub;
pub mod report;
pub mod sources;
pub mod types;

pub use cache::{CacheStats, FingerprintCache};
pub use collaborators::{AiCapability, Archive, ReportAssembler};
pub use context::{ScanConfigSnapshot, ScanContext, SharedScanContext};
pub use detection::DetectionRecord;
pub use hub::{BridgeStatsSnapshot, PipelineHub};
pub use report::{RankedFinding, ScanReport};
pub use sources::DetectionSources;
pub use types::{HostContext, ServiceInfo};
