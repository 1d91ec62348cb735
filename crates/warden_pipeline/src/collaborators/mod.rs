//! Narrow adapters to the three external collaborators: the persistent
//! archive, the AI guidance capability, and (indirectly, via `sources.rs`)
//! the detection-source fetchers. The core only ever depends on these
//! traits, never on a concrete archive or LLM client.

use async_trait::async_trait;

use warden_core::{WardenError, WardenResult};
use warden_scoring::VulnerabilityScore;

use crate::context::ScanContext;
use crate::report::ScanReport;
use crate::types::HostContext;

/// `save(scan_id, report)`; the core does not retry — the archive owns
/// durability.
#[async_trait]
pub trait Archive: Send + Sync {
    async fn save(&self, scan_id: &str, report: &ScanReport) -> WardenResult<()>;
}

/// Builds the end-of-scan report from a finished `ScanContext`. Kept as a
/// trait (rather than a free function called directly by the hub) so the
/// ranking/tie-break logic can live in its own crate without creating a
/// dependency cycle back into this one.
pub trait ReportAssembler: Send + Sync {
    fn assemble(&self, ctx: &ScanContext) -> ScanReport;
}

/// Free-text remediation guidance for one finding, bounded by a deadline the
/// caller enforces (see `PipelineHub::on_detection`). Any error is tolerated
/// by omitting guidance.
#[async_trait]
pub trait AiCapability: Send + Sync {
    async fn guidance(
        &self,
        score: &VulnerabilityScore,
        host: &HostContext,
    ) -> Result<String, WardenError>;
}

/// Test doubles, always compiled (see `sources::fakes` for rationale).
pub mod fakes {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingArchive {
        pub saved: Mutex<Vec<(String, ScanReport)>>,
    }

    #[async_trait]
    impl Archive for RecordingArchive {
        async fn save(&self, scan_id: &str, report: &ScanReport) -> WardenResult<()> {
            self.saved
                .lock()
                .unwrap()
                .push((scan_id.to_string(), report.clone()));
            Ok(())
        }
    }

    pub struct StaticGuidance(pub String);

    #[async_trait]
    impl AiCapability for StaticGuidance {
        async fn guidance(
            &self,
            _score: &VulnerabilityScore,
            _host: &HostContext,
        ) -> Result<String, WardenError> {
            Ok(self.0.clone())
        }
    }

    pub struct FailingGuidance;

    #[async_trait]
    impl AiCapability for FailingGuidance {
        async fn guidance(
            &self,
            _score: &VulnerabilityScore,
            _host: &HostContext,
        ) -> Result<String, WardenError> {
            Err(WardenError::ai_unavailable("guidance provider unreachable"))
        }
    }

    pub struct HangingGuidance;

    #[async_trait]
    impl AiCapability for HangingGuidance {
        async fn guidance(
            &self,
            _score: &VulnerabilityScore,
            _host: &HostContext,
        ) -> Result<String, WardenError> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            unreachable!("deadline should have fired first")
        }
    }
}
