//! The end-of-scan report shape produced by `warden_reporting` and
//! consumed by the `Archive` collaborator. Lives here (rather than in
//! `warden_reporting`) so the `Archive` trait can reference it without a
//! dependency cycle — `warden_reporting` depends on `warden_pipeline`,
//! not the other way around.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use warden_scoring::VulnerabilityScore;

/// One ranking-array element: the shared score plus the host it was seen
/// on, since the same `VulnerabilityScore` may appear once per host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedFinding {
    pub host_ip: String,
    pub score: Arc<VulnerabilityScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: String,
    #[serde(rename = "scan_start_time")]
    pub scan_start_time_micros: i64,
    #[serde(rename = "scan_end_time")]
    pub scan_end_time_micros: i64,
    pub ai_enhancement_enabled: bool,
    pub executive_summary: String,
    pub top_by_cvss: Vec<RankedFinding>,
    pub top_by_epss: Vec<RankedFinding>,
    pub kev_vulnerabilities: Vec<RankedFinding>,
    pub ssvc_act_vulnerabilities: Vec<RankedFinding>,
}
