//! The scanner-side detection record: the shape emitted before enrichment
//! and mirrored-into after it (`PipelineHub::on_enhance_result`).

use chrono::{DateTime, Utc};

use warden_core::CveId;
use warden_scoring::{CvssSeverity, Priority, SsvcDecision};

#[derive(Debug, Clone)]
pub struct DetectionRecord {
    pub cve_id: CveId,
    pub host: String,
    pub port: u16,
    pub plugin_oid: Option<String>,
    pub description: Option<String>,
    pub detection_time: Option<DateTime<Utc>>,
    pub scanner_version: Option<String>,

    pub cvss_base_score: Option<f64>,
    pub cvss_severity: Option<CvssSeverity>,
    pub is_kev: Option<bool>,
    pub kev_due_date: Option<String>,
    pub epss_score: Option<f64>,
    pub epss_percentile: Option<f64>,
    pub ssvc_decision: Option<SsvcDecision>,
    pub ai_risk_score: Option<f64>,
    pub ai_priority: Option<Priority>,
    pub remediation_guidance: Option<String>,
}

impl DetectionRecord {
    pub fn new(cve_id: CveId, host: impl Into<String>, port: u16) -> Self {
        DetectionRecord {
            cve_id,
            host: host.into(),
            port,
            plugin_oid: None,
            description: None,
            detection_time: Some(Utc::now()),
            scanner_version: None,
            cvss_base_score: None,
            cvss_severity: None,
            is_kev: None,
            kev_due_date: None,
            epss_score: None,
            epss_percentile: None,
            ssvc_decision: None,
            ai_risk_score: None,
            ai_priority: None,
            remediation_guidance: None,
        }
    }
}
