//! Scoring data model: CVSS v2/v3.0/v3.1, KEV, EPSS, SSVC sub-records and the
//! comprehensive per-CVE `VulnerabilityScore`.

use serde::{Deserialize, Serialize};
use warden_core::CveId;

/// Qualitative severity bucket shared by every CVSS version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CvssSeverity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl CvssSeverity {
    /// Bucketing for CVSS v3: {0.0: NONE, 0.1-3.9: LOW, 4.0-6.9: MEDIUM, 7.0-8.9: HIGH, 9.0-10.0: CRITICAL}.
    pub fn from_v3_score(score: f64) -> Self {
        match score {
            s if s <= 0.0 => CvssSeverity::None,
            s if s < 4.0 => CvssSeverity::Low,
            s if s < 7.0 => CvssSeverity::Medium,
            s if s < 9.0 => CvssSeverity::High,
            _ => CvssSeverity::Critical,
        }
    }

    /// Bucketing for CVSS v2: {>=9.0: CRITICAL, 7.0-8.9: HIGH, 4.0-6.9: MEDIUM, else LOW}.
    pub fn from_v2_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => CvssSeverity::Critical,
            s if s >= 7.0 => CvssSeverity::High,
            s if s >= 4.0 => CvssSeverity::Medium,
            _ => CvssSeverity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CvssSeverity::None => "NONE",
            CvssSeverity::Low => "LOW",
            CvssSeverity::Medium => "MEDIUM",
            CvssSeverity::High => "HIGH",
            CvssSeverity::Critical => "CRITICAL",
        }
    }
}

/// CVSS v3.x (3.0 and 3.1 share this shape) base metric vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvssV3Base {
    pub attack_vector: String,
    pub attack_complexity: String,
    pub privileges_required: String,
    pub user_interaction: String,
    pub scope: String,
    pub confidentiality: String,
    pub integrity: String,
    pub availability: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvssV3 {
    pub base_metrics: CvssV3Base,
    pub base_score: f64,
    pub severity: CvssSeverity,
    pub vector_string: String,
}

/// CVSS v2 base metric vector (distinct attribute set from v3: no scope,
/// authentication instead of privileges-required/user-interaction split).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvssV2Base {
    pub access_vector: String,
    pub access_complexity: String,
    pub authentication: String,
    pub confidentiality_impact: String,
    pub integrity_impact: String,
    pub availability_impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvssV2 {
    pub base_metrics: CvssV2Base,
    pub base_score: f64,
    pub severity: CvssSeverity,
    pub vector_string: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KevInfo {
    pub is_kev: bool,
    pub date_added: Option<String>,
    pub due_date: Option<String>,
    pub required_action: Option<String>,
    pub known_ransomware_use: bool,
    pub notes: Option<String>,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpssInfo {
    pub score: f64,
    pub percentile: f64,
    pub model_version: String,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SsvcDecision {
    Track,
    TrackStar,
    Attend,
    Act,
}

impl SsvcDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            SsvcDecision::Track => "TRACK",
            SsvcDecision::TrackStar => "TRACK_STAR",
            SsvcDecision::Attend => "ATTEND",
            SsvcDecision::Act => "ACT",
        }
    }
}

/// Five contributing axes behind an SSVC decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsvcInfo {
    pub decision: SsvcDecision,
    pub exploitation: String,
    pub automatable: bool,
    pub technical_impact: String,
    pub mission_wellbeing_impact: String,
    pub public_safety_impact: String,
}

impl SsvcInfo {
    /// The known-stub local derivation: always TRACK with conservative axes.
    /// Do not invent a remote SSVC policy here.
    pub fn default_stub() -> Self {
        SsvcInfo {
            decision: SsvcDecision::Track,
            exploitation: "none".to_string(),
            automatable: false,
            technical_impact: "partial".to_string(),
            mission_wellbeing_impact: "low".to_string(),
            public_safety_impact: "minimal".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Info => "INFO",
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Immediate,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
            Urgency::Immediate => "IMMEDIATE",
        }
    }
}

/// Comprehensive, per-CVE enrichment record. Shared by the fingerprint cache
/// and every host finding list that references it (see `Arc<VulnerabilityScore>`
/// at the call sites in `warden_pipeline`); nothing here mutates after the
/// score is first assembled except the `ai_context` guidance blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityScore {
    pub cve_id: CveId,
    pub vulnerability_name: Option<String>,
    pub description: Option<String>,

    pub cvss_v2: Option<CvssV2>,
    pub cvss_v3_0: Option<CvssV3>,
    pub cvss_v3_1: Option<CvssV3>,

    pub kev: Option<KevInfo>,
    pub epss: Option<EpssInfo>,
    pub ssvc: Option<SsvcInfo>,

    pub cwe_ids: Vec<String>,
    pub references: Vec<String>,
    pub published_date: Option<String>,
    pub last_modified: Option<String>,

    pub ai_risk_score: f64,
    pub ai_priority: Priority,
    pub ai_remediation_urgency: Urgency,
    pub ai_context: Option<String>,
}

impl VulnerabilityScore {
    pub fn new(cve_id: CveId) -> Self {
        VulnerabilityScore {
            cve_id,
            vulnerability_name: None,
            description: None,
            cvss_v2: None,
            cvss_v3_0: None,
            cvss_v3_1: None,
            kev: None,
            epss: None,
            ssvc: None,
            cwe_ids: Vec::new(),
            references: Vec::new(),
            published_date: None,
            last_modified: None,
            ai_risk_score: 0.0,
            ai_priority: Priority::Info,
            ai_remediation_urgency: Urgency::Low,
            ai_context: None,
        }
    }

    pub fn is_kev(&self) -> bool {
        self.kev.as_ref().map(|k| k.is_kev).unwrap_or(false)
    }

    /// Highest-available CVSS base score, preferring v3.1 > v3.0 > v2.
    pub fn highest_cvss_base_score(&self) -> Option<f64> {
        self.cvss_v3_1
            .as_ref()
            .map(|c| c.base_score)
            .or_else(|| self.cvss_v3_0.as_ref().map(|c| c.base_score))
            .or_else(|| self.cvss_v2.as_ref().map(|c| c.base_score))
    }

    pub fn highest_cvss_severity(&self) -> Option<CvssSeverity> {
        self.cvss_v3_1
            .as_ref()
            .map(|c| c.severity)
            .or_else(|| self.cvss_v3_0.as_ref().map(|c| c.severity))
            .or_else(|| self.cvss_v2.as_ref().map(|c| c.severity))
    }

    pub fn epss_score(&self) -> Option<f64> {
        self.epss.as_ref().map(|e| e.score)
    }

    pub fn ssvc_decision(&self) -> Option<SsvcDecision> {
        self.ssvc.as_ref().map(|s| s.decision)
    }
}
