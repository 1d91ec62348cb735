//! Vulnerability scoring: CVSS calculation, sub-record types, and the
//! composite AI risk score / priority / urgency ladders.

pub mod cvss;
pub mod scoring;
pub mod types;

pub use scoring::{assemble, compute_composite_risk_score, compute_priority, compute_urgency};
pub use types::{
    CvssSeverity, CvssV2, CvssV2Base, CvssV3, CvssV3Base, EpssInfo, KevInfo, Priority,
    SsvcDecision, SsvcInfo, Urgency, VulnerabilityScore,
};
