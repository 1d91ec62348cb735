//! Composite AI risk score, priority ladder, and remediation-urgency ladder.
//!
//! The composite score normalizes a weighted sum of whichever sub-records are
//! present by the weight actually contributed, so that missing signals do not
//! bias the score downward (see `compute_composite_risk_score`).

use crate::types::{CvssSeverity, Priority, SsvcDecision, Urgency, VulnerabilityScore};

const CVSS_WEIGHT: f64 = 0.4;
const KEV_WEIGHT: f64 = 0.3;
const EPSS_WEIGHT: f64 = 0.2;
const SSVC_WEIGHT: f64 = 0.1;

fn ssvc_contribution(decision: SsvcDecision) -> f64 {
    match decision {
        SsvcDecision::Track => 2.5,
        SsvcDecision::TrackStar => 5.0,
        SsvcDecision::Attend => 7.5,
        SsvcDecision::Act => 10.0,
    }
}

/// Weighted average over present sub-records, normalized by contributed
/// weight and clamped to `[0, 10]`. Returns `0.0` when nothing is present.
pub fn compute_composite_risk_score(score: &VulnerabilityScore) -> f64 {
    let mut weighted_sum = 0.0;
    let mut contributed_weight = 0.0;

    if let Some(cvss_base) = score.highest_cvss_base_score() {
        weighted_sum += cvss_base * CVSS_WEIGHT;
        contributed_weight += CVSS_WEIGHT;
    }

    if let Some(kev) = &score.kev {
        let contribution = if kev.is_kev { 10.0 } else { 0.0 };
        weighted_sum += contribution * KEV_WEIGHT;
        contributed_weight += KEV_WEIGHT;
    }

    if let Some(epss) = &score.epss {
        weighted_sum += (epss.score * 10.0) * EPSS_WEIGHT;
        contributed_weight += EPSS_WEIGHT;
    }

    if let Some(ssvc) = &score.ssvc {
        weighted_sum += ssvc_contribution(ssvc.decision) * SSVC_WEIGHT;
        contributed_weight += SSVC_WEIGHT;
    }

    if contributed_weight <= 0.0 {
        return 0.0;
    }

    (weighted_sum / contributed_weight).clamp(0.0, 10.0)
}

/// First rule that matches wins.
pub fn compute_priority(score: &VulnerabilityScore) -> Priority {
    if score.is_kev() {
        return Priority::Critical;
    }

    let severity = score.highest_cvss_severity();
    let epss = score.epss_score();

    if let (Some(sev), Some(epss_score)) = (severity, epss) {
        if sev >= CvssSeverity::High && epss_score > 0.10 {
            return Priority::Critical;
        }
    }

    if let Some(sev) = severity {
        if sev == CvssSeverity::Critical {
            return Priority::High;
        }
        if sev == CvssSeverity::High {
            return Priority::Medium;
        }
    }

    if score.ssvc_decision() == Some(SsvcDecision::Act) {
        return Priority::High;
    }

    match severity {
        Some(CvssSeverity::Medium) => Priority::Low,
        Some(_) => Priority::Info,
        None => Priority::Low,
    }
}

/// First rule that matches wins.
pub fn compute_urgency(score: &VulnerabilityScore) -> Urgency {
    if score.is_kev() {
        return Urgency::Immediate;
    }

    let severity = score.highest_cvss_severity();
    let epss = score.epss_score();

    if severity == Some(CvssSeverity::Critical) {
        if epss.map(|e| e > 0.10).unwrap_or(false) {
            return Urgency::High;
        }
        return Urgency::Medium;
    }

    if severity == Some(CvssSeverity::High) {
        return Urgency::Medium;
    }

    Urgency::Low
}

/// Assembles the three derived fields onto a score that already carries its
/// sub-records. Call once per fetch, before the score enters the cache.
pub fn assemble(score: &mut VulnerabilityScore) {
    score.ai_risk_score = compute_composite_risk_score(score);
    score.ai_priority = compute_priority(score);
    score.ai_remediation_urgency = compute_urgency(score);
}
