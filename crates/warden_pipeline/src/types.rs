//! Per-host state: findings, the service-port index, and the rolled-up
//! composite risk score.

use std::collections::HashMap;
use std::sync::Arc;

use warden_core::CveId;
use warden_scoring::{SsvcDecision, VulnerabilityScore};

#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub port: u16,
    pub service_name: Option<String>,
    pub service_version: Option<String>,
    pub cpe: Option<String>,
    pub cve_ids: Vec<CveId>,
}

impl ServiceInfo {
    pub fn new(port: u16) -> Self {
        ServiceInfo {
            port,
            service_name: None,
            service_version: None,
            cpe: None,
            cve_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostContext {
    pub ip: String,
    pub hostname: Option<String>,
    pub asset_criticality: Option<String>,
    /// Append-order detections; the same CVE may repeat (one entry per
    /// detection, not deduplicated).
    pub findings: Vec<Arc<VulnerabilityScore>>,
    pub services: HashMap<u16, ServiceInfo>,
    pub composite_risk_score: f64,
}

impl HostContext {
    pub fn new(ip: String) -> Self {
        HostContext {
            ip,
            hostname: None,
            asset_criticality: None,
            findings: Vec::new(),
            services: HashMap::new(),
            composite_risk_score: 0.0,
        }
    }

    /// Appends a shared reference to `score` and, when `port > 0`, records
    /// the CVE against that port's service entry. Recomputes the composite
    /// risk roll-up under the same critical section.
    pub fn record_finding(&mut self, score: Arc<VulnerabilityScore>, port: u16) {
        if port > 0 {
            let service = self
                .services
                .entry(port)
                .or_insert_with(|| ServiceInfo::new(port));
            service.cve_ids.push(score.cve_id.clone());
        }

        self.findings.push(score);
        self.recompute_composite_risk();
    }

    /// `total = Σcvss_base + 15×kev_count + Σ(epss×10) + 12×act_count + Σai_risk_score`,
    /// normalized by finding count and clamped to `[0,100]`.
    fn recompute_composite_risk(&mut self) {
        let n = self.findings.len();
        if n == 0 {
            self.composite_risk_score = 0.0;
            return;
        }

        let mut total = 0.0;
        for finding in &self.findings {
            if let Some(base) = finding.highest_cvss_base_score() {
                total += base;
            }
            if finding.is_kev() {
                total += 15.0;
            }
            if let Some(epss) = finding.epss_score() {
                total += epss * 10.0;
            }
            if finding.ssvc_decision() == Some(SsvcDecision::Act) {
                total += 12.0;
            }
            total += finding.ai_risk_score;
        }

        self.composite_risk_score = (total / n as f64).min(100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_scoring::scoring::assemble;
    use warden_scoring::{CvssSeverity, CvssV3, CvssV3Base, EpssInfo, KevInfo, SsvcInfo};

    fn critical_kev_finding() -> VulnerabilityScore {
        let mut score = VulnerabilityScore::new(CveId::parse("CVE-2021-44228").unwrap());
        score.cvss_v3_1 = Some(CvssV3 {
            base_metrics: CvssV3Base {
                attack_vector: "N".into(),
                attack_complexity: "L".into(),
                privileges_required: "N".into(),
                user_interaction: "N".into(),
                scope: "C".into(),
                confidentiality: "H".into(),
                integrity: "H".into(),
                availability: "H".into(),
            },
            base_score: 10.0,
            severity: CvssSeverity::Critical,
            vector_string: "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:C/C:H/I:H/A:H".into(),
        });
        score.kev = Some(KevInfo {
            is_kev: true,
            date_added: Some("2021-12-10".into()),
            due_date: Some("2021-12-24".into()),
            required_action: Some("Apply updates".into()),
            known_ransomware_use: false,
            notes: None,
            last_updated: "2021-12-10T00:00:00Z".into(),
        });
        score.epss = Some(EpssInfo {
            score: 0.97,
            percentile: 0.999,
            model_version: "v2023.03.01".into(),
            date: "2024-01-01".into(),
        });
        score.ssvc = Some(SsvcInfo::default_stub());
        assemble(&mut score);
        score
    }

    #[test]
    fn empty_host_has_zero_composite_risk() {
        let host = HostContext::new("10.0.0.7".to_string());
        assert_eq!(host.composite_risk_score, 0.0);
    }

    // S1: single critical KEV finding. total = 10 + 15 + 9.7 + ai_risk_score; N=1.
    #[test]
    fn scenario_s1_host_roll_up() {
        let mut host = HostContext::new("10.0.0.7".to_string());
        let score = Arc::new(critical_kev_finding());
        let expected_total = 10.0 + 15.0 + 9.7 + score.ai_risk_score;

        host.record_finding(score, 8080);

        assert_eq!(host.findings.len(), 1);
        assert!((host.composite_risk_score - expected_total.min(100.0)).abs() < 0.001);
        assert_eq!(host.services.get(&8080).unwrap().cve_ids.len(), 1);
    }

    #[test]
    fn composite_risk_is_clamped_to_one_hundred() {
        let mut host = HostContext::new("10.0.0.7".to_string());
        for _ in 0..3 {
            host.record_finding(Arc::new(critical_kev_finding()), 0);
        }
        assert!(host.composite_risk_score <= 100.0);
    }

    #[test]
    fn same_cve_on_two_detections_counts_twice() {
        let mut host = HostContext::new("10.0.0.7".to_string());
        host.record_finding(Arc::new(critical_kev_finding()), 443);
        host.record_finding(Arc::new(critical_kev_finding()), 443);
        assert_eq!(host.findings.len(), 2);
        assert_eq!(host.services.get(&443).unwrap().cve_ids.len(), 2);
    }
}
