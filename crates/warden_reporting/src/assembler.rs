//! Builds the end-of-scan report: four rankings plus an executive summary.

use std::cmp::Ordering;

use warden_pipeline::{RankedFinding, ReportAssembler, ScanContext, ScanReport};
use warden_scoring::{Priority, SsvcDecision};

/// Flattens every `HostContext` in the scan into one working sequence (one
/// entry per detection, not per unique CVE), then projects it into the four
/// ranking arrays and an executive summary.
pub struct WardenReportAssembler;

impl WardenReportAssembler {
    pub fn new() -> Self {
        WardenReportAssembler
    }
}

impl Default for WardenReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Descending primary key, then `cve_id` ascending, then host IP ascending.
fn tie_break(a: &RankedFinding, b: &RankedFinding, key: impl Fn(&RankedFinding) -> f64) -> Ordering {
    key(b)
        .partial_cmp(&key(a))
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.score.cve_id.as_str().cmp(b.score.cve_id.as_str()))
        .then_with(|| a.host_ip.cmp(&b.host_ip))
}

impl ReportAssembler for WardenReportAssembler {
    fn assemble(&self, ctx: &ScanContext) -> ScanReport {
        let all: Vec<RankedFinding> = {
            let hosts = ctx.hosts.lock().unwrap();
            hosts
                .values()
                .flat_map(|host| {
                    host.findings.iter().map(move |score| RankedFinding {
                        host_ip: host.ip.clone(),
                        score: score.clone(),
                    })
                })
                .collect()
        };

        let mut top_by_cvss = all.clone();
        top_by_cvss.sort_by(|a, b| {
            tie_break(a, b, |f| f.score.highest_cvss_base_score().unwrap_or(0.0))
        });
        top_by_cvss.truncate(ctx.config.top_k_cvss);

        let mut top_by_epss = all.clone();
        top_by_epss.sort_by(|a, b| tie_break(a, b, |f| f.score.epss_score().unwrap_or(0.0)));
        top_by_epss.truncate(ctx.config.top_k_epss);

        let mut kev_vulnerabilities: Vec<RankedFinding> =
            all.iter().filter(|f| f.score.is_kev()).cloned().collect();
        kev_vulnerabilities.sort_by(|a, b| {
            a.score
                .cve_id
                .as_str()
                .cmp(b.score.cve_id.as_str())
                .then_with(|| a.host_ip.cmp(&b.host_ip))
        });

        let mut ssvc_act_vulnerabilities: Vec<RankedFinding> = all
            .iter()
            .filter(|f| f.score.ssvc_decision() == Some(SsvcDecision::Act))
            .cloned()
            .collect();
        ssvc_act_vulnerabilities.sort_by(|a, b| {
            a.score
                .cve_id
                .as_str()
                .cmp(b.score.cve_id.as_str())
                .then_with(|| a.host_ip.cmp(&b.host_ip))
        });

        let executive_summary = build_executive_summary(&all, &kev_vulnerabilities);

        ScanReport {
            scan_id: ctx.scan_id.clone(),
            scan_start_time_micros: ctx.start_time.timestamp_micros(),
            scan_end_time_micros: chrono::Utc::now().timestamp_micros(),
            ai_enhancement_enabled: ctx.config.ai_enabled,
            executive_summary,
            top_by_cvss,
            top_by_epss,
            kev_vulnerabilities,
            ssvc_act_vulnerabilities,
        }
    }
}

fn build_executive_summary(all: &[RankedFinding], kev: &[RankedFinding]) -> String {
    let total = all.len();
    let critical_count = all
        .iter()
        .filter(|f| f.score.ai_priority == Priority::Critical)
        .count();
    let kev_count = kev.len();

    let mut top_three: Vec<&RankedFinding> = all.iter().collect();
    top_three.sort_by(|a, b| {
        b.score
            .ai_risk_score
            .partial_cmp(&a.score.ai_risk_score)
            .unwrap_or(Ordering::Equal)
    });
    top_three.truncate(3);

    let max_priority = all
        .iter()
        .map(|f| f.score.ai_priority)
        .max_by_key(priority_rank)
        .unwrap_or(Priority::Info);

    let mut summary = String::new();
    summary.push_str(&format!(
        "{total} finding(s), {critical_count} critical, {kev_count} on the KEV catalog.\n"
    ));

    if !top_three.is_empty() {
        summary.push_str("Top by risk score:\n");
        for finding in &top_three {
            summary.push_str(&format!(
                "  - {} on {} (risk {:.2})\n",
                finding.score.cve_id.as_str(),
                finding.host_ip,
                finding.score.ai_risk_score
            ));
        }
    }

    summary.push_str(&recommended_action(max_priority));
    summary
}

fn priority_rank(priority: &Priority) -> u8 {
    match priority {
        Priority::Info => 0,
        Priority::Low => 1,
        Priority::Medium => 2,
        Priority::High => 3,
        Priority::Critical => 4,
    }
}

fn recommended_action(priority: Priority) -> String {
    match priority {
        Priority::Critical => {
            "Recommended action: patch critical and KEV-listed findings immediately.".to_string()
        }
        Priority::High => "Recommended action: remediate high-severity findings within the current patch cycle.".to_string(),
        Priority::Medium => "Recommended action: schedule medium-severity remediation in the next cycle.".to_string(),
        Priority::Low | Priority::Info => {
            "Recommended action: no urgent remediation required; continue routine scanning.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_core::CveId;
    use warden_pipeline::context::ScanConfigSnapshot;
    use warden_pipeline::types::HostContext;
    use warden_scoring::scoring::assemble;
    use warden_scoring::VulnerabilityScore;

    fn scored(cve: &str, base_score: f64) -> Arc<VulnerabilityScore> {
        let mut score = VulnerabilityScore::new(CveId::parse(cve).unwrap());
        score.cvss_v3_1 = Some(warden_scoring::CvssV3 {
            base_metrics: warden_scoring::CvssV3Base {
                attack_vector: "N".into(),
                attack_complexity: "L".into(),
                privileges_required: "N".into(),
                user_interaction: "N".into(),
                scope: "U".into(),
                confidentiality: "H".into(),
                integrity: "N".into(),
                availability: "N".into(),
            },
            base_score,
            severity: warden_scoring::CvssSeverity::from_v3_score(base_score),
            vector_string: String::new(),
        });
        assemble(&mut score);
        Arc::new(score)
    }

    // S6: three detections, all CVSS 9.0, tie-broken by cve_id then host.
    #[test]
    fn scenario_s6_ranking_ties_break_by_cve_then_host() {
        let ctx = ScanContext::new("scan-s6", ScanConfigSnapshot::default());
        {
            let mut hosts = ctx.hosts.lock().unwrap();
            hosts
                .entry("h1".to_string())
                .or_insert_with(|| HostContext::new("h1".to_string()))
                .record_finding(scored("CVE-2024-0001", 9.0), 0);
            hosts
                .entry("h1".to_string())
                .or_insert_with(|| HostContext::new("h1".to_string()))
                .record_finding(scored("CVE-2024-0002", 9.0), 0);
            hosts
                .entry("h2".to_string())
                .or_insert_with(|| HostContext::new("h2".to_string()))
                .record_finding(scored("CVE-2024-0001", 9.0), 0);
        }

        let report = WardenReportAssembler::new().assemble(&ctx);
        let order: Vec<(String, String)> = report
            .top_by_cvss
            .iter()
            .map(|f| (f.score.cve_id.as_str().to_string(), f.host_ip.clone()))
            .collect();

        assert_eq!(
            order,
            vec![
                ("CVE-2024-0001".to_string(), "h1".to_string()),
                ("CVE-2024-0001".to_string(), "h2".to_string()),
                ("CVE-2024-0002".to_string(), "h1".to_string()),
            ]
        );
    }

    #[test]
    fn findings_with_no_cvss_still_rank_with_zero_key() {
        let ctx = ScanContext::new("scan-s3", ScanConfigSnapshot::default());
        let mut score = VulnerabilityScore::new(CveId::parse("CVE-2024-0002").unwrap());
        score.epss = Some(warden_scoring::EpssInfo {
            score: 0.42,
            percentile: 0.8,
            model_version: "v1".into(),
            date: "2024-01-01".into(),
        });
        assemble(&mut score);
        {
            let mut hosts = ctx.hosts.lock().unwrap();
            hosts
                .entry("h".to_string())
                .or_insert_with(|| HostContext::new("h".to_string()))
                .record_finding(Arc::new(score), 9090);
        }

        let report = WardenReportAssembler::new().assemble(&ctx);
        assert_eq!(report.top_by_cvss.len(), 1);
        assert_eq!(report.top_by_epss.len(), 1);
    }

    #[test]
    fn empty_scan_yields_empty_report() {
        let ctx = ScanContext::new("scan-empty", ScanConfigSnapshot::default());
        let report = WardenReportAssembler::new().assemble(&ctx);
        assert!(report.top_by_cvss.is_empty());
        assert!(report.kev_vulnerabilities.is_empty());
        assert!(report.executive_summary.contains("0 finding"));
    }
}
