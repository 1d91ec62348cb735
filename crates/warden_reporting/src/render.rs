//! Projects an assembled `ScanReport` into one of the supported output
//! formats.

use warden_core::WardenResult;
use warden_pipeline::ScanReport;

use crate::formats::ReportFormat;

pub fn render(report: &ScanReport, format: ReportFormat) -> WardenResult<String> {
    match format {
        ReportFormat::Json => render_json(report),
        ReportFormat::Markdown => Ok(render_markdown(report)),
        ReportFormat::Text => Ok(render_text(report)),
    }
}

fn render_json(report: &ScanReport) -> WardenResult<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn render_markdown(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str("# Vulnerability Assessment Report\n\n");
    out.push_str(&format!("**Scan ID**: {}\n\n", report.scan_id));
    out.push_str("## Executive Summary\n\n");
    out.push_str(&report.executive_summary);
    out.push('\n');

    out.push_str("## Findings by CVSS\n\n");
    for finding in &report.top_by_cvss {
        out.push_str(&format!(
            "- {} on {} — CVSS {:.1}\n",
            finding.score.cve_id.as_str(),
            finding.host_ip,
            finding.score.highest_cvss_base_score().unwrap_or(0.0)
        ));
    }

    if !report.kev_vulnerabilities.is_empty() {
        out.push_str("\n## Known Exploited Vulnerabilities\n\n");
        for finding in &report.kev_vulnerabilities {
            out.push_str(&format!(
                "- {} on {}\n",
                finding.score.cve_id.as_str(),
                finding.host_ip
            ));
        }
    }

    out
}

fn render_text(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str("VULNERABILITY ASSESSMENT REPORT\n");
    out.push_str("================================\n\n");
    out.push_str(&format!("Scan ID: {}\n", report.scan_id));
    out.push_str(&format!(
        "Findings: {} (KEV: {}, SSVC ACT: {})\n\n",
        report.top_by_cvss.len(),
        report.kev_vulnerabilities.len(),
        report.ssvc_act_vulnerabilities.len()
    ));
    out.push_str(&report.executive_summary);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_pipeline::context::ScanConfigSnapshot;
    use warden_pipeline::ScanContext;

    use crate::assembler::WardenReportAssembler;
    use warden_pipeline::ReportAssembler;

    #[test]
    fn json_render_round_trips_scan_id() {
        let ctx = ScanContext::new("scan-render", ScanConfigSnapshot::default());
        let report = WardenReportAssembler::new().assemble(&ctx);
        let json = render(&report, ReportFormat::Json).unwrap();
        assert!(json.contains("scan-render"));
    }

    #[test]
    fn text_render_contains_scan_id() {
        let ctx = ScanContext::new("scan-render-2", ScanConfigSnapshot::default());
        let report = WardenReportAssembler::new().assemble(&ctx);
        let text = render(&report, ReportFormat::Text).unwrap();
        assert!(text.contains("scan-render-2"));
    }
}
