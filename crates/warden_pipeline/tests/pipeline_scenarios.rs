//! End-to-end coverage of the hub dispatch path using fake sources and
//! collaborators — no network access.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use warden_pipeline::collaborators::fakes::{FailingGuidance, HangingGuidance, RecordingArchive, StaticGuidance};
use warden_pipeline::context::ScanContext;
use warden_pipeline::sources::fakes::FakeSources;
use warden_pipeline::{PipelineHub, RankedFinding, ReportAssembler, ScanConfigSnapshot, ScanReport};
use warden_scoring::{CvssSeverity, CvssV3, CvssV3Base, EpssInfo, Priority, Urgency};
use warden_sources::KevCatalog;

/// Minimal assembler sufficient for these dispatch-level tests; the real
/// tie-break-accurate rankings live in the reporting crate.
struct NaiveReportAssembler;

impl ReportAssembler for NaiveReportAssembler {
    fn assemble(&self, ctx: &ScanContext) -> ScanReport {
        let hosts = ctx.hosts.lock().unwrap();
        let mut top_by_cvss = Vec::new();
        let mut top_by_epss = Vec::new();
        let mut kev_vulnerabilities = Vec::new();
        let mut ssvc_act_vulnerabilities = Vec::new();

        for host in hosts.values() {
            for score in &host.findings {
                let ranked = RankedFinding {
                    host_ip: host.ip.clone(),
                    score: score.clone(),
                };
                top_by_cvss.push(ranked.clone());
                if score.epss_score().is_some() {
                    top_by_epss.push(ranked.clone());
                }
                if score.is_kev() {
                    kev_vulnerabilities.push(ranked.clone());
                }
                if score.ssvc_decision() == Some(warden_scoring::SsvcDecision::Act) {
                    ssvc_act_vulnerabilities.push(ranked);
                }
            }
        }

        top_by_cvss.sort_by(|a, b| {
            b.score
                .highest_cvss_base_score()
                .unwrap_or(0.0)
                .partial_cmp(&a.score.highest_cvss_base_score().unwrap_or(0.0))
                .unwrap()
        });
        top_by_epss.sort_by(|a, b| {
            b.score
                .epss_score()
                .unwrap_or(0.0)
                .partial_cmp(&a.score.epss_score().unwrap_or(0.0))
                .unwrap()
        });

        ScanReport {
            scan_id: ctx.scan_id.clone(),
            scan_start_time_micros: ctx.start_time.timestamp_micros(),
            scan_end_time_micros: chrono::Utc::now().timestamp_micros(),
            ai_enhancement_enabled: ctx.config.ai_enabled,
            executive_summary: format!("{} findings", top_by_cvss.len()),
            top_by_cvss,
            top_by_epss,
            kev_vulnerabilities,
            ssvc_act_vulnerabilities,
        }
    }
}

fn critical_nvd_record() -> warden_sources::NvdRecord {
    warden_sources::NvdRecord {
        description: Some("Remote code execution".into()),
        published: Some("2021-12-10T00:00:00Z".into()),
        last_modified: Some("2021-12-11T00:00:00Z".into()),
        cwe_ids: vec!["CWE-502".into()],
        cvss_v3_1: Some(CvssV3 {
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
        }),
        cvss_v3_0: None,
        cvss_v2: None,
    }
}

fn high_nvd_record() -> warden_sources::NvdRecord {
    warden_sources::NvdRecord {
        description: None,
        published: None,
        last_modified: None,
        cwe_ids: vec![],
        cvss_v3_1: Some(CvssV3 {
            base_metrics: CvssV3Base {
                attack_vector: "N".into(),
                attack_complexity: "L".into(),
                privileges_required: "N".into(),
                user_interaction: "N".into(),
                scope: "U".into(),
                confidentiality: "H".into(),
                integrity: "N".into(),
                availability: "N".into(),
            },
            base_score: 7.5,
            severity: CvssSeverity::High,
            vector_string: "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:N/A:N".into(),
        }),
        cvss_v3_0: None,
        cvss_v2: None,
    }
}

fn build_hub(sources: Arc<FakeSources>, ai: Option<Arc<dyn warden_pipeline::AiCapability>>) -> (Arc<PipelineHub>, Arc<RecordingArchive>) {
    let archive = Arc::new(RecordingArchive::default());
    let hub = Arc::new(PipelineHub::new(
        sources,
        Arc::new(NaiveReportAssembler),
        archive.clone(),
        ai,
    ));
    (hub, archive)
}

// S1: single critical KEV detection.
#[tokio::test]
async fn scenario_s1_single_critical_kev_detection() {
    let sources = Arc::new(FakeSources::default());
    sources
        .nvd_responses
        .lock()
        .unwrap()
        .insert("CVE-2021-44228".to_string(), Some(critical_nvd_record()));
    sources
        .epss_responses
        .lock()
        .unwrap()
        .insert(
            "CVE-2021-44228".to_string(),
            Some(EpssInfo {
                score: 0.97,
                percentile: 0.999,
                model_version: "v2023.03.01".into(),
                date: "2024-01-01".into(),
            }),
        );
    *sources.kev_catalog.lock().unwrap() =
        KevCatalog::with_single_entry("CVE-2021-44228", "2021-12-10", "2021-12-24", "Apply updates");

    let (hub, archive) = build_hub(sources, None);
    hub.start_scan("scan-s1", ScanConfigSnapshot::default()).await;

    hub.on_detection(Some("scan-s1"), "CVE-2021-44228", "10.0.0.7", 8080)
        .await;

    let report = hub.end_scan("scan-s1").await.unwrap();
    assert_eq!(report.top_by_cvss.len(), 1);
    assert_eq!(report.kev_vulnerabilities.len(), 1);
    assert!(report.ssvc_act_vulnerabilities.is_empty());

    let score = &report.top_by_cvss[0].score;
    assert_eq!(score.ai_priority, Priority::Critical);
    assert_eq!(score.ai_remediation_urgency, Urgency::Immediate);
    assert!((score.ai_risk_score - 9.19).abs() < 0.01);

    assert_eq!(archive.saved.lock().unwrap().len(), 1);
}

// S2: two hosts, same CVE, NVD-only. Exactly one NVD fetch (cache hit on host 2).
#[tokio::test]
async fn scenario_s2_cache_hit_across_hosts() {
    let sources = Arc::new(FakeSources::default());
    sources
        .nvd_responses
        .lock()
        .unwrap()
        .insert("CVE-2024-0001".to_string(), Some(high_nvd_record()));

    let (hub, _archive) = build_hub(sources.clone(), None);
    hub.start_scan("scan-s2", ScanConfigSnapshot::default()).await;

    hub.on_detection(Some("scan-s2"), "CVE-2024-0001", "h1", 0).await;
    hub.on_detection(Some("scan-s2"), "CVE-2024-0001", "h2", 0).await;

    assert_eq!(sources.nvd_calls.load(Ordering::SeqCst), 1);

    let report = hub.end_scan("scan-s2").await.unwrap();
    assert_eq!(report.top_by_cvss.len(), 2);
    for ranked in &report.top_by_cvss {
        assert_eq!(ranked.score.ai_priority, Priority::Medium);
    }
}

// S4: 16 concurrent detections for the same CVE across distinct hosts.
#[tokio::test]
async fn scenario_s4_single_flight_across_concurrent_hosts() {
    let sources = Arc::new(FakeSources::default());
    sources
        .nvd_responses
        .lock()
        .unwrap()
        .insert("CVE-2024-0003".to_string(), Some(high_nvd_record()));

    let (hub, _archive) = build_hub(sources.clone(), None);
    hub.start_scan("scan-s4", ScanConfigSnapshot::default()).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let hub = hub.clone();
        handles.push(tokio::spawn(async move {
            hub.on_detection(Some("scan-s4"), "CVE-2024-0003", &format!("10.0.0.{i}"), 0)
                .await;
        }));
    }
    futures::future::join_all(handles).await;

    assert_eq!(sources.nvd_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sources.epss_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sources.kev_calls.load(Ordering::SeqCst), 1);

    let report = hub.end_scan("scan-s4").await.unwrap();
    assert_eq!(report.top_by_cvss.len(), 16);
}

// S5: every source fails. A score with empty sub-records and zero composite
// is still produced and the report is well-formed.
#[tokio::test]
async fn scenario_s5_all_sources_fail() {
    let sources = Arc::new(FakeSources::default());
    sources.fail_nvd.store(true, Ordering::SeqCst);
    sources.fail_epss.store(true, Ordering::SeqCst);
    sources.fail_kev.store(true, Ordering::SeqCst);

    let (hub, _archive) = build_hub(sources, None);
    hub.start_scan("scan-s5", ScanConfigSnapshot::default()).await;

    hub.on_detection(Some("scan-s5"), "CVE-2024-0004", "h", 0).await;

    let report = hub.end_scan("scan-s5").await.unwrap();
    assert_eq!(report.top_by_cvss.len(), 1);
    let score = &report.top_by_cvss[0].score;
    assert_eq!(score.ai_risk_score, 0.0);
    assert_eq!(score.ai_priority, Priority::Low);
    assert_eq!(score.ai_remediation_urgency, Urgency::Low);
    assert!(score.cvss_v3_1.is_none() && score.kev.is_none() && score.epss.is_none());
}

// KEV catalog fetched at most once per scan even across distinct CVEs.
#[tokio::test]
async fn kev_catalog_fetched_once_per_scan_across_distinct_cves() {
    let sources = Arc::new(FakeSources::default());
    let (hub, _archive) = build_hub(sources.clone(), None);
    hub.start_scan("scan-kev", ScanConfigSnapshot::default()).await;

    hub.on_detection(Some("scan-kev"), "CVE-2024-0010", "h", 0).await;
    hub.on_detection(Some("scan-kev"), "CVE-2024-0011", "h", 0).await;
    hub.on_detection(Some("scan-kev"), "CVE-2024-0012", "h", 0).await;

    assert_eq!(sources.kev_calls.load(Ordering::SeqCst), 1);
}

// Bad detections (empty host, malformed CVE id) are dropped, not fetched.
#[tokio::test]
async fn bad_detections_are_dropped() {
    let sources = Arc::new(FakeSources::default());
    let (hub, _archive) = build_hub(sources.clone(), None);
    hub.start_scan("scan-bad", ScanConfigSnapshot::default()).await;

    hub.on_detection(Some("scan-bad"), "not-a-cve", "h", 0).await;
    hub.on_detection(Some("scan-bad"), "CVE-2024-0001", "", 0).await;

    assert_eq!(sources.nvd_calls.load(Ordering::SeqCst), 0);
    let stats = hub.stats();
    assert_eq!(stats.bad_detections_dropped, 2);
}

// AI guidance is attached when the capability succeeds within its deadline.
#[tokio::test]
async fn ai_guidance_is_attached_when_enabled() {
    let sources = Arc::new(FakeSources::default());
    sources
        .nvd_responses
        .lock()
        .unwrap()
        .insert("CVE-2024-0020".to_string(), Some(high_nvd_record()));

    let ai: Arc<dyn warden_pipeline::AiCapability> =
        Arc::new(StaticGuidance("patch immediately".to_string()));
    let (hub, _archive) = build_hub(sources, Some(ai));

    let mut config = ScanConfigSnapshot::default();
    config.ai_enabled = true;
    hub.start_scan("scan-ai", config).await;

    hub.on_detection(Some("scan-ai"), "CVE-2024-0020", "h", 0).await;

    let report = hub.end_scan("scan-ai").await.unwrap();
    assert_eq!(
        report.top_by_cvss[0].score.ai_context.as_deref(),
        Some("patch immediately")
    );
}

// A hanging AI capability never blocks the detection beyond its deadline.
#[tokio::test]
async fn ai_guidance_deadline_does_not_block_detection() {
    let sources = Arc::new(FakeSources::default());
    let ai: Arc<dyn warden_pipeline::AiCapability> = Arc::new(HangingGuidance);
    let (hub, _archive) = build_hub(sources, Some(ai));

    let mut config = ScanConfigSnapshot::default();
    config.ai_enabled = true;
    config.ai_deadline_seconds = 0;
    hub.start_scan("scan-ai-timeout", config).await;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        hub.on_detection(Some("scan-ai-timeout"), "CVE-2024-0021", "h", 0),
    )
    .await;
    assert!(result.is_ok(), "on_detection must return promptly");

    let report = hub.end_scan("scan-ai-timeout").await.unwrap();
    assert!(report.top_by_cvss[0].score.ai_context.is_none());
}

// A failing AI capability is tolerated the same way.
#[tokio::test]
async fn ai_guidance_failure_is_tolerated() {
    let sources = Arc::new(FakeSources::default());
    let ai: Arc<dyn warden_pipeline::AiCapability> = Arc::new(FailingGuidance);
    let (hub, _archive) = build_hub(sources, Some(ai));

    let mut config = ScanConfigSnapshot::default();
    config.ai_enabled = true;
    hub.start_scan("scan-ai-fail", config).await;

    hub.on_detection(Some("scan-ai-fail"), "CVE-2024-0022", "h", 0)
        .await;

    let report = hub.end_scan("scan-ai-fail").await.unwrap();
    assert!(report.top_by_cvss[0].score.ai_context.is_none());
}
