//! `PipelineHub`: process-wide registry of active scans and dispatch point
//! for detection events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use warden_core::{CveId, WardenError, WardenResult};
use warden_scoring::VulnerabilityScore;

use crate::collaborators::{AiCapability, Archive, ReportAssembler};
use crate::context::{ScanConfigSnapshot, ScanContext, SharedScanContext};
use crate::enrich::build_score;
use crate::report::ScanReport;
use crate::sources::DetectionSources;
use crate::types::HostContext;

#[derive(Debug, Default)]
pub struct BridgeStatsSnapshot {
    pub detections_seen: u64,
    pub bad_detections_dropped: u64,
    pub kevs_seen: u64,
    pub criticals_seen: u64,
    pub ai_enhanced_count: u64,
    pub external_api_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub nvd_errors: u64,
    pub kev_errors: u64,
    pub epss_errors: u64,
    pub ai_errors: u64,
}

#[derive(Default)]
struct Stats {
    detections_seen: AtomicU64,
    bad_detections_dropped: AtomicU64,
    kevs_seen: AtomicU64,
    criticals_seen: AtomicU64,
    ai_enhanced_count: AtomicU64,
    external_api_calls: AtomicU64,
    nvd_errors: AtomicU64,
    kev_errors: AtomicU64,
    epss_errors: AtomicU64,
    ai_errors: AtomicU64,
}

/// Holds every live `ScanContext` by `scan_id`, the shared source fetchers,
/// and the archive/AI collaborators. Initialized once at process start.
pub struct PipelineHub {
    scan_contexts: RwLock<HashMap<String, SharedScanContext>>,
    sources: Arc<dyn DetectionSources>,
    report_assembler: Arc<dyn ReportAssembler>,
    archive: Arc<dyn Archive>,
    ai: Option<Arc<dyn AiCapability>>,
    stats: Arc<Stats>,
}

impl PipelineHub {
    pub fn new(
        sources: Arc<dyn DetectionSources>,
        report_assembler: Arc<dyn ReportAssembler>,
        archive: Arc<dyn Archive>,
        ai: Option<Arc<dyn AiCapability>>,
    ) -> Self {
        PipelineHub {
            scan_contexts: RwLock::new(HashMap::new()),
            sources,
            report_assembler,
            archive,
            ai,
            stats: Arc::new(Stats::default()),
        }
    }

    pub async fn start_scan(
        &self,
        scan_id: impl Into<String>,
        config: ScanConfigSnapshot,
    ) -> SharedScanContext {
        let scan_id = scan_id.into();
        let ctx = Arc::new(ScanContext::new(scan_id.clone(), config));
        self.scan_contexts
            .write()
            .await
            .insert(scan_id, ctx.clone());
        ctx
    }

    /// Looks up a scan by id, or — when `scan_id` is `None` — falls back to
    /// an arbitrary entry in the registry. That fallback is the defect
    /// preserved from the source system (see module docs on `PipelineHub`):
    /// callers that can propagate a real `scan_id` should always do so.
    async fn resolve_scan(&self, scan_id: Option<&str>) -> Option<SharedScanContext> {
        let guard = self.scan_contexts.read().await;
        match scan_id {
            Some(id) => guard.get(id).cloned(),
            None => guard.values().next().cloned(),
        }
    }

    pub async fn on_detection(&self, scan_id: Option<&str>, cve_id: &str, host: &str, port: u16) {
        self.on_detection_with_plugin(scan_id, cve_id, host, port, None, None)
            .await;
    }

    pub async fn on_detection_with_plugin(
        &self,
        scan_id: Option<&str>,
        cve_id: &str,
        host: &str,
        port: u16,
        _plugin_id: Option<String>,
        _description: Option<String>,
    ) {
        self.stats.detections_seen.fetch_add(1, Ordering::Relaxed);

        if host.is_empty() {
            self.stats
                .bad_detections_dropped
                .fetch_add(1, Ordering::Relaxed);
            tracing::warn!(cve = cve_id, "dropping detection: missing host");
            return;
        }

        let cve = match CveId::parse(cve_id) {
            Ok(cve) => cve,
            Err(err) => {
                self.stats
                    .bad_detections_dropped
                    .fetch_add(1, Ordering::Relaxed);
                tracing::warn!(cve = cve_id, error = %err, "dropping detection: bad cve_id");
                return;
            }
        };

        let Some(ctx) = self.resolve_scan(scan_id).await else {
            tracing::warn!(cve = cve_id, host, "dropping detection: no active scan");
            return;
        };

        let host_snapshot = HostContext::new(host.to_string());
        let sources = self.sources.clone();
        let ai = self.ai.clone();
        let stats = self.stats.clone();
        let ai_enabled = ctx.config.ai_enabled;
        let ai_deadline = Duration::from_secs(ctx.config.ai_deadline_seconds);
        let ctx_for_fetch = ctx.clone();

        let score = ctx
            .cache
            .get_or_fetch(&cve, move || {
                fetch_and_build(
                    sources,
                    ctx_for_fetch,
                    cve.clone(),
                    if ai_enabled { ai } else { None },
                    ai_deadline,
                    host_snapshot,
                    stats,
                )
            })
            .await;

        let Some(score) = score else {
            return;
        };

        if score.is_kev() {
            self.stats.kevs_seen.fetch_add(1, Ordering::Relaxed);
        }
        if score.ai_priority == warden_scoring::Priority::Critical {
            self.stats.criticals_seen.fetch_add(1, Ordering::Relaxed);
        }

        let mut hosts = ctx.hosts.lock().unwrap();
        hosts
            .entry(host.to_string())
            .or_insert_with(|| HostContext::new(host.to_string()))
            .record_finding(score, port);
    }

    /// Mirrors the cached score's enrichment fields into `record` in place.
    /// Returns `true` if a score was found and mirrored.
    pub async fn on_enhance_result(
        &self,
        scan_id: Option<&str>,
        record: &mut crate::detection::DetectionRecord,
    ) -> bool {
        let Some(ctx) = self.resolve_scan(scan_id).await else {
            return false;
        };

        let cve = record.cve_id.clone();
        let sources = self.sources.clone();
        let ai = self.ai.clone();
        let stats = self.stats.clone();
        let ai_enabled = ctx.config.ai_enabled;
        let ai_deadline = Duration::from_secs(ctx.config.ai_deadline_seconds);
        let host_snapshot = HostContext::new(record.host.clone());
        let ctx_for_fetch = ctx.clone();

        let Some(score) = ctx
            .cache
            .get_or_fetch(&cve, move || {
                fetch_and_build(
                    sources,
                    ctx_for_fetch,
                    cve.clone(),
                    if ai_enabled { ai } else { None },
                    ai_deadline,
                    host_snapshot,
                    stats,
                )
            })
            .await
        else {
            return false;
        };

        mirror_into_record(&score, record);
        true
    }

    /// Assembles the report, hands it to the archive, and drops the scan.
    /// `ArchiveWriteError` is the only error surfaced here.
    pub async fn end_scan(&self, scan_id: &str) -> WardenResult<ScanReport> {
        let ctx = self
            .scan_contexts
            .write()
            .await
            .remove(scan_id)
            .ok_or_else(|| WardenError::bad_detection(format!("unknown scan {scan_id}")))?;

        let report = self.report_assembler.assemble(&ctx);
        self.archive.save(scan_id, &report).await?;
        Ok(report)
    }

    pub fn stats(&self) -> BridgeStatsSnapshot {
        BridgeStatsSnapshot {
            detections_seen: self.stats.detections_seen.load(Ordering::Relaxed),
            bad_detections_dropped: self.stats.bad_detections_dropped.load(Ordering::Relaxed),
            kevs_seen: self.stats.kevs_seen.load(Ordering::Relaxed),
            criticals_seen: self.stats.criticals_seen.load(Ordering::Relaxed),
            ai_enhanced_count: self.stats.ai_enhanced_count.load(Ordering::Relaxed),
            external_api_calls: self.stats.external_api_calls.load(Ordering::Relaxed),
            cache_hits: 0,
            cache_misses: 0,
            nvd_errors: self.stats.nvd_errors.load(Ordering::Relaxed),
            kev_errors: self.stats.kev_errors.load(Ordering::Relaxed),
            epss_errors: self.stats.epss_errors.load(Ordering::Relaxed),
            ai_errors: self.stats.ai_errors.load(Ordering::Relaxed),
        }
    }

    pub async fn cache_stats_for(&self, scan_id: &str) -> Option<crate::cache::CacheStats> {
        let ctx = self.scan_contexts.read().await.get(scan_id)?.clone();
        Some(ctx.cache.stats())
    }
}

/// Runs once per cache miss: calls the three fetchers, decides whether the
/// SSVC stub applies (see `enrich::build_score`), assembles the score, and
/// — when AI is enabled — attaches remediation guidance before the score is
/// ever shared. Never mutated again after this returns (see `ScanContext`/
/// `HostContext` ownership discipline).
async fn fetch_and_build(
    sources: Arc<dyn DetectionSources>,
    ctx: Arc<ScanContext>,
    cve: CveId,
    ai: Option<Arc<dyn AiCapability>>,
    ai_deadline: Duration,
    host_snapshot: HostContext,
    stats: Arc<Stats>,
) -> Option<VulnerabilityScore> {
    stats.external_api_calls.fetch_add(1, Ordering::Relaxed);
    let nvd = match sources.fetch_nvd(&cve).await {
        Ok(v) => v,
        Err(err) => {
            stats.nvd_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(cve = %cve, error = %err, "NVD fetch failed");
            None
        }
    };

    stats.external_api_calls.fetch_add(1, Ordering::Relaxed);
    let epss = match sources.fetch_epss(&cve).await {
        Ok(v) => v,
        Err(err) => {
            stats.epss_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(cve = %cve, error = %err, "EPSS fetch failed");
            None
        }
    };

    let stats_for_kev = stats.clone();
    let sources_for_kev = sources.clone();
    let catalog = ctx
        .kev_catalog(move || async move {
            stats_for_kev
                .external_api_calls
                .fetch_add(1, Ordering::Relaxed);
            match sources_for_kev.fetch_kev_catalog().await {
                Ok(catalog) => Some(catalog),
                Err(err) => {
                    stats_for_kev.kev_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %err, "KEV catalog fetch failed");
                    None
                }
            }
        })
        .await;
    let kev = catalog.map(|c| c.lookup(&cve));

    let any_available = nvd.is_some() || kev.is_some() || epss.is_some();
    let ssvc = any_available.then(|| sources.derive_ssvc());

    let mut score = build_score(cve, nvd, kev, epss, ssvc);

    if let Some(ai) = ai {
        match tokio::time::timeout(ai_deadline, ai.guidance(&score, &host_snapshot)).await {
            Ok(Ok(text)) => {
                score.ai_context = Some(text);
                stats.ai_enhanced_count.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(err)) => {
                stats.ai_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %err, "AI guidance unavailable");
            }
            Err(_elapsed) => {
                stats.ai_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("AI guidance exceeded its deadline");
            }
        }
    }

    Some(score)
}

fn mirror_into_record(score: &VulnerabilityScore, record: &mut crate::detection::DetectionRecord) {
    record.cvss_base_score = score.highest_cvss_base_score();
    record.cvss_severity = score.highest_cvss_severity();
    record.is_kev = Some(score.is_kev());
    record.kev_due_date = score.kev.as_ref().and_then(|k| k.due_date.clone());
    record.epss_score = score.epss_score();
    record.epss_percentile = score.epss.as_ref().map(|e| e.percentile);
    record.ssvc_decision = score.ssvc_decision();
    record.ai_risk_score = Some(score.ai_risk_score);
    record.ai_priority = Some(score.ai_priority);
    record.remediation_guidance = score.ai_context.clone();
}
