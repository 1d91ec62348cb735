//! `ScanContext`: everything owned by one in-progress scan — the
//! fingerprint cache, the per-host map, a snapshotted config, and timing.
//! Created at scan-start, destroyed once its report has been handed off.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::cache::FingerprintCache;
use crate::types::HostContext;
use warden_sources::KevCatalog;

#[derive(Debug, Clone)]
pub struct ScanConfigSnapshot {
    pub ai_enabled: bool,
    pub ai_provider: String,
    pub ai_api_key: Option<String>,
    pub service_timeout_seconds: u64,
    pub rate_limit_nvd_ms: u64,
    pub rate_limit_epss_ms: u64,
    pub top_k_cvss: usize,
    pub top_k_epss: usize,
    pub ai_deadline_seconds: u64,
}

impl Default for ScanConfigSnapshot {
    fn default() -> Self {
        ScanConfigSnapshot {
            ai_enabled: false,
            ai_provider: "openai".to_string(),
            ai_api_key: None,
            service_timeout_seconds: 30,
            rate_limit_nvd_ms: 6_000,
            rate_limit_epss_ms: 1_000,
            top_k_cvss: 10,
            top_k_epss: 10,
            ai_deadline_seconds: 5,
        }
    }
}

/// One active scan. `hosts` is guarded by a single blocking mutex: per spec
/// the discipline is "a per-host mutex", which we approximate with one
/// mutex over the host map. Critical sections never span an `.await` — the
/// network fetch happens before the lock is taken, so a blocking `Mutex` is
/// correct and lets `ReportAssembler` read the map synchronously too.
pub struct ScanContext {
    pub scan_id: String,
    pub config: ScanConfigSnapshot,
    pub cache: FingerprintCache,
    pub hosts: Mutex<HashMap<String, HostContext>>,
    pub start_time: DateTime<Utc>,
    /// Fetched at most once per scan. `None` means the catalog fetch itself
    /// failed this scan — every lookup then sees "unavailable", not a clean
    /// miss (see `enrich::build_score`).
    kev_catalog: OnceCell<Option<KevCatalog>>,
}

impl ScanContext {
    pub fn new(scan_id: impl Into<String>, config: ScanConfigSnapshot) -> Self {
        ScanContext {
            scan_id: scan_id.into(),
            config,
            cache: FingerprintCache::new(),
            hosts: Mutex::new(HashMap::new()),
            start_time: Utc::now(),
            kev_catalog: OnceCell::new(),
        }
    }

    /// Runs `fetch` at most once for the lifetime of this scan, regardless
    /// of how many CVEs are looked up against it.
    pub async fn kev_catalog<F, Fut>(&self, fetch: F) -> Option<&KevCatalog>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Option<KevCatalog>>,
    {
        self.kev_catalog
            .get_or_init(|| async { fetch().await })
            .await
            .as_ref()
    }
}

pub type SharedScanContext = Arc<ScanContext>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_context_starts_with_no_hosts() {
        let ctx = ScanContext::new("scan-1", ScanConfigSnapshot::default());
        assert!(ctx.hosts.lock().unwrap().is_empty());
        assert_eq!(ctx.cache.len().await, 0);
    }
}
