//! Seam between the pipeline and the concrete HTTP fetchers in
//! `warden_sources`, so tests can inject a fake without a network.

use async_trait::async_trait;

use warden_core::{CveId, WardenResult};
use warden_scoring::{EpssInfo, SsvcInfo};
use warden_sources::{KevCatalog, NvdRecord, SourceClients};

#[async_trait]
pub trait DetectionSources: Send + Sync {
    async fn fetch_nvd(&self, cve_id: &CveId) -> WardenResult<Option<NvdRecord>>;
    async fn fetch_epss(&self, cve_id: &CveId) -> WardenResult<Option<EpssInfo>>;
    async fn fetch_kev_catalog(&self) -> WardenResult<KevCatalog>;
    fn derive_ssvc(&self) -> SsvcInfo;
}

#[async_trait]
impl DetectionSources for SourceClients {
    async fn fetch_nvd(&self, cve_id: &CveId) -> WardenResult<Option<NvdRecord>> {
        self.nvd.fetch(cve_id).await
    }

    async fn fetch_epss(&self, cve_id: &CveId) -> WardenResult<Option<EpssInfo>> {
        self.epss.fetch(cve_id).await
    }

    async fn fetch_kev_catalog(&self) -> WardenResult<KevCatalog> {
        self.kev.fetch_catalog().await
    }

    fn derive_ssvc(&self) -> SsvcInfo {
        warden_sources::ssvc::derive()
    }
}

/// Test doubles for `DetectionSources`. Always compiled (not `cfg(test)`)
/// so both this crate's unit tests and downstream integration tests /
/// other crates' test suites can use them without feature-flag plumbing.
pub mod fakes {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned responses keyed by CVE id, plus a call counter so tests can
    /// assert single-flight behavior the way scenario S4 describes.
    pub struct FakeSources {
        pub nvd_responses: Mutex<std::collections::HashMap<String, Option<NvdRecord>>>,
        pub epss_responses: Mutex<std::collections::HashMap<String, Option<EpssInfo>>>,
        pub kev_catalog: Mutex<KevCatalog>,
        pub ssvc: SsvcInfo,
        pub fail_nvd: std::sync::atomic::AtomicBool,
        pub fail_epss: std::sync::atomic::AtomicBool,
        pub fail_kev: std::sync::atomic::AtomicBool,
        pub nvd_calls: AtomicUsize,
        pub epss_calls: AtomicUsize,
        pub kev_calls: AtomicUsize,
    }

    impl Default for FakeSources {
        fn default() -> Self {
            FakeSources {
                nvd_responses: Mutex::new(std::collections::HashMap::new()),
                epss_responses: Mutex::new(std::collections::HashMap::new()),
                kev_catalog: Mutex::new(KevCatalog::empty()),
                ssvc: SsvcInfo::default_stub(),
                fail_nvd: std::sync::atomic::AtomicBool::new(false),
                fail_epss: std::sync::atomic::AtomicBool::new(false),
                fail_kev: std::sync::atomic::AtomicBool::new(false),
                nvd_calls: AtomicUsize::new(0),
                epss_calls: AtomicUsize::new(0),
                kev_calls: AtomicUsize::new(0),
            }
        }
    }

    fn transport_error() -> warden_core::WardenError {
        warden_core::WardenError::FetchHttp(0)
    }

    #[async_trait]
    impl DetectionSources for FakeSources {
        async fn fetch_nvd(&self, cve_id: &CveId) -> WardenResult<Option<NvdRecord>> {
            self.nvd_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_nvd.load(Ordering::SeqCst) {
                return Err(transport_error());
            }
            Ok(self
                .nvd_responses
                .lock()
                .unwrap()
                .get(cve_id.as_str())
                .cloned()
                .unwrap_or(None))
        }

        async fn fetch_epss(&self, cve_id: &CveId) -> WardenResult<Option<EpssInfo>> {
            self.epss_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_epss.load(Ordering::SeqCst) {
                return Err(transport_error());
            }
            Ok(self
                .epss_responses
                .lock()
                .unwrap()
                .get(cve_id.as_str())
                .cloned()
                .unwrap_or(None))
        }

        async fn fetch_kev_catalog(&self) -> WardenResult<KevCatalog> {
            self.kev_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_kev.load(Ordering::SeqCst) {
                return Err(transport_error());
            }
            Ok(self.kev_catalog.lock().unwrap().clone())
        }

        fn derive_ssvc(&self) -> SsvcInfo {
            self.ssvc.clone()
        }
    }
}
