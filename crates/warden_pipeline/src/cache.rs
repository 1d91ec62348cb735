//! Per-scan CVE→score map with single-flight fetch coalescing.
//!
//! The teacher's cache (`the_assessor::scoring::TheAssessor::score_cache`) is
//! a plain `RwLock<HashMap>` with no coalescing: concurrent misses on the
//! same key would duplicate the fetch. This cache adds a per-key latch
//! (`tokio::sync::OnceCell`) so exactly one caller performs the fetch and
//! every other concurrent caller for the same key awaits that same result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};

use warden_core::CveId;
use warden_scoring::VulnerabilityScore;

type Slot = Arc<OnceCell<Option<Arc<VulnerabilityScore>>>>;

#[derive(Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct FingerprintCache {
    entries: RwLock<HashMap<CveId, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FingerprintCache {
    pub fn new() -> Self {
        FingerprintCache {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached entry, or runs `fetch` exactly once per concurrent
    /// miss on `cve_id` and returns its result to every waiter. A fetch that
    /// resolves to `None` is not retained — the next call retries from
    /// scratch.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        cve_id: &CveId,
        fetch: F,
    ) -> Option<Arc<VulnerabilityScore>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<VulnerabilityScore>>,
    {
        let slot = {
            let existing = self.entries.read().await.get(cve_id).cloned();
            match existing {
                Some(slot) => slot,
                None => {
                    let mut guard = self.entries.write().await;
                    guard
                        .entry(cve_id.clone())
                        .or_insert_with(|| Arc::new(OnceCell::new()))
                        .clone()
                }
            }
        };

        if slot.initialized() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }

        let result = slot
            .get_or_init(|| async { fetch().await.map(Arc::new) })
            .await
            .clone();

        if result.is_none() {
            let mut guard = self.entries.write().await;
            if let Some(current) = guard.get(cve_id) {
                if Arc::ptr_eq(current, &slot) {
                    guard.remove(cve_id);
                }
            }
        }

        result
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn cve(id: &str) -> CveId {
        CveId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn second_call_is_a_cache_hit_and_returns_the_same_arc() {
        let cache = FingerprintCache::new();
        let id = cve("CVE-2024-0001");

        let first = cache
            .get_or_fetch(&id, || async { Some(VulnerabilityScore::new(id.clone())) })
            .await
            .unwrap();
        let second = cache
            .get_or_fetch(&id, || async { panic!("must not fetch twice") })
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached_and_retries() {
        let cache = FingerprintCache::new();
        let id = cve("CVE-2024-0002");

        let first = cache.get_or_fetch(&id, || async { None }).await;
        assert!(first.is_none());

        let second = cache
            .get_or_fetch(&id, || async { Some(VulnerabilityScore::new(id.clone())) })
            .await;
        assert!(second.is_some());
    }

    // S4: 16 concurrent callers on the same CVE trigger exactly one fetch,
    // and all end up holding the same shared score reference.
    #[tokio::test]
    async fn scenario_s4_single_flight_under_concurrency() {
        let cache = Arc::new(FingerprintCache::new());
        let id = cve("CVE-2024-0003");
        let fetch_count = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let id = id.clone();
            let fetch_count = fetch_count.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(&id, || {
                        let fetch_count = fetch_count.clone();
                        let id = id.clone();
                        async move {
                            fetch_count.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            Some(VulnerabilityScore::new(id))
                        }
                    })
                    .await
            }));
        }

        let results: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(fetch_count.load(Ordering::SeqCst), 1);
        for pair in results.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }

    #[tokio::test]
    async fn distinct_keys_proceed_independently() {
        let cache = FingerprintCache::new();
        let a = cache
            .get_or_fetch(&cve("CVE-2024-0004"), || async {
                Some(VulnerabilityScore::new(cve("CVE-2024-0004")))
            })
            .await;
        let b = cache
            .get_or_fetch(&cve("CVE-2024-0005"), || async {
                Some(VulnerabilityScore::new(cve("CVE-2024-0005")))
            })
            .await;
        assert!(a.is_some() && b.is_some());
        assert_eq!(cache.len().await, 2);
    }
}
