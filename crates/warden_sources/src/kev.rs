//! KEV catalog fetcher. Fetched once per scan and linear-scanned per CVE —
//! never re-fetched within the same scan (see `ScanContext` in `warden_pipeline`).

use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use warden_core::{CveId, WardenResult};
use warden_scoring::KevInfo;

const DEFAULT_KEV_URL: &str =
    "https://www.cisa.gov/sites/default/files/feeds/known_exploited_vulnerabilities.json";

pub struct KevClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl KevClient {
    pub fn new(http: reqwest::Client, user_agent: String) -> Self {
        KevClient {
            http,
            base_url: DEFAULT_KEV_URL.to_string(),
            user_agent,
        }
    }

    /// GETs the full catalog. No rate gate — this is called at most once per
    /// scan. Returns `Err` only on a network-level failure; a non-200 or a
    /// parse failure yields an empty catalog so every subsequent lookup is a
    /// clean miss rather than a hard failure.
    pub async fn fetch_catalog(&self) -> WardenResult<KevCatalog> {
        tracing::debug!("fetching KEV catalog");

        let response = self
            .http
            .get(&self.base_url)
            .header("User-Agent", &self.user_agent)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "KEV catalog fetch returned non-200");
            return Ok(KevCatalog::empty());
        }

        let body: CatalogResponse = match response.json().await {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(error = %err, "failed to parse KEV catalog");
                return Ok(KevCatalog::empty());
            }
        };

        Ok(KevCatalog {
            entries: body.vulnerabilities,
        })
    }
}

#[derive(Clone)]
pub struct KevCatalog {
    entries: Vec<Entry>,
}

impl KevCatalog {
    pub fn empty() -> Self {
        KevCatalog { entries: Vec::new() }
    }

    /// Test-only constructor for a catalog containing one entry, used by
    /// fakes that need to exercise the KEV-hit path without a network call.
    #[cfg(any(test, feature = "test-util"))]
    pub fn with_single_entry(
        cve_id: &str,
        date_added: &str,
        due_date: &str,
        required_action: &str,
    ) -> Self {
        KevCatalog {
            entries: vec![Entry {
                cve_id: cve_id.to_string(),
                date_added: date_added.to_string(),
                due_date: due_date.to_string(),
                required_action: required_action.to_string(),
                known_ransomware_campaign_use: None,
                notes: None,
            }],
        }
    }

    /// Linear-scan lookup — the catalog is a few thousand entries at most and
    /// is scanned once per distinct CVE within a scan, not per detection.
    pub fn lookup(&self, cve_id: &CveId) -> KevInfo {
        let now = Utc::now().to_rfc3339();
        match self.entries.iter().find(|e| e.cve_id == cve_id.as_str()) {
            Some(entry) => KevInfo {
                is_kev: true,
                date_added: Some(entry.date_added.clone()),
                due_date: Some(entry.due_date.clone()),
                required_action: Some(entry.required_action.clone()),
                known_ransomware_use: entry
                    .known_ransomware_campaign_use
                    .as_deref()
                    .map(|v| v.eq_ignore_ascii_case("known"))
                    .unwrap_or(false),
                notes: entry.notes.clone().filter(|n| !n.is_empty()),
                last_updated: now,
            },
            None => KevInfo {
                is_kev: false,
                date_added: None,
                due_date: None,
                required_action: None,
                known_ransomware_use: false,
                notes: None,
                last_updated: now,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    vulnerabilities: Vec<Entry>,
}

#[derive(Debug, Deserialize, Clone)]
struct Entry {
    #[serde(rename = "cveID")]
    cve_id: String,
    #[serde(rename = "dateAdded")]
    date_added: String,
    #[serde(rename = "dueDate")]
    due_date: String,
    #[serde(rename = "requiredAction")]
    required_action: String,
    #[serde(rename = "knownRansomwareCampaignUse")]
    known_ransomware_campaign_use: Option<String>,
    notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> KevCatalog {
        KevCatalog {
            entries: vec![Entry {
                cve_id: "CVE-2021-44228".to_string(),
                date_added: "2021-12-10".to_string(),
                due_date: "2021-12-24".to_string(),
                required_action: "Apply updates".to_string(),
                known_ransomware_campaign_use: Some("Known".to_string()),
                notes: None,
            }],
        }
    }

    #[test]
    fn matching_cve_is_flagged_as_kev() {
        let catalog = sample_catalog();
        let info = catalog.lookup(&CveId::parse("CVE-2021-44228").unwrap());
        assert!(info.is_kev);
        assert_eq!(info.due_date.as_deref(), Some("2021-12-24"));
        assert!(info.known_ransomware_use);
    }

    #[test]
    fn non_matching_cve_is_a_clean_miss() {
        let catalog = sample_catalog();
        let info = catalog.lookup(&CveId::parse("CVE-2024-0001").unwrap());
        assert!(!info.is_kev);
        assert!(info.due_date.is_none());
    }

    #[test]
    fn empty_catalog_misses_everything() {
        let catalog = KevCatalog::empty();
        let info = catalog.lookup(&CveId::parse("CVE-2024-0001").unwrap());
        assert!(!info.is_kev);
    }
}
