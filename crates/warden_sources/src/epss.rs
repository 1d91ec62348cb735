//! EPSS per-CVE fetcher.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use warden_core::{CveId, RateGate, WardenResult};
use warden_scoring::EpssInfo;

const DEFAULT_EPSS_URL: &str = "https://api.first.org/data/v1/epss";

pub struct EpssClient {
    http: reqwest::Client,
    rate_gate: Arc<RateGate>,
    base_url: String,
    user_agent: String,
}

impl EpssClient {
    pub fn new(http: reqwest::Client, rate_gate: Arc<RateGate>, user_agent: String) -> Self {
        EpssClient {
            http,
            rate_gate,
            base_url: DEFAULT_EPSS_URL.to_string(),
            user_agent,
        }
    }

    /// Returns `None` on an empty `data[]`, a non-200, or a parse failure.
    pub async fn fetch(&self, cve_id: &CveId) -> WardenResult<Option<EpssInfo>> {
        self.rate_gate.acquire().await;

        tracing::debug!(cve = %cve_id, "fetching EPSS record");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("cve", cve_id.as_str())])
            .header("User-Agent", &self.user_agent)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(cve = %cve_id, status = %response.status(), "EPSS returned non-200");
            return Ok(None);
        }

        let body: ApiResponse = match response.json().await {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(cve = %cve_id, error = %err, "failed to parse EPSS response");
                return Ok(None);
            }
        };

        let Some(entry) = body.data.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(EpssInfo {
            score: entry.epss.parse().unwrap_or(0.0),
            percentile: entry.percentile.parse().unwrap_or(0.0),
            model_version: body.model_version.unwrap_or_else(|| "unknown".to_string()),
            date: entry.date,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    data: Vec<DataEntry>,
    #[serde(rename = "model-version")]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataEntry {
    epss: String,
    percentile: String,
    date: String,
}
