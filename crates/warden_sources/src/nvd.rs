//! NVD per-CVE fetcher.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use warden_core::{CveId, RateGate, WardenResult};
use warden_scoring::cvss::parse_cvss_v3_vector;
use warden_scoring::{CvssSeverity, CvssV2, CvssV2Base, CvssV3};

const DEFAULT_NVD_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";

/// Everything the NVD fetcher can hand back for one CVE.
#[derive(Debug, Clone, Default)]
pub struct NvdRecord {
    pub description: Option<String>,
    pub published: Option<String>,
    pub last_modified: Option<String>,
    pub cwe_ids: Vec<String>,
    pub cvss_v3_1: Option<CvssV3>,
    pub cvss_v3_0: Option<CvssV3>,
    pub cvss_v2: Option<CvssV2>,
}

pub struct NvdClient {
    http: reqwest::Client,
    rate_gate: Arc<RateGate>,
    base_url: String,
    user_agent: String,
}

impl NvdClient {
    pub fn new(http: reqwest::Client, rate_gate: Arc<RateGate>, user_agent: String) -> Self {
        NvdClient {
            http,
            rate_gate,
            base_url: DEFAULT_NVD_URL.to_string(),
            user_agent,
        }
    }

    /// GETs a single CVE. Returns `None` on non-200, empty `vulnerabilities[]`,
    /// or a parse failure — the caller logs and moves on, per the fetcher
    /// contract. Only network-level errors propagate as `Err`.
    pub async fn fetch(&self, cve_id: &CveId) -> WardenResult<Option<NvdRecord>> {
        self.rate_gate.acquire().await;

        tracing::debug!(cve = %cve_id, "fetching NVD record");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("cveId", cve_id.as_str())])
            .header("User-Agent", &self.user_agent)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(cve = %cve_id, status = %response.status(), "NVD returned non-200");
            return Ok(None);
        }

        let body: ApiResponse = match response.json().await {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(cve = %cve_id, error = %err, "failed to parse NVD response");
                return Ok(None);
            }
        };

        let Some(first) = body.vulnerabilities.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(to_record(first.cve)))
    }
}

fn to_record(cve: Cve) -> NvdRecord {
    let description = cve
        .descriptions
        .into_iter()
        .next()
        .map(|d| d.value)
        .filter(|v| !v.is_empty());

    let cwe_ids = cve
        .weaknesses
        .into_iter()
        .flat_map(|w| w.description)
        .map(|d| d.value)
        .collect();

    let cvss_v3_1 = cve
        .metrics
        .cvss_metric_v31
        .and_then(|metrics| metrics.into_iter().next())
        .and_then(|m| to_cvss_v3(m.cvss_data));

    let cvss_v3_0 = cve
        .metrics
        .cvss_metric_v30
        .and_then(|metrics| metrics.into_iter().next())
        .and_then(|m| to_cvss_v3(m.cvss_data));

    let cvss_v2 = cve
        .metrics
        .cvss_metric_v2
        .and_then(|metrics| metrics.into_iter().next())
        .map(|m| to_cvss_v2(m.cvss_data));

    NvdRecord {
        description,
        published: Some(cve.published),
        last_modified: Some(cve.last_modified),
        cwe_ids,
        cvss_v3_1,
        cvss_v3_0,
        cvss_v2,
    }
}

fn to_cvss_v3(data: Cvss3Data) -> Option<CvssV3> {
    let base_metrics = parse_cvss_v3_vector(&data.vector_string).ok()?;
    let severity = CvssSeverity::from_v3_score(data.base_score as f64);
    Some(CvssV3 {
        base_metrics,
        base_score: data.base_score as f64,
        severity,
        vector_string: data.vector_string,
    })
}

fn to_cvss_v2(data: Cvss2Data) -> CvssV2 {
    let severity = CvssSeverity::from_v2_score(data.base_score as f64);
    CvssV2 {
        base_metrics: CvssV2Base {
            access_vector: data.access_vector,
            access_complexity: data.access_complexity,
            authentication: data.authentication,
            confidentiality_impact: data.confidentiality_impact,
            integrity_impact: data.integrity_impact,
            availability_impact: data.availability_impact,
        },
        base_score: data.base_score as f64,
        severity,
        vector_string: data.vector_string,
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    vulnerabilities: Vec<VulnerabilityEnvelope>,
}

#[derive(Debug, Deserialize)]
struct VulnerabilityEnvelope {
    cve: Cve,
}

#[derive(Debug, Deserialize)]
struct Cve {
    published: String,
    #[serde(rename = "lastModified")]
    last_modified: String,
    descriptions: Vec<Description>,
    #[serde(default)]
    weaknesses: Vec<Weakness>,
    metrics: Metrics,
}

#[derive(Debug, Deserialize)]
struct Description {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Weakness {
    description: Vec<Description>,
}

#[derive(Debug, Deserialize, Default)]
struct Metrics {
    #[serde(rename = "cvssMetricV31")]
    cvss_metric_v31: Option<Vec<CvssMetric<Cvss3Data>>>,
    #[serde(rename = "cvssMetricV30")]
    cvss_metric_v30: Option<Vec<CvssMetric<Cvss3Data>>>,
    #[serde(rename = "cvssMetricV2")]
    cvss_metric_v2: Option<Vec<CvssMetric<Cvss2Data>>>,
}

#[derive(Debug, Deserialize)]
struct CvssMetric<T> {
    #[serde(rename = "cvssData")]
    cvss_data: T,
}

#[derive(Debug, Deserialize)]
struct Cvss3Data {
    #[serde(rename = "vectorString")]
    vector_string: String,
    #[serde(rename = "baseScore")]
    base_score: f32,
}

#[derive(Debug, Deserialize)]
struct Cvss2Data {
    #[serde(rename = "vectorString")]
    vector_string: String,
    #[serde(rename = "accessVector")]
    access_vector: String,
    #[serde(rename = "accessComplexity")]
    access_complexity: String,
    authentication: String,
    #[serde(rename = "confidentialityImpact")]
    confidentiality_impact: String,
    #[serde(rename = "integrityImpact")]
    integrity_impact: String,
    #[serde(rename = "availabilityImpact")]
    availability_impact: String,
    #[serde(rename = "baseScore")]
    base_score: f32,
}
