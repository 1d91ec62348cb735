//! Wires the three HTTP fetchers and the local SSVC stub together behind a
//! single shared `reqwest::Client`, built once per process.

use std::sync::Arc;
use std::time::Duration;

use warden_core::{RateGate, WardenResult};

use crate::epss::EpssClient;
use crate::kev::KevClient;
use crate::nvd::NvdClient;

const DEFAULT_USER_AGENT: &str = concat!("warden/", env!("CARGO_PKG_VERSION"));

pub struct SourceClients {
    pub nvd: NvdClient,
    pub kev: KevClient,
    pub epss: EpssClient,
}

impl SourceClients {
    pub fn new(
        nvd_rate_gate: Arc<RateGate>,
        epss_rate_gate: Arc<RateGate>,
        service_timeout: Duration,
    ) -> WardenResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(service_timeout)
            .build()?;

        Ok(SourceClients {
            nvd: NvdClient::new(http.clone(), nvd_rate_gate, DEFAULT_USER_AGENT.to_string()),
            kev: KevClient::new(http.clone(), DEFAULT_USER_AGENT.to_string()),
            epss: EpssClient::new(http, epss_rate_gate, DEFAULT_USER_AGENT.to_string()),
        })
    }
}
