//! Typed configuration snapshot: built-in TOML defaults, optional user
//! file, then `WARDEN__`-prefixed environment variables, in that order of
//! precedence. Read once per scan and never consulted again afterward.

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use warden_core::{WardenError, WardenResult};
use warden_pipeline::context::ScanConfigSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub ai_enable_vulnerability_analysis: bool,
    #[serde(default = "default_ai_provider")]
    pub ai_provider: String,
    #[serde(default)]
    pub ai_api_key: Option<String>,
    #[serde(default = "default_service_timeout_seconds")]
    pub service_timeout_seconds: u64,
    #[serde(default = "default_rate_limit_nvd_ms")]
    pub rate_limit_nvd_ms: u64,
    #[serde(default = "default_rate_limit_epss_ms")]
    pub rate_limit_epss_ms: u64,
    #[serde(default = "default_top_k")]
    pub top_k_cvss: usize,
    #[serde(default = "default_top_k")]
    pub top_k_epss: usize,
    #[serde(default = "default_ai_deadline_seconds")]
    pub ai_deadline_seconds: u64,
    #[serde(default = "default_archive_path")]
    pub archive_path: PathBuf,
}

fn default_ai_provider() -> String {
    "openai".to_string()
}

fn default_service_timeout_seconds() -> u64 {
    30
}

fn default_rate_limit_nvd_ms() -> u64 {
    6000
}

fn default_rate_limit_epss_ms() -> u64 {
    1000
}

fn default_top_k() -> usize {
    10
}

fn default_ai_deadline_seconds() -> u64 {
    5
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("./warden-archive.redb")
}

const DEFAULT_CONFIG: &str = r#"
ai_enable_vulnerability_analysis = false
ai_provider = "openai"
service_timeout_seconds = 30
rate_limit_nvd_ms = 6000
rate_limit_epss_ms = 1000
top_k_cvss = 10
top_k_epss = 10
ai_deadline_seconds = 5
archive_path = "./warden-archive.redb"
"#;

impl Default for WardenConfig {
    fn default() -> Self {
        WardenConfig {
            ai_enable_vulnerability_analysis: false,
            ai_provider: default_ai_provider(),
            ai_api_key: None,
            service_timeout_seconds: default_service_timeout_seconds(),
            rate_limit_nvd_ms: default_rate_limit_nvd_ms(),
            rate_limit_epss_ms: default_rate_limit_epss_ms(),
            top_k_cvss: default_top_k(),
            top_k_epss: default_top_k(),
            ai_deadline_seconds: default_ai_deadline_seconds(),
            archive_path: default_archive_path(),
        }
    }
}

impl WardenConfig {
    /// Loads built-in defaults, layers an optional user file over them,
    /// then `WARDEN__`-prefixed environment variables over that.
    pub fn load(user_config_path: Option<PathBuf>) -> WardenResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("WARDEN")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|err| WardenError::config(err.to_string()))?;

        built
            .try_deserialize()
            .map_err(|err| WardenError::config(err.to_string()))
    }

    /// Projects this configuration into the per-scan snapshot the pipeline
    /// consumes. API keys never flow further than this call.
    pub fn to_scan_config_snapshot(&self) -> ScanConfigSnapshot {
        ScanConfigSnapshot {
            ai_enabled: self.ai_enable_vulnerability_analysis,
            ai_provider: self.ai_provider.clone(),
            ai_api_key: self.ai_api_key.clone(),
            service_timeout_seconds: self.service_timeout_seconds,
            rate_limit_nvd_ms: self.rate_limit_nvd_ms,
            rate_limit_epss_ms: self.rate_limit_epss_ms,
            top_k_cvss: self.top_k_cvss,
            top_k_epss: self.top_k_epss,
            ai_deadline_seconds: self.ai_deadline_seconds,
        }
    }
}
