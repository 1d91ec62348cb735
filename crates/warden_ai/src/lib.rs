//! Concrete `AiCapability`: remediation guidance from Anthropic's Messages
//! API. A network or parse failure is always recovered by the caller (see
//! `warden_pipeline::hub::fetch_and_build`), never retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use warden_core::{WardenError, WardenResult};
use warden_pipeline::collaborators::AiCapability;
use warden_pipeline::types::HostContext;
use warden_scoring::VulnerabilityScore;

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const CLAUDE_API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    system: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

/// Remediation-guidance capability backed by Claude. Constructed once per
/// process and shared across scans.
pub struct ClaudeGuidance {
    api_key: String,
    model: String,
    client: Client,
}

impl ClaudeGuidance {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> WardenResult<Self> {
        let api_key = api_key.into();
        let model = model.into();

        if api_key.is_empty() {
            return Err(WardenError::ai_unavailable("Claude API key cannot be empty"));
        }
        if model.is_empty() {
            return Err(WardenError::ai_unavailable("Claude model name cannot be empty"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WardenError::ai_unavailable(format!("failed to build HTTP client: {e}")))?;

        tracing::info!(model = %model, "Claude guidance capability ready");

        Ok(ClaudeGuidance {
            api_key,
            model,
            client,
        })
    }

    fn build_request(&self, score: &VulnerabilityScore, host: &HostContext) -> ClaudeRequest {
        let prompt = format!(
            "Vulnerability {} on host {}. Severity: {:?}. EPSS: {:?}. KEV: {}. \
             Give a short, actionable remediation recommendation (2-3 sentences).",
            score.cve_id.as_str(),
            host.ip,
            score.highest_cvss_severity(),
            score.epss_score(),
            score.is_kev(),
        );

        ClaudeRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            system: "You are a security expert assistant providing concise, actionable \
                     vulnerability remediation guidance."
                .to_string(),
        }
    }

    async fn send_request(&self, request: &ClaudeRequest) -> WardenResult<ClaudeResponse> {
        let inquiry_id = uuid::Uuid::new_v4();
        tracing::debug!(%inquiry_id, "sending guidance request to Claude");

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", CLAUDE_API_VERSION)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| WardenError::ai_unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(WardenError::ai_unavailable(format!(
                "Claude API error ({status}): {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WardenError::ai_unavailable(format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl AiCapability for ClaudeGuidance {
    async fn guidance(
        &self,
        score: &VulnerabilityScore,
        host: &HostContext,
    ) -> Result<String, WardenError> {
        let request = self.build_request(score, host);
        let response = self.send_request(&request).await?;

        let text = response
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(WardenError::ai_unavailable(
                "Claude response contained no text content",
            ));
        }

        if response.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!(cve = score.cve_id.as_str(), "Claude guidance truncated at max_tokens");
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let result = ClaudeGuidance::new("", "claude-3-sonnet-20240229");
        assert!(result.is_err());
    }

    #[test]
    fn empty_model_is_rejected() {
        let result = ClaudeGuidance::new("test-key", "");
        assert!(result.is_err());
    }

    #[test]
    fn valid_construction_succeeds() {
        let guidance = ClaudeGuidance::new("test-key", "claude-3-sonnet-20240229").unwrap();
        assert_eq!(guidance.model, "claude-3-sonnet-20240229");
    }

    #[test]
    fn build_request_embeds_cve_and_host() {
        let guidance = ClaudeGuidance::new("test-key", "claude-3-sonnet-20240229").unwrap();
        let score = VulnerabilityScore::new(warden_core::CveId::parse("CVE-2024-0001").unwrap());
        let host = HostContext::new("10.0.0.5".to_string());

        let request = guidance.build_request(&score, &host);
        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0].content.contains("CVE-2024-0001"));
        assert!(request.messages[0].content.contains("10.0.0.5"));
    }
}
