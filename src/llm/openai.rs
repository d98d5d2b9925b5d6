use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use crate::config::{LlmConfig, LlmProvider};
use crate::errors::VulnAgentError;
use super::provider::LLMProvider;
use super::types::{LLMResponse, Message};

/// Client for any OpenAI-compatible `/chat/completions` endpoint
/// (OpenAI, Azure OpenAI, local model servers).
pub struct OpenAIProvider {
    client: Client,
    provider: LlmProvider,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAIProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, VulnAgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| VulnAgentError::Config(format!("Failed to build LLM client: {}", e)))?;
        Ok(Self {
            client,
            provider: config.provider,
            api_key: config.resolved_api_key(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(&self, messages: &[Message]) -> Result<LLMResponse, VulnAgentError> {
        let started = Instant::now();
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if !self.api_key.is_empty() {
            request = match self.provider {
                LlmProvider::Azure => request.header("api-key", &self.api_key),
                _ => request.bearer_auth(&self.api_key),
            };
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                VulnAgentError::Timeout(format!("{} request timed out", self.provider))
            } else {
                VulnAgentError::Network(format!("{} request failed: {}", self.provider, e))
            }
        })?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(VulnAgentError::RateLimit(format!("{} rate limit", self.provider)));
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(VulnAgentError::Authentication(format!("Invalid {} API key", self.provider)));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(VulnAgentError::LLMApi(format!(
                "API request failed with status {}: {}",
                status.as_u16(),
                crate::utils::truncation::elide(&text, 500)
            )));
        }

        let data: Value = resp.json().await
            .map_err(|e| VulnAgentError::LLMApi(format!("Failed to parse {} response: {}", self.provider, e)))?;

        if let Some(error) = data.get("error") {
            return Err(VulnAgentError::LLMApi(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| VulnAgentError::LLMApi("Invalid response format: no choices found".into()))?
            .to_string();

        Ok(LLMResponse {
            content,
            input_tokens: data["usage"]["prompt_tokens"].as_u64(),
            output_tokens: data["usage"]["completion_tokens"].as_u64(),
            response_time_ms: started.elapsed().as_millis() as u64,
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str { self.provider.as_str() }
    fn model_name(&self) -> &str { &self.model }
}
