use tracing::warn;
use crate::config::{LlmConfig, LlmProvider};
use crate::errors::VulnAgentError;
use super::provider::LLMProvider;
use super::openai::OpenAIProvider;

/// Every supported provider speaks the OpenAI chat-completions dialect.
/// Anthropic has no native client yet and goes through the same one.
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn LLMProvider>, VulnAgentError> {
    if config.provider == LlmProvider::Anthropic {
        warn!(base_url = %config.base_url, "No native Anthropic client, using OpenAI-compatible endpoint");
    }
    Ok(Box::new(OpenAIProvider::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_provider_routes_to_compatible_client() {
        for provider in [LlmProvider::OpenAI, LlmProvider::Azure, LlmProvider::Local, LlmProvider::Anthropic] {
            let config = LlmConfig { provider, ..LlmConfig::default() };
            let client = create_provider(&config).unwrap();
            assert_eq!(client.provider_name(), provider.as_str());
        }
    }
}
