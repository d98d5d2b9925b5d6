use async_trait::async_trait;
use crate::errors::VulnAgentError;
use super::types::{LLMResponse, Message};

const CONNECTION_PROBE: &str = "Hello! Can you respond with just 'OK'?";

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// One chat completion over the full conversation so far.
    async fn chat(&self, messages: &[Message]) -> Result<LLMResponse, VulnAgentError>;

    /// Round-trip a trivial prompt to prove credentials and endpoint work.
    async fn test_connection(&self) -> Result<(), VulnAgentError> {
        self.chat(&[Message::user(CONNECTION_PROBE)]).await.map(|_| ())
    }

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;
}
