pub mod commands;
pub mod check;
pub mod payloads;
pub mod scan;
pub mod validate;

pub use commands::{Cli, Commands};

use commands::LlmArgs;
use vulnagent::config::{self, ProbeConfig};
use vulnagent::errors::VulnAgentError;

/// Configuration file (if any) with command-line LLM settings layered on top.
pub async fn effective_config(args: &LlmArgs) -> Result<ProbeConfig, VulnAgentError> {
    let mut config = match &args.config {
        Some(path) => config::parse_config(path).await?,
        None => ProbeConfig::default(),
    };
    if let Some(provider) = &args.provider {
        config.llm.provider = provider.parse()?;
    }
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if let Some(key) = &args.api_key {
        config.llm.api_key = key.clone();
    }
    if let Some(url) = &args.base_url {
        config.llm.base_url = url.clone();
    }
    Ok(config)
}
