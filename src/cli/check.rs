use console::style;
use tracing::info;

use crate::cli::commands::CheckArgs;
use crate::cli::effective_config;
use vulnagent::config::credentials::mask_key;
use vulnagent::errors::VulnAgentError;
use vulnagent::llm::create_provider;

pub async fn handle_check(args: CheckArgs) -> Result<(), VulnAgentError> {
    let config = effective_config(&args.llm).await?;
    config.validate_ready()?;

    let provider = create_provider(&config.llm)?;
    info!(provider = provider.provider_name(), model = provider.model_name(), "Testing LLM connection");
    provider.test_connection().await?;

    let key = config.llm.resolved_api_key();
    println!(
        "{} {} ({}) at {}",
        style("\u{2714}").green().bold(),
        style(provider.provider_name()).bold(),
        provider.model_name(),
        config.llm.base_url,
    );
    if !key.is_empty() {
        println!("  key {}", style(mask_key(&key)).dim());
    }
    Ok(())
}
