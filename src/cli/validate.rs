use console::style;

use crate::cli::commands::ValidateArgs;
use vulnagent::config::load_config;
use vulnagent::errors::VulnAgentError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), VulnAgentError> {
    let (config, warnings) = load_config(&args.config).await?;
    for warning in &warnings {
        println!("{} {}", style("warning:").yellow(), warning);
    }

    println!("Configuration is valid: {}", args.config.display());
    println!("  provider       {} ({})", config.llm.provider, config.llm.model);
    println!("  classes        {}", config.policy.enabled_classes().join(", "));
    println!("  iterations     {}", config.policy.max_iterations);
    println!("  confidence     {}", config.policy.confidence_level);
    println!("  concurrency    {}", config.scheduler.concurrency);
    if !config.is_configured() {
        println!("{} no usable API key for {}", style("note:").dim(), config.llm.provider);
    }
    Ok(())
}
