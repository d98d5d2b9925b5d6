use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vulnagent", version, about = "LLM-guided black-box vulnerability probing of captured HTTP requests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print task results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe one or more captured requests
    Scan(ScanArgs),
    /// List the built-in file upload payloads
    Payloads(PayloadsArgs),
    /// Test the connection to the configured LLM
    Check(CheckArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// LLM settings that override the configuration file.
#[derive(Args, Clone, Default)]
pub struct LlmArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// LLM provider: openai, azure, local, anthropic
    #[arg(long)]
    pub provider: Option<String>,

    /// LLM model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// LLM API key (or use env vars)
    #[arg(long)]
    pub api_key: Option<String>,

    /// OpenAI-compatible endpoint
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Raw HTTP request files, one request per file
    #[arg(required = true)]
    pub requests: Vec<PathBuf>,

    /// Scan type: all, sql_injection, xss, idor, ssrf, file_upload, custom
    #[arg(short = 't', long, default_value = "all")]
    pub scan_type: String,

    /// Extra instruction passed to the LLM
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Scheme used when a request line carries only a path
    #[arg(long, default_value = "https")]
    pub scheme: String,

    #[command(flatten)]
    pub llm: LlmArgs,

    /// Number of requests probed at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Reasoning iterations per request
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct PayloadsArgs {
    /// Only list this category (e.g. web_shell_php, double_extension)
    #[arg(long)]
    pub category: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Path to configuration file
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_args() {
        let cli = Cli::parse_from([
            "vulnagent", "-vv", "scan", "a.req", "b.req", "--scan-type", "xss", "--model", "gpt-4o-mini",
            "--concurrency", "4",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Scan(args) = cli.command else { panic!("expected scan") };
        assert_eq!(args.requests.len(), 2);
        assert_eq!(args.scan_type, "xss");
        assert_eq!(args.scheme, "https");
        assert_eq!(args.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(args.concurrency, Some(4));
        assert!(!args.json);
    }
}
