use std::path::Path;
use crate::errors::VulnAgentError;
use super::types::ProbeConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<ProbeConfig, VulnAgentError> {
    let (config, warnings) = load_config(path).await?;
    for msg in &warnings {
        // advisory only
        warn!(validation_error = %msg, "Config schema warning");
    }
    Ok(config)
}

/// Parse a config file and also return the schema warnings instead of
/// logging them.
pub async fn load_config(path: &Path) -> Result<(ProbeConfig, Vec<String>), VulnAgentError> {
    if !path.exists() {
        return Err(VulnAgentError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(VulnAgentError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<(ProbeConfig, Vec<String>), VulnAgentError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    if yaml.is_null() {
        return Ok((ProbeConfig::default(), Vec::new()));
    }

    let warnings = schema_warnings(&yaml)?;
    let config: ProbeConfig = serde_yaml::from_value(yaml)?;
    validate_conflicts(&config)?;

    Ok((config, warnings))
}

/// Validate config against the JSON schema for structural correctness.
fn schema_warnings(yaml: &serde_yaml::Value) -> Result<Vec<String>, VulnAgentError> {
    let json_str = serde_json::to_string(yaml)
        .map_err(|e| VulnAgentError::Config(format!("Config conversion error: {}", e)))?;
    let json_value: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| VulnAgentError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| VulnAgentError::Config(format!("Schema compilation error: {}", e)))?;

    let messages = match compiled.validate(&json_value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|e| format!("{} at {}", e, e.instance_path)).collect(),
    };
    Ok(messages)
}

/// Detect semantic conflicts in the parsed configuration.
fn validate_conflicts(config: &ProbeConfig) -> Result<(), VulnAgentError> {
    let scope = &config.scope;
    for host in &scope.include_hosts {
        if scope.exclude_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            return Err(VulnAgentError::Config(format!(
                "Conflicting scope: host '{}' appears in both include_hosts and exclude_hosts",
                host
            )));
        }
    }

    if config.policy.enabled_classes().is_empty() {
        warn!("Scan policy enables no vulnerability classes");
    }

    Ok(())
}
