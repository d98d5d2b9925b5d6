use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::VulnAgentError;
use super::credentials::resolve_credential;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProbeConfig {
    pub llm: LlmConfig,
    pub policy: ScanPolicy,
    pub scope: ScopeConfig,
    pub scheduler: SchedulerConfig,
    pub http: HttpConfig,
}

impl ProbeConfig {
    /// Provider, key and model are set. The key may be empty for a local model server.
    pub fn is_configured(&self) -> bool {
        let key_ok = self.llm.provider == LlmProvider::Local || !self.llm.resolved_api_key().is_empty();
        key_ok && !self.llm.model.trim().is_empty() && !self.llm.base_url.trim().is_empty()
    }

    /// Fail fast before any task is scheduled.
    pub fn validate_ready(&self) -> Result<(), VulnAgentError> {
        if self.llm.model.trim().is_empty() {
            return Err(VulnAgentError::Config("LLM model is not configured".into()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(VulnAgentError::Config("LLM base URL is not configured".into()));
        }
        if self.llm.provider != LlmProvider::Local && self.llm.resolved_api_key().is_empty() {
            return Err(VulnAgentError::Config(format!(
                "No API key for provider {}. Set llm.api_key or {}",
                self.llm.provider,
                self.llm.provider.api_key_env().unwrap_or("an API key"),
            )));
        }
        if self.policy.max_iterations == 0 {
            return Err(VulnAgentError::Config("policy.max_iterations must be at least 1".into()));
        }
        if self.scheduler.concurrency == 0 {
            return Err(VulnAgentError::Config("scheduler.concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "OpenAI", alias = "openai")]
    OpenAI,
    #[serde(rename = "Azure", alias = "azure")]
    Azure,
    #[serde(rename = "Local", alias = "local")]
    Local,
    #[serde(rename = "Anthropic", alias = "anthropic")]
    Anthropic,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Azure => "Azure",
            Self::Local => "Local",
            Self::Anthropic => "Anthropic",
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Azure => Some("AZURE_OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Local => None,
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = VulnAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "azure" => Ok(Self::Azure),
            "local" => Ok(Self::Local),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(VulnAgentError::Config(format!("Unsupported provider: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Literal key, or `$NAME` to read it from the environment.
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 30,
            temperature: 0.3,
        }
    }
}

impl LlmConfig {
    /// The configured key with `$ENV` references resolved, falling back to
    /// the provider's conventional environment variable.
    pub fn resolved_api_key(&self) -> String {
        let configured = resolve_credential(self.api_key.trim());
        if !configured.is_empty() && !configured.starts_with('$') {
            return configured;
        }
        self.provider
            .api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum ConfidenceLevel {
    #[serde(alias = "low")]
    Low,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which vulnerability classes the reasoning service is told to look for,
/// and how long it may keep probing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanPolicy {
    pub sql_injection: bool,
    pub xss: bool,
    pub idor: bool,
    pub ssrf: bool,
    pub file_upload: bool,
    pub rce: bool,
    pub business_logic: bool,
    pub max_iterations: u32,
    pub confidence_level: ConfidenceLevel,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            sql_injection: true,
            xss: true,
            idor: true,
            ssrf: true,
            file_upload: true,
            rce: false,
            business_logic: false,
            max_iterations: 5,
            confidence_level: ConfidenceLevel::Medium,
        }
    }
}

impl ScanPolicy {
    /// Display names of the enabled classes, in prompt order.
    pub fn enabled_classes(&self) -> Vec<&'static str> {
        [
            (self.sql_injection, "SQL Injection"),
            (self.xss, "XSS (Reflected/Stored)"),
            (self.idor, "Broken Access Control (IDOR)"),
            (self.ssrf, "SSRF"),
            (self.file_upload, "File Upload Vulnerabilities"),
            (self.rce, "Remote Code Execution (RCE)"),
            (self.business_logic, "Business Logic Flaws"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScopeConfig {
    /// When non-empty, only these hosts (or their subdomains) are probed.
    pub include_hosts: Vec<String>,
    pub exclude_hosts: Vec<String>,
    pub exclude_extensions: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        let extensions = ["jpg", "jpeg", "png", "gif", "css", "js", "woff", "woff2", "svg", "ico", "pdf", "ttf", "eot"];
        Self {
            include_hosts: Vec::new(),
            exclude_hosts: Vec::new(),
            exclude_extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ScopeConfig {
    /// Whether a request to `host` for `path` may be probed.
    pub fn allows(&self, host: &str, path: &str) -> bool {
        let host = host.to_ascii_lowercase();
        if self.exclude_hosts.iter().any(|h| host_matches(&host, h)) {
            return false;
        }
        if !self.include_hosts.is_empty() && !self.include_hosts.iter().any(|h| host_matches(&host, h)) {
            return false;
        }
        let file = path.rsplit('/').next().unwrap_or(path);
        match file.rsplit_once('.') {
            Some((_, ext)) => !self
                .exclude_extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext)),
            None => true,
        }
    }
}

fn host_matches(host: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().trim_start_matches("*.").to_ascii_lowercase();
    !pattern.is_empty() && (host == pattern || host.ends_with(&format!(".{}", pattern)))
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { concurrency: 2 }
    }
}

/// Client settings for requests sent to the target.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub follow_redirects: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30, accept_invalid_certs: true, follow_redirects: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.policy.max_iterations, 5);
        assert_eq!(config.policy.confidence_level, ConfidenceLevel::Medium);
        assert_eq!(config.scheduler.concurrency, 2);
        assert!(config.http.accept_invalid_certs);
        assert!(!config.http.follow_redirects);
    }

    #[test]
    fn test_enabled_classes_order() {
        let policy = ScanPolicy::default();
        assert_eq!(
            policy.enabled_classes(),
            vec![
                "SQL Injection",
                "XSS (Reflected/Stored)",
                "Broken Access Control (IDOR)",
                "SSRF",
                "File Upload Vulnerabilities",
            ]
        );
        let all = ScanPolicy { rce: true, business_logic: true, ..ScanPolicy::default() };
        assert_eq!(all.enabled_classes().len(), 7);
    }

    #[test]
    fn test_provider_deserialize_either_case() {
        let p: LlmProvider = serde_json::from_str("\"OpenAI\"").unwrap();
        assert_eq!(p, LlmProvider::OpenAI);
        let p: LlmProvider = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(p, LlmProvider::Local);
        assert!(serde_json::from_str::<LlmProvider>("\"gemini\"").is_err());
        assert_eq!("Azure".parse::<LlmProvider>().unwrap(), LlmProvider::Azure);
    }

    #[test]
    fn test_local_provider_needs_no_key() {
        let mut config = ProbeConfig::default();
        config.llm.provider = LlmProvider::Local;
        config.llm.api_key = String::new();
        assert!(config.is_configured());
        assert!(config.validate_ready().is_ok());
    }

    #[test]
    fn test_literal_key_is_configured() {
        let mut config = ProbeConfig::default();
        config.llm.api_key = "sk-test-1234".to_string();
        assert!(config.is_configured());
        assert_eq!(config.llm.resolved_api_key(), "sk-test-1234");
    }

    #[test]
    fn test_validate_ready_rejects_zero_limits() {
        let mut config = ProbeConfig::default();
        config.llm.api_key = "sk-test-1234".to_string();
        config.policy.max_iterations = 0;
        assert!(matches!(config.validate_ready(), Err(VulnAgentError::Config(_))));

        config.policy.max_iterations = 3;
        config.scheduler.concurrency = 0;
        assert!(config.validate_ready().is_err());
    }

    #[test]
    fn test_scope_extensions_and_hosts() {
        let scope = ScopeConfig {
            include_hosts: vec!["example.com".to_string()],
            exclude_hosts: vec!["cdn.example.com".to_string()],
            ..ScopeConfig::default()
        };
        assert!(scope.allows("api.example.com", "/v1/users"));
        assert!(scope.allows("example.com", "/upload.php"));
        assert!(!scope.allows("example.com", "/static/app.JS"));
        assert!(!scope.allows("cdn.example.com", "/x"));
        assert!(!scope.allows("other.org", "/"));
        assert!(!scope.allows("notexample.com", "/"));
    }

    #[test]
    fn test_confidence_level_display() {
        assert_eq!(ConfidenceLevel::High.to_string(), "High");
        let parsed: ConfidenceLevel = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, ConfidenceLevel::Low);
    }
}
