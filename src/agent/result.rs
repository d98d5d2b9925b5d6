use serde::Serialize;
use std::fmt;

use crate::scheduler::TaskLifecycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Case-insensitive; anything unrecognised is `Medium`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "info" | "informational" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run ended without a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "iterations", rename_all = "snake_case")]
pub enum NotVulnerableReason {
    /// The reasoning service concluded the target is not vulnerable.
    Concluded,
    /// The iteration budget ran out first.
    MaxIterationsReached(u32),
}

/// Outcome of one reasoning loop run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AgentResult {
    Vulnerable {
        vulnerability_type: String,
        severity: Severity,
        evidence: String,
        remediation: String,
        transcript: String,
    },
    NotVulnerable {
        transcript: String,
        reason: NotVulnerableReason,
    },
    Error {
        message: String,
    },
}

impl AgentResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    pub fn is_vulnerable(&self) -> bool {
        matches!(self, Self::Vulnerable { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            Self::Vulnerable { transcript, .. } | Self::NotVulnerable { transcript, .. } => Some(transcript),
            Self::Error { .. } => None,
        }
    }

    /// Terminal lifecycle state this result maps to.
    pub fn lifecycle(&self) -> TaskLifecycle {
        match self {
            Self::Vulnerable { .. } => TaskLifecycle::VulnerabilityFound,
            Self::NotVulnerable { .. } => TaskLifecycle::Finished,
            Self::Error { .. } => TaskLifecycle::Error,
        }
    }

    /// Final message shown to observers.
    pub fn summary(&self) -> String {
        match self {
            Self::Vulnerable { vulnerability_type, severity, evidence, .. } => {
                format!("VULNERABILITY FOUND: {} ({})\n{}", vulnerability_type, severity, evidence)
            }
            Self::NotVulnerable { reason: NotVulnerableReason::Concluded, .. } => {
                "No vulnerability found after analysis.".to_string()
            }
            Self::NotVulnerable { reason: NotVulnerableReason::MaxIterationsReached(n), .. } => {
                format!("No vulnerability found. Reached maximum iterations ({}) without conclusive evidence.", n)
            }
            Self::Error { message } => format!("Error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_lenient_parse() {
        assert_eq!(Severity::parse_lenient("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::parse_lenient("high"), Severity::High);
        assert_eq!(Severity::parse_lenient("severe-ish"), Severity::Medium);
        assert_eq!(Severity::parse_lenient(""), Severity::Medium);
    }

    #[test]
    fn test_summary_messages() {
        let vuln = AgentResult::Vulnerable {
            vulnerability_type: "SQL Injection".into(),
            severity: Severity::High,
            evidence: "MySQL syntax error".into(),
            remediation: String::new(),
            transcript: "t".into(),
        };
        assert_eq!(vuln.summary(), "VULNERABILITY FOUND: SQL Injection (High)\nMySQL syntax error");
        assert_eq!(vuln.lifecycle(), TaskLifecycle::VulnerabilityFound);

        let clean = AgentResult::NotVulnerable { transcript: String::new(), reason: NotVulnerableReason::Concluded };
        assert_eq!(clean.summary(), "No vulnerability found after analysis.");
        assert_eq!(clean.lifecycle(), TaskLifecycle::Finished);

        let err = AgentResult::error("boom");
        assert_eq!(err.summary(), "Error: boom");
        assert!(err.transcript().is_none());
    }

    #[test]
    fn test_json_tagging() {
        let r = AgentResult::NotVulnerable { transcript: "x".into(), reason: NotVulnerableReason::MaxIterationsReached(5) };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["outcome"], "not_vulnerable");
        assert_eq!(json["reason"]["kind"], "max_iterations_reached");
        assert_eq!(json["reason"]["iterations"], 5);
    }
}
