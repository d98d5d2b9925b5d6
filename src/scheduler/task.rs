use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::VulnAgentError;
use crate::http::HttpRequest;

/// Vulnerability class a task focuses on. `All` asks for every enabled class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanType {
    #[default]
    All,
    SqlInjection,
    Xss,
    Idor,
    Ssrf,
    FileUpload,
    /// Driven by the task's custom instruction alone.
    Custom,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::SqlInjection => "SQL_INJECTION",
            Self::Xss => "XSS",
            Self::Idor => "IDOR",
            Self::Ssrf => "SSRF",
            Self::FileUpload => "FILE_UPLOAD",
            Self::Custom => "CUSTOM",
        }
    }

    /// Whether guidance for `other` applies to a task of this type.
    pub fn covers(&self, other: ScanType) -> bool {
        *self == ScanType::All || *self == other
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = VulnAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ALL" => Ok(Self::All),
            "SQL_INJECTION" | "SQLI" => Ok(Self::SqlInjection),
            "XSS" => Ok(Self::Xss),
            "IDOR" => Ok(Self::Idor),
            "SSRF" => Ok(Self::Ssrf),
            "FILE_UPLOAD" => Ok(Self::FileUpload),
            "CUSTOM" => Ok(Self::Custom),
            other => Err(VulnAgentError::Config(format!("Unknown scan type: {}", other))),
        }
    }
}

/// One captured request queued for analysis.
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub id: u64,
    pub request: HttpRequest,
    pub scan_type: ScanType,
    pub custom_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScanTask {
    pub fn new(id: u64, request: HttpRequest, scan_type: ScanType, custom_prompt: Option<String>) -> Self {
        Self {
            id,
            request,
            scan_type,
            custom_prompt: custom_prompt.filter(|p| !p.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}

/// Status of a task as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskLifecycle {
    Pending,
    Running,
    VulnerabilityFound,
    Finished,
    Error,
}

impl TaskLifecycle {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::VulnerabilityFound | Self::Finished | Self::Error)
    }

    /// Transitions only move forward. `Pending -> Error` covers tasks
    /// cancelled before they started.
    pub fn can_transition_to(&self, next: TaskLifecycle) -> bool {
        use TaskLifecycle::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Error)
                | (Running, VulnerabilityFound)
                | (Running, Finished)
                | (Running, Error)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::VulnerabilityFound => "Vulnerability Found",
            Self::Finished => "Finished",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for TaskLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
