use super::types::VulnAgentError;

/// Coarse error taxonomy used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or non-conforming reasoning-service replies.
    Protocol,
    /// Reasoning-service or target HTTP failures.
    Transport,
    /// Rejected before any task is scheduled.
    Configuration,
    /// Admission and cancellation faults at the worker boundary.
    Scheduler,
    Internal,
}

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub category: ErrorCategory,
}

impl VulnAgentError {
    /// Classify this error into its reporting category.
    ///
    /// None of the categories are retried inside a task: a failed iteration
    /// always terminates the task with an error result.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            VulnAgentError::Protocol(_) => ErrorClassification {
                error_type: "ProtocolError",
                category: ErrorCategory::Protocol,
            },
            VulnAgentError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                category: ErrorCategory::Protocol,
            },

            VulnAgentError::LLMApi(_) => ErrorClassification {
                error_type: "LLMApiError",
                category: ErrorCategory::Transport,
            },
            VulnAgentError::RateLimit(_) => ErrorClassification {
                error_type: "RateLimitError",
                category: ErrorCategory::Transport,
            },
            VulnAgentError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                category: ErrorCategory::Transport,
            },
            VulnAgentError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                category: ErrorCategory::Transport,
            },
            VulnAgentError::Transport(_) => ErrorClassification {
                error_type: "TransportError",
                category: ErrorCategory::Transport,
            },

            VulnAgentError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                category: ErrorCategory::Configuration,
            },
            VulnAgentError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                category: ErrorCategory::Configuration,
            },
            VulnAgentError::InvalidRequest(_) => ErrorClassification {
                error_type: "InvalidRequestError",
                category: ErrorCategory::Configuration,
            },
            VulnAgentError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                category: ErrorCategory::Configuration,
            },

            VulnAgentError::SchedulerClosed(_) => ErrorClassification {
                error_type: "SchedulerClosedError",
                category: ErrorCategory::Scheduler,
            },
            VulnAgentError::Cancelled(_) => ErrorClassification {
                error_type: "CancelledError",
                category: ErrorCategory::Scheduler,
            },

            VulnAgentError::Io(_) => ErrorClassification {
                error_type: "IoError",
                category: ErrorCategory::Internal,
            },
            VulnAgentError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                category: ErrorCategory::Internal,
            },
        }
    }

    /// Process exit code used by the CLI for this error.
    pub fn exit_code(&self) -> i32 {
        match self.classify().category {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Transport => 3,
            _ => 1,
        }
    }
}
