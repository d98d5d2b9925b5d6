pub mod types;
pub mod classification;

pub use types::VulnAgentError;
pub use classification::{ErrorCategory, ErrorClassification};
