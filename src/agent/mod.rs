//! The reasoning loop: prompts, reply parsing, and the engine that alternates
//! between the reasoning service and the target.

pub mod engine;
pub mod prompts;
pub mod reply;
pub mod result;

pub use engine::AgentEngine;
pub use reply::{parse_reply, ParsedReply};
pub use result::{AgentResult, NotVulnerableReason, Severity};
