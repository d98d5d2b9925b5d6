//! LLM-guided black-box vulnerability probing of captured HTTP requests.
//!
//! A [`scheduler::TaskScheduler`] runs one [`agent::AgentEngine`] loop per
//! captured request. Each loop asks the LLM for the next probe, builds it
//! with a [`mutation::RequestMutator`], sends it through an
//! [`http::HttpTransport`] and feeds the response back until the LLM reaches
//! a verdict or the iteration budget runs out.

pub mod agent;
pub mod config;
pub mod errors;
pub mod http;
pub mod llm;
pub mod mutation;
pub mod payloads;
pub mod scheduler;
pub mod utils;
