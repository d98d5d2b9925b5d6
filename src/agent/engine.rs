use std::sync::Arc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::ScanPolicy;
use crate::http::HttpTransport;
use crate::llm::{LLMProvider, Message};
use crate::mutation::{MutationSpec, RequestMutator};
use crate::payloads::{self, PayloadEntry};
use crate::scheduler::{MessageCategory, Observer, ScanTask};
use crate::utils::truncation::elide;

use super::prompts;
use super::reply::{bool_field, parse_reply, str_field, ParsedReply};
use super::result::{AgentResult, NotVulnerableReason, Severity};

const MALFORMED_REPLY_CHARS: usize = 500;

/// Drives the reason / probe / observe loop for one task at a time.
///
/// The engine itself is stateless between runs; each [`run`](Self::run)
/// owns its conversation, transcript and [`RequestMutator`].
pub struct AgentEngine {
    llm: Arc<dyn LLMProvider>,
    transport: Arc<dyn HttpTransport>,
    policy: ScanPolicy,
    corpus: &'static [PayloadEntry],
}

impl AgentEngine {
    pub fn new(llm: Arc<dyn LLMProvider>, transport: Arc<dyn HttpTransport>, policy: ScanPolicy) -> Self {
        Self { llm, transport, policy, corpus: payloads::corpus() }
    }

    /// Use a different upload corpus than the built-in one.
    pub fn with_corpus(mut self, corpus: &'static [PayloadEntry]) -> Self {
        self.corpus = corpus;
        self
    }

    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    pub async fn run(&self, task: &ScanTask, observer: &dyn Observer) -> AgentResult {
        let max_iterations = self.policy.max_iterations;
        let emit = |category: MessageCategory, text: &str| observer.on_message(task.id, category, text);

        let mut mutator = RequestMutator::with_corpus(self.corpus);
        let mut transcript = String::new();

        emit(MessageCategory::Info, &format!("Starting analysis for scan type: {}", task.scan_type));
        let system = prompts::system_prompt(task, &self.policy, self.corpus.len());
        let mut conversation = vec![Message::system(&system)];

        for iteration in 1..=max_iterations {
            emit(MessageCategory::Info, &format!("Iteration {}/{}", iteration, max_iterations));

            let reply = match self.llm.chat(&conversation).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(task_id = task.id, iteration, error = %e, "LLM call failed");
                    return AgentResult::error(format!("LLM API call failed: {}", e));
                }
            };
            debug!(
                task_id = task.id,
                iteration,
                response_time_ms = reply.response_time_ms,
                output_tokens = ?reply.output_tokens,
                "LLM replied"
            );

            let obj = match parse_reply(&reply.content) {
                ParsedReply::Structured(obj) => obj,
                ParsedReply::Malformed(raw) => {
                    return AgentResult::error(format!(
                        "Failed to parse LLM response as JSON: {}",
                        elide(&raw, MALFORMED_REPLY_CHARS)
                    ));
                }
            };

            let thought = str_field(&obj, "thought", "No thought provided");
            transcript.push_str(thought);
            transcript.push_str("\n\n");
            emit(MessageCategory::Thought, thought);

            match str_field(&obj, "action", "") {
                "finish" => return finish_result(&obj, transcript),
                "send_request" => {}
                other => return AgentResult::error(format!("Unknown action: {}", other)),
            }

            let Some(modification) = obj.get("request_modification") else {
                return AgentResult::error("Missing request_modification in response");
            };
            let spec = match MutationSpec::from_json(modification) {
                Ok(spec) => spec,
                Err(e) => return AgentResult::error(format!("Invalid request_modification: {}", e)),
            };

            // Iteration 1 always replays the untouched request so every later
            // response has a baseline to be compared against.
            let outgoing = if iteration == 1 {
                emit(
                    MessageCategory::Action,
                    &format!("Sending original request (baseline): {} {}", task.request.method(), task.request.url()),
                );
                task.request.clone()
            } else {
                let modified = mutator.apply(&task.request, &spec);
                emit(MessageCategory::Action, &format!("Sending modified request: {}", mutator.describe(&spec)));
                modified
            };

            let response = match self.transport.send(&outgoing).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(task_id = task.id, iteration, error = %e, "Probe request failed");
                    return AgentResult::error(format!("HTTP request failed: {}", e));
                }
            };
            info!(
                task_id = task.id,
                iteration,
                status = response.status_code,
                response_time_ms = response.response_time_ms,
                "Probe response received"
            );
            emit(MessageCategory::Observation, &response.summary());

            let observation = response.format_for_llm();
            conversation.push(Message::assistant(&reply.content));
            conversation.push(Message::user(&prompts::observation_prompt(&transcript, &observation, iteration)));
        }

        emit(
            MessageCategory::Info,
            &format!("Reached maximum iterations ({}) without conclusive evidence.", max_iterations),
        );
        AgentResult::NotVulnerable {
            transcript,
            reason: NotVulnerableReason::MaxIterationsReached(max_iterations),
        }
    }
}

fn finish_result(obj: &Map<String, Value>, transcript: String) -> AgentResult {
    let Some(found) = bool_field(obj, "vulnerability_found") else {
        return AgentResult::error("Missing vulnerability_found field in finish result");
    };
    if !found {
        return AgentResult::NotVulnerable { transcript, reason: NotVulnerableReason::Concluded };
    }
    AgentResult::Vulnerable {
        vulnerability_type: str_field(obj, "vulnerability_type", "Unknown").to_string(),
        severity: Severity::parse_lenient(str_field(obj, "severity", "Medium")),
        evidence: str_field(obj, "evidence", "No evidence provided").to_string(),
        remediation: str_field(obj, "remediation", "").to_string(),
        transcript,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_finish_defaults() {
        let result = finish_result(&obj(json!({"vulnerability_found": true})), "t\n\n".into());
        assert_eq!(
            result,
            AgentResult::Vulnerable {
                vulnerability_type: "Unknown".into(),
                severity: Severity::Medium,
                evidence: "No evidence provided".into(),
                remediation: String::new(),
                transcript: "t\n\n".into(),
            }
        );
    }

    #[test]
    fn test_finish_requires_flag() {
        let result = finish_result(&obj(json!({"evidence": "x"})), String::new());
        assert_eq!(result, AgentResult::error("Missing vulnerability_found field in finish result"));
    }

    #[test]
    fn test_finish_not_vulnerable() {
        let result = finish_result(&obj(json!({"vulnerability_found": false})), "done".into());
        assert_eq!(
            result,
            AgentResult::NotVulnerable { transcript: "done".into(), reason: NotVulnerableReason::Concluded }
        );
    }
}
