#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use vulnagent::errors::VulnAgentError;
use vulnagent::http::{Header, HttpRequest, HttpResponse, HttpTransport};
use vulnagent::llm::{LLMProvider, LLMResponse, Message};
use vulnagent::scheduler::{MessageCategory, Observer, ScanType, TaskEvent, TaskLifecycle};

/// Replays canned replies in order, then repeats `fallback` (if any).
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    delay: Option<Duration>,
    panic_on_call: bool,
    fail_with: Option<String>,
    pub calls: AtomicUsize,
    pub conversations: Mutex<Vec<Vec<Message>>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            fallback: None,
            delay: None,
            panic_on_call: false,
            fail_with: None,
            calls: AtomicUsize::new(0),
            conversations: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn repeating(reply: &str) -> Self {
        let mut llm = Self::new(&[]);
        llm.fallback = Some(reply.to_string());
        llm
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn panicking() -> Self {
        let mut llm = Self::new(&[]);
        llm.panic_on_call = true;
        llm
    }

    pub fn failing(message: &str) -> Self {
        let mut llm = Self::new(&[]);
        llm.fail_with = Some(message.to_string());
        llm
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for ScriptedLlm {
    async fn chat(&self, messages: &[Message]) -> Result<LLMResponse, VulnAgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.conversations.lock().unwrap().push(messages.to_vec());
        if self.panic_on_call {
            panic!("scripted llm blew up");
        }
        if let Some(message) = &self.fail_with {
            return Err(VulnAgentError::LLMApi(message.clone()));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| finish(false));
        Ok(LLMResponse {
            content,
            input_tokens: Some(100),
            output_tokens: Some(20),
            response_time_ms: 1,
            model: "scripted".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Records every request and answers with a fixed response.
pub struct RecordingTransport {
    pub sent: Mutex<Vec<HttpRequest>>,
    status: u16,
    body: String,
    fail: bool,
}

impl RecordingTransport {
    pub fn ok(status: u16, body: &str) -> Self {
        Self { sent: Mutex::new(Vec::new()), status, body: body.to_string(), fail: false }
    }

    pub fn unreachable() -> Self {
        Self { sent: Mutex::new(Vec::new()), status: 0, body: String::new(), fail: true }
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, VulnAgentError> {
        self.sent.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(VulnAgentError::Transport("connection refused".into()));
        }
        Ok(HttpResponse {
            status_code: self.status,
            headers: vec![Header::new("Content-Type", "text/html")],
            body: self.body.clone(),
            content_length: self.body.len(),
            response_time_ms: 12,
        })
    }
}

/// Keeps every observer callback as a [`TaskEvent`].
#[derive(Default)]
pub struct CollectingObserver {
    pub events: Mutex<Vec<TaskEvent>>,
}

impl CollectingObserver {
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self, task_id: u64) -> Vec<TaskLifecycle> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TaskEvent::Status { task_id: id, status } if id == task_id => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self, task_id: u64, category: MessageCategory) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TaskEvent::Message { task_id: id, category: c, text } if id == task_id && c == category => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl Observer for CollectingObserver {
    fn on_task_created(&self, task_id: u64, method: &str, url: &str, scan_type: ScanType) {
        self.events.lock().unwrap().push(TaskEvent::Created {
            task_id,
            method: method.to_string(),
            url: url.to_string(),
            scan_type,
        });
    }

    fn on_status(&self, task_id: u64, status: TaskLifecycle) {
        self.events.lock().unwrap().push(TaskEvent::Status { task_id, status });
    }

    fn on_message(&self, task_id: u64, category: MessageCategory, text: &str) {
        self.events.lock().unwrap().push(TaskEvent::Message { task_id, category, text: text.to_string() });
    }
}

pub fn login_request() -> HttpRequest {
    HttpRequest::new("GET", "http://target.test/items?id=7&sort=asc").with_header("Cookie", "session=abc")
}

pub fn send_query(parameter: &str, value: &str) -> String {
    json!({
        "thought": format!("probe {} with {}", parameter, value),
        "action": "send_request",
        "request_modification": {"type": "url_query", "parameter": parameter, "value": value}
    })
    .to_string()
}

pub fn finish(found: bool) -> String {
    json!({"thought": "done", "action": "finish", "vulnerability_found": found}).to_string()
}
