use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::task::{ScanType, TaskLifecycle};

/// Kind of a progress message emitted while a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Thought,
    Action,
    Observation,
    Result,
    Error,
    Info,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thought => "thought",
            Self::Action => "action",
            Self::Observation => "observation",
            Self::Result => "result",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// Receives task progress. Implementations must not block; they are called
/// from inside running tasks.
pub trait Observer: Send + Sync {
    fn on_task_created(&self, task_id: u64, method: &str, url: &str, scan_type: ScanType);
    fn on_status(&self, task_id: u64, status: TaskLifecycle);
    fn on_message(&self, task_id: u64, category: MessageCategory, text: &str);
}

/// Mirrors every event into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_task_created(&self, task_id: u64, method: &str, url: &str, scan_type: ScanType) {
        info!(task_id, %method, %url, scan_type = %scan_type, "Task created");
    }

    fn on_status(&self, task_id: u64, status: TaskLifecycle) {
        info!(task_id, status = %status, "Task status changed");
    }

    fn on_message(&self, task_id: u64, category: MessageCategory, text: &str) {
        match category {
            MessageCategory::Error => warn!(task_id, category = category.as_str(), "{}", text),
            MessageCategory::Result => info!(task_id, category = category.as_str(), "{}", text),
            _ => debug!(task_id, category = category.as_str(), "{}", text),
        }
    }
}

/// Events forwarded by [`ChannelObserver`] for real-time display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    Created {
        task_id: u64,
        method: String,
        url: String,
        scan_type: ScanType,
    },
    Status {
        task_id: u64,
        status: TaskLifecycle,
    },
    Message {
        task_id: u64,
        category: MessageCategory,
        text: String,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> u64 {
        match self {
            Self::Created { task_id, .. } | Self::Status { task_id, .. } | Self::Message { task_id, .. } => *task_id,
        }
    }
}

/// Forwards events over an unbounded channel. Sends to a closed channel are dropped.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<TaskEvent>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<TaskEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: TaskEvent) {
        let _ = self.tx.send(event);
    }
}

impl Observer for ChannelObserver {
    fn on_task_created(&self, task_id: u64, method: &str, url: &str, scan_type: ScanType) {
        self.send(TaskEvent::Created {
            task_id,
            method: method.to_string(),
            url: url.to_string(),
            scan_type,
        });
    }

    fn on_status(&self, task_id: u64, status: TaskLifecycle) {
        self.send(TaskEvent::Status { task_id, status });
    }

    fn on_message(&self, task_id: u64, category: MessageCategory, text: &str) {
        self.send(TaskEvent::Message { task_id, category, text: text.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_observer_forwards_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let observer = ChannelObserver::new(tx);
        observer.on_task_created(3, "GET", "http://t/", ScanType::Xss);
        observer.on_status(3, TaskLifecycle::Running);
        observer.on_message(3, MessageCategory::Thought, "look at q");

        assert!(matches!(rx.recv().await, Some(TaskEvent::Created { task_id: 3, .. })));
        assert_eq!(rx.recv().await, Some(TaskEvent::Status { task_id: 3, status: TaskLifecycle::Running }));
        let last = rx.recv().await.unwrap();
        assert_eq!(last.task_id(), 3);
        assert!(matches!(last, TaskEvent::Message { category: MessageCategory::Thought, .. }));
    }

    #[test]
    fn test_channel_observer_ignores_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        ChannelObserver::new(tx).on_status(1, TaskLifecycle::Finished);
    }

    #[test]
    fn test_event_json_shape() {
        let event = TaskEvent::Status { task_id: 7, status: TaskLifecycle::VulnerabilityFound };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "status");
        assert_eq!(json["status"], "VulnerabilityFound");
    }
}
