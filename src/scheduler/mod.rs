pub mod executor;
pub mod observer;
pub mod task;

pub use executor::{TaskHandle, TaskScheduler, DEFAULT_CONCURRENCY};
pub use observer::{ChannelObserver, MessageCategory, Observer, TaskEvent, TracingObserver};
pub use task::{ScanTask, ScanType, TaskLifecycle};
