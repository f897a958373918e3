//! tasktrackr-core: task model, file-backed task store and reminder poller.

pub mod error;
pub mod reminders;
pub mod store;
pub mod task;
pub mod time;

pub use error::{StoreError, TaskError};
pub use reminders::{DEFAULT_POLL_INTERVAL, Reminder, ReminderPoller, ReminderSink, due_reminders};
pub use store::{DEFAULT_DATA_FILE, LoadOutcome, LoadReport, SharedStore, SkippedRecord, TaskStore};
pub use task::{Priority, Task};
