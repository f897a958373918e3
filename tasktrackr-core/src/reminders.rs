//! Reminder selection and the background poller that delivers them.
//!
//! A task is due for a reminder once its reminder time has passed, until it is
//! completed. Nothing records that a reminder was shown, so a due task is
//! reported again on every poll.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::SharedStore;
use crate::task::{Priority, Task};
use crate::time;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDateTime>,
    pub priority: Priority,
    pub reminder_time: NaiveDateTime,
}

impl Reminder {
    fn from_task(task: &Task) -> Option<Self> {
        Some(Self {
            title: task.title().to_string(),
            description: task.description().to_string(),
            due_date: task.due_date(),
            priority: task.priority(),
            reminder_time: task.reminder_time()?,
        })
    }
}

/// Tasks whose reminders are due at `now`, in store order.
pub fn due_reminders<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: NaiveDateTime) -> Vec<Reminder> {
    tasks
        .into_iter()
        .filter(|t| t.reminder_due(now))
        .filter_map(Reminder::from_task)
        .collect()
}

/// Where reminders are delivered.
pub trait ReminderSink: Send + Sync {
    fn notify(&self, reminder: &Reminder);
}

/// Periodically scans the shared store and hands due reminders to a sink.
pub struct ReminderPoller {
    store: SharedStore,
    sink: Arc<dyn ReminderSink>,
    cancel: CancellationToken,
    interval: Duration,
}

impl ReminderPoller {
    pub fn new(store: SharedStore, sink: Arc<dyn ReminderSink>, cancel: CancellationToken) -> Self {
        Self {
            store,
            sink,
            cancel,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// One scan. Returns how many reminders were delivered.
    ///
    /// The store lock is released before the sink runs.
    pub fn check_once(&self) -> usize {
        let due = {
            let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
            due_reminders(store.list(true), time::now())
        };

        for reminder in &due {
            self.sink.notify(reminder);
        }

        if !due.is_empty() {
            debug!(count = due.len(), "delivered reminders");
        }
        due.len()
    }

    /// Check now, then every interval, until cancelled.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "reminder poller started");

        loop {
            self.check_once();

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("reminder poller stopped");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
