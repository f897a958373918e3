//! Task model.
//!
//! A task is validated at construction (non-empty title, known priority) and
//! after that only its completion flag ever changes.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Strict parse (case-insensitive). Used where the caller wants to reject bad input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Lenient conversion: anything unrecognised becomes `Medium`.
impl From<&str> for Priority {
    fn from(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl From<Option<String>> for Priority {
    fn from(s: Option<String>) -> Self {
        s.as_deref().map(Priority::from).unwrap_or_default()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    title: String,
    description: String,
    due_date: Option<NaiveDateTime>,
    priority: Priority,
    reminder: bool,
    reminder_time: Option<NaiveDateTime>,
    completed: bool,
    created_at: NaiveDateTime,
}

impl Task {
    pub fn new(title: &str, description: &str) -> Result<Self, TaskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }

        Ok(Self {
            title: title.to_string(),
            description: description.trim().to_string(),
            due_date: None,
            priority: Priority::Medium,
            reminder: false,
            reminder_time: None,
            completed: false,
            created_at: time::now(),
        })
    }

    pub fn with_due_date(mut self, due: NaiveDateTime) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Turn the reminder on, firing at `at`.
    pub fn with_reminder(mut self, at: NaiveDateTime) -> Self {
        self.reminder = true;
        self.reminder_time = Some(at);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn due_date(&self) -> Option<NaiveDateTime> {
        self.due_date
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn reminder(&self) -> bool {
        self.reminder
    }

    pub fn reminder_time(&self) -> Option<NaiveDateTime> {
        self.reminder_time
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    #[cfg(test)]
    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    /// Flip the completion flag, returning the new state.
    pub fn toggle_completed(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    /// True when the reminder is armed, not yet satisfied by completion, and due at `now`.
    pub fn reminder_due(&self, now: NaiveDateTime) -> bool {
        self.reminder
            && !self.completed
            && self.reminder_time.is_some_and(|at| at <= now)
    }
}

/// On-disk shape of a task. Reading is lenient about optional fields;
/// title and created_at are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRecord {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    reminder: bool,
    #[serde(default)]
    reminder_time: Option<String>,
    #[serde(default)]
    completed: bool,
    created_at: String,
}

fn parse_optional(field: &'static str, raw: Option<String>) -> Result<Option<NaiveDateTime>, TaskError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => time::parse_iso(s)
            .map(Some)
            .ok_or_else(|| TaskError::InvalidTimestamp {
                field,
                value: s.to_string(),
            }),
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskError;

    fn try_from(r: TaskRecord) -> Result<Self, Self::Error> {
        let mut task = Task::new(&r.title, r.description.as_deref().unwrap_or(""))?;
        task.priority = r.priority;
        task.reminder = r.reminder;
        task.due_date = parse_optional("due_date", r.due_date)?;
        task.reminder_time = parse_optional("reminder_time", r.reminder_time)?;
        task.completed = r.completed;
        task.created_at = time::parse_iso(&r.created_at).ok_or_else(|| TaskError::InvalidTimestamp {
            field: "created_at",
            value: r.created_at.clone(),
        })?;
        Ok(task)
    }
}

impl From<Task> for TaskRecord {
    fn from(t: Task) -> Self {
        Self {
            title: t.title,
            description: Some(t.description),
            due_date: t.due_date.map(time::to_iso),
            priority: t.priority,
            reminder: t.reminder,
            reminder_time: t.reminder_time.map(time::to_iso),
            completed: t.completed,
            created_at: time::to_iso(t.created_at),
        }
    }
}
