//! Error types for task construction and persistence.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("invalid {field} timestamp '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("task index {index} is out of range ({len} tasks)")]
    IndexOutOfRange { index: usize, len: usize },
}
