//! Error types for the trackdesk core
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the UI collaborator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(u64),

    #[error("Habit not found: {0}")]
    HabitNotFound(u64),

    #[error("Goal not found: {0}")]
    GoalNotFound(u64),

    #[error("{0}")]
    Generic(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
