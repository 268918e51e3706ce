//! Error types for the Note API

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NoteError>;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl NoteError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            NoteError::NotFound(_) => "not_found",
            NoteError::Validation(_) => "validation_error",
            NoteError::BackendUnavailable(_) => "backend_unavailable",
            NoteError::Serialization(_) => "serialization_error",
            NoteError::Config(_) => "config_error",
        }
    }
}

impl From<serde_json::Error> for NoteError {
    fn from(e: serde_json::Error) -> Self {
        NoteError::Serialization(e.to_string())
    }
}
