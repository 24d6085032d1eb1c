use thiserror::Error;
use crate::wizard::{mode::Field, validation::ValidationErrors};

#[derive(Error, Debug)]
pub enum GrantError {
    #[error("Missing or invalid fields: {0}")]
    Validation(ValidationErrors),

    #[error("Field cannot be changed once the program is published: {0}")]
    ReadOnly(Field),

    /// Repository call rejected; the server message is kept verbatim
    #[error("{0}")]
    Remote(String),

    #[error("Draft storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Reclaim already in progress for {0}")]
    ReclaimInFlight(String),

    #[error("Invalid wizard state: {0}")]
    InvalidState(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GrantError {
    /// Message suitable for a user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            GrantError::Remote(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GrantError>;
