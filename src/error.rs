use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Tracker error: {0}")]
    Tracker(String),

    #[error("Tracker not available: {0}")]
    TrackerNotAvailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid task id: {0:?}")]
    InvalidTaskId(String),

    #[error("Task {id} is already mapped to {existing}")]
    AlreadyMapped { id: String, existing: String },

    #[error("Run finished with {failed} failed item(s)")]
    Incomplete { failed: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
