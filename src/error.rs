use thiserror::Error;

/// Failures surfaced by tracker operations.
///
/// Every variant except `Storage` is raised before any state changes.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Access denied: only Admins can {operation}")]
    AccessDenied { operation: &'static str },

    #[error("User ID already exists: {0}")]
    DuplicateIdentifier(String),

    #[error("Please fill all fields (missing {0})")]
    IncompleteInput(&'static str),

    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Timestamp format cannot be rendered: {0}")]
    TimestampFormat(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
