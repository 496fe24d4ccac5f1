use axum::http::StatusCode;
use thiserror::Error;

/// Failure kinds a conversion request can surface to the caller.
/// Probe failures are deliberately absent: metadata is an enrichment
/// and never fails a job.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Invalid file type. Only MP4 files are allowed.")]
    UnsupportedInput,

    #[error("Video not found")]
    RecordNotFound,

    #[error("Error in video conversion: {0}")]
    Engine(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl ConversionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConversionError::UnsupportedInput => StatusCode::BAD_REQUEST,
            ConversionError::RecordNotFound => StatusCode::NOT_FOUND,
            ConversionError::Engine(_)
            | ConversionError::Storage(_)
            | ConversionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
