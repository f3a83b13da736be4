//! Error types for profile generation and measurement retrieval.

use thiserror::Error;

/// Result type alias for engine operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that abort a whole `generate_profile` call.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid workload: {0}")]
    InvalidInput(String),

    #[error("failed to fetch data for worker {worker_id}, request {request_type_id}: {source}")]
    Fetch {
        worker_id: String,
        request_type_id: String,
        #[source]
        source: DataSourceError,
    },

    #[error("profile generation cancelled")]
    Cancelled,

    #[error("profile generation exceeded deadline of {0:?}")]
    DeadlineExceeded(std::time::Duration),
}

impl ProfileError {
    /// Whether the caller is at fault (rejected before any fetch).
    pub fn is_client_error(&self) -> bool {
        matches!(self, ProfileError::InvalidInput(_))
    }
}

/// Errors raised by a data source while retrieving measurements.
///
/// A pair with no matching rows is not an error.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("data source misconfigured: {0}")]
    Config(String),

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV data from {location}: {message}")]
    Csv { location: String, message: String },

    #[error("missing required column '{column}' in CSV header from {location}")]
    MissingColumn { location: String, column: String },

    #[error("storage error: {0}")]
    Storage(String),

    /// Failure configured on an in-memory fixture.
    #[error("{0}")]
    Injected(String),
}
