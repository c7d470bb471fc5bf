//! Error types and handling.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// Response body was not the JSON we expected
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Excel export error
    #[error("Export error: {0}")]
    Export(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a parse error with message
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error with message
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Short message suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            AppError::Http(e) if e.is_connect() => "Could not reach the server".to_string(),
            AppError::Status { status: 401, .. } => "Your session has expired, please sign in again".to_string(),
            AppError::Status { status: 403, .. } => "You do not have access to this data".to_string(),
            AppError::Status { status, .. } => format!("Server returned an error ({status})"),
            AppError::NotFound(_) => "The requested record no longer exists".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(e.to_string())
    }
}
