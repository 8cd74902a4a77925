//! Error types for fintrack-core
//!
//! Transport, status and decode failures all collapse into "the operation
//! failed" at the record store boundary; the variants are kept apart so the
//! log line says which one happened.

use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request never produced a response
    Transport,
    /// Server answered with a non-success status
    Status,
    /// Response body could not be decoded
    Decode,
    /// Request aborted because its owner went away
    Cancelled,
    /// Credentials rejected or session missing
    Unauthorized,
    /// Record store used without a signed-in session
    OutsideProvider,
    /// Resource not found
    NotFound,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Transport => write!(f, "TRANSPORT"),
            ErrorCode::Status => write!(f, "STATUS"),
            ErrorCode::Decode => write!(f, "DECODE"),
            ErrorCode::Cancelled => write!(f, "CANCELLED"),
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::OutsideProvider => write!(f, "OUTSIDE_PROVIDER"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Debug information
    Debug,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
    /// Critical - programming error
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Debug => write!(f, "debug"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for fintrack-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Unexpected status: {status}")]
    Status { status: u16 },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Financial records accessed outside of a signed-in session")]
    OutsideProvider,

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Transport { .. } => ErrorCode::Transport,
            CoreError::Status { .. } => ErrorCode::Status,
            CoreError::Decode { .. } => ErrorCode::Decode,
            CoreError::Cancelled => ErrorCode::Cancelled,
            CoreError::Unauthorized => ErrorCode::Unauthorized,
            CoreError::OutsideProvider => ErrorCode::OutsideProvider,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Cancelled => ErrorSeverity::Debug,
            CoreError::Unauthorized | CoreError::NotFound { .. } => ErrorSeverity::Warning,
            CoreError::Transport { .. } | CoreError::Status { .. } | CoreError::Decode { .. } => {
                ErrorSeverity::Error
            }
            CoreError::OutsideProvider | CoreError::InternalError { .. } => ErrorSeverity::Critical,
        }
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// User ID (if known)
    pub user_id: Option<String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            user_id: None,
        }
    }

    /// Add user ID
    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }
}

/// Log an error at the level matching its severity
pub fn log_error(error: &CoreError, context: &ErrorContext) {
    let user = context.user_id.as_deref().unwrap_or("-");
    match error.severity() {
        ErrorSeverity::Debug => log::debug!(
            target: "fintrack::error",
            "{} [{}] user={}: {}",
            context.operation, error.code(), user, error
        ),
        ErrorSeverity::Warning => log::warn!(
            target: "fintrack::error",
            "{} [{}] user={}: {}",
            context.operation, error.code(), user, error
        ),
        ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
            target: "fintrack::error",
            "Failed to {} [{}] user={}: {}",
            context.operation, error.code(), user, error
        ),
    }
}

// ==================== Tests ====================
