//! Error types for Clientdesk Core.

use thiserror::Error;

/// Errors raised while constructing or parsing core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A subject's scope does not match its role.
    ///
    /// Client users must carry exactly one owning client; every other role
    /// must carry none.
    #[error("invalid subject: {0}")]
    InvalidSubject(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("unknown status: {0}")]
    UnknownStatus(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
