//! Error types for the Portal.

use clientdesk_core::CoreError;
use clientdesk_perms::AccessDenied;
use clientdesk_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Portal operations.
#[derive(Debug, Error)]
pub enum PortalError {
    /// No authenticated subject.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(#[from] AccessDenied),

    /// The addressed record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected input.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl PortalError {
    /// HTTP status a request handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            PortalError::Unauthenticated => 401,
            PortalError::Forbidden(_) => 403,
            PortalError::NotFound(_) => 404,
            PortalError::InvalidInput(_) => 400,
            PortalError::Store(StoreError::NotFound(_)) => 404,
            PortalError::Store(_) => 500,
        }
    }

    /// Whether this is an authorization failure (401 or 403).
    pub fn is_access_error(&self) -> bool {
        matches!(self, PortalError::Unauthenticated | PortalError::Forbidden(_))
    }
}

/// Result type for Portal operations.
pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use clientdesk_core::{ClientId, Permission, Resource, Role};

    #[test]
    fn test_status_codes() {
        assert_eq!(PortalError::Unauthenticated.status_code(), 401);
        assert_eq!(
            PortalError::from(AccessDenied::NotGranted {
                role: Role::ClientUser,
                resource: Resource::Finance,
                permission: Permission::View,
            })
            .status_code(),
            403
        );
        assert_eq!(
            PortalError::from(AccessDenied::NotAssigned(ClientId::from("c1"))).status_code(),
            403
        );
        assert_eq!(PortalError::NotFound("client c1".into()).status_code(), 404);
        assert_eq!(
            PortalError::from(CoreError::MissingField("company_name")).status_code(),
            400
        );
        assert_eq!(
            PortalError::from(StoreError::Task("join".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_access_errors() {
        assert!(PortalError::Unauthenticated.is_access_error());
        let denied = AccessDenied::NotAssigned(ClientId::from("c1"));
        assert!(PortalError::from(denied).is_access_error());
        assert!(!PortalError::NotFound("task t1".into()).is_access_error());
    }
}
