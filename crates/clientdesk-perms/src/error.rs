//! Error types for composed authorization checks.
//!
//! The table predicates never fail. These errors only come out of
//! [`Authorizer::authorize`](crate::Authorizer::authorize) and the
//! ownership helpers, which callers translate into request rejections.

use clientdesk_core::{ClientId, Permission, Resource, Role};
use thiserror::Error;

/// Why access was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// The role has no such grant on the resource.
    #[error("{role} may not {permission} {resource}")]
    NotGranted {
        role: Role,
        resource: Resource,
        permission: Permission,
    },

    /// The record belongs to a client outside the subject's scope.
    #[error("record owned by {owner} is outside scope {scope}")]
    OutOfScope { scope: ClientId, owner: ClientId },

    /// The subject is not assigned to the client.
    #[error("subject is not assigned to client {0}")]
    NotAssigned(ClientId),
}

/// Result type for authorization checks.
pub type Result<T> = std::result::Result<T, AccessDenied>;
