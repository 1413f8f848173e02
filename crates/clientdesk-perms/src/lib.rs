//! # Clientdesk Permissions
//!
//! The authorization engine: a flat role -> resource -> permission table and
//! the ownership check that confines client users to their own records.
//!
//! ## Overview
//!
//! Authorization is two independent checks, both of which must pass:
//!
//! 1. **Table lookup**: does the subject's [`Role`] grant the [`Permission`]
//!    on the [`Resource`] category? This is [`has_permission`] and its
//!    wrappers. The lookup is pure and total; any pair absent from the table
//!    grants nothing.
//! 2. **Ownership narrowing**: if the subject is scoped to a client, the
//!    record under access must be owned by that client. The table only says
//!    "client users may view clients"; ownership says *which* client.
//!
//! There is no role hierarchy. A new role gets its own explicit row.
//!
//! ## Usage
//!
//! ```rust
//! use clientdesk_core::{ClientId, Permission, Resource, Role, Subject};
//! use clientdesk_perms::{can_view, Authorizer};
//!
//! assert!(can_view(Role::TeamMember, Resource::Finance));
//! assert!(!can_view(Role::ClientUser, Resource::Finance));
//!
//! let authz = Authorizer::standard();
//! let subject = Subject::client_user("u1", "C1");
//! let other = ClientId::from("C2");
//! assert!(authz
//!     .authorize_record(&subject, Resource::Clients, Permission::View, &other)
//!     .is_err());
//! ```
//!
//! [`Role`]: clientdesk_core::Role
//! [`Resource`]: clientdesk_core::Resource
//! [`Permission`]: clientdesk_core::Permission

pub mod engine;
pub mod error;
pub mod ownership;
pub mod table;

pub use engine::{can_create, can_delete, can_edit, can_view, has_permission, Authorizer};
pub use error::{AccessDenied, Result};
pub use ownership::{check_assignment, check_ownership, is_assigned, visible_client_filter};
pub use table::{PermissionSet, PermissionTable};
