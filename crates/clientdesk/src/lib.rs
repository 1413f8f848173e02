//! # Clientdesk
//!
//! The portal API for an agency dashboard: clients, their projects, the
//! services delivered in them and the tasks behind those services, all
//! behind role-based authorization.
//!
//! ## Overview
//!
//! Three roles act on the portal:
//!
//! - **PrivilegedAdmin**: full control over clients, users and finance
//! - **TeamMember**: day-to-day delivery work, read-only on clients and finance
//! - **ClientUser**: a customer, confined to the records of one client
//!
//! Every [`Portal`] operation takes the caller as `Option<&Subject>` and
//! rejects with 401 (no subject), 403 (table or ownership) or 404 (missing
//! record) before any store write happens.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clientdesk::{Portal, PortalConfig};
//! use clientdesk::core::{NewClient, Subject};
//! use clientdesk::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("clientdesk.db").unwrap();
//!     let portal = Portal::new(store, PortalConfig::default());
//!
//!     let admin = Subject::admin("u-admin");
//!     let client = portal
//!         .create_client(Some(&admin), NewClient::new("Acme", "ops@acme.test"))
//!         .await
//!         .unwrap();
//!
//!     // A client user only ever sees its own client.
//!     let viewer = Subject::client_user("u-acme", client.id.clone());
//!     let visible = portal.list_clients(Some(&viewer)).await.unwrap();
//!     assert_eq!(visible.len(), 1);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `clientdesk::core` - Roles, subjects and domain records
//! - `clientdesk::perms` - The permission table and ownership checks
//! - `clientdesk::store` - Storage abstraction and SQLite

pub mod config;
pub mod error;
pub mod identity;
pub mod portal;
pub mod views;

// Re-export component crates
pub use clientdesk_core as core;
pub use clientdesk_perms as perms;
pub use clientdesk_store as store;

// Re-export main types for convenience
pub use config::PortalConfig;
pub use error::{PortalError, Result};
pub use identity::{authenticate, IdentityProvider, StaticIdentityProvider};
pub use portal::Portal;
pub use views::{ClientDetail, ClientOverview, DashboardStats, ProjectWithServices};

// Re-export commonly used core types
pub use clientdesk_core::{ClientId, Permission, Resource, Role, Session, Subject};
pub use clientdesk_perms::{can_create, can_delete, can_edit, can_view, has_permission};
