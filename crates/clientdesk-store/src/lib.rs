//! # Clientdesk Store
//!
//! Storage abstraction for Clientdesk. Provides a trait-based interface for
//! record persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store never makes authorization decisions. Callers (the `Portal` in
//! the `clientdesk` crate) check permissions and ownership first and only
//! then read or write through the [`Store`] trait.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clientdesk_core::{ClientId, NewClient};
//! use clientdesk_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("clientdesk.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let client = NewClient::new("Acme", "ops@acme.test")
//!         .into_client(ClientId::generate(), 0)
//!         .unwrap();
//!     store.insert_client(&client).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Newest first**: list operations return records by creation time, newest first
//! - **Cascading delete**: deleting a client removes everything it owns
//! - **Parents first**: a child whose owner is not stored is rejected with
//!   `NotFound`, in both backends
//! - **Denormalized owners**: services and tasks carry their client id so
//!   ownership can be checked without walking parents

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt};
