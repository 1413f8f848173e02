//! # Clientdesk Testkit
//!
//! Testing utilities for Clientdesk.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a seeded demo tenant (staff, one client, its client user,
//!   a project with two services) behind a ready [`Portal`](clientdesk::Portal)
//! - **Generators**: Proptest strategies for roles, resources, permissions
//!   and subjects
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use clientdesk_testkit::fixtures::TestFixture;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let fixture = TestFixture::seeded().await?;
//!     let visible = fixture
//!         .portal
//!         .list_clients(Some(&fixture.demo.client_user))
//!         .await?;
//!     assert_eq!(visible.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use clientdesk_testkit::generators::{permission, resource, subject};
//!
//! proptest! {
//!     #[test]
//!     fn decisions_are_stable(s in subject(), r in resource(), p in permission()) {
//!         let authz = clientdesk_perms::Authorizer::standard();
//!         prop_assert_eq!(authz.authorize(&s, r, p), authz.authorize(&s, r, p));
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{seed_client, seed_demo, DemoTenant, TestFixture};
pub use generators::{client_id, permission, resource, role, subject};
