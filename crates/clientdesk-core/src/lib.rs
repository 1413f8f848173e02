//! # Clientdesk Core
//!
//! Pure types for the Clientdesk client portal: who is acting, what they act
//! on, and the records they act on.
//!
//! This crate contains no I/O, no storage, no authorization decisions. The
//! permission table lives in `clientdesk-perms`; persistence lives in
//! `clientdesk-store`.
//!
//! ## Key Types
//!
//! - [`Role`], [`Resource`], [`Permission`] - the vocabulary of the permission table
//! - [`Subject`] - an authenticated actor, optionally scoped to one client
//! - [`ScopedRecord`] - any record owned by a client
//! - [`Client`], [`Project`], [`Service`], [`Task`], [`Invoice`] - domain records
//! - [`ClientProgress`], [`ChecklistProgress`] - aggregates shown on dashboards

pub mod access;
pub mod error;
pub mod progress;
pub mod records;
pub mod subject;
pub mod types;

pub use access::{Permission, Resource, Role};
pub use error::{CoreError, Result};
pub use progress::{percent, ChecklistProgress, ClientProgress};
pub use records::{
    ActivityAction, ActivityEntry, ChecklistItem, ChecklistStatus, Client, ClientStatus,
    ClientUpdate, EntityKind, Invoice, InvoiceStatus, NewClient, NewProject, NewService, NewTask,
    OnboardingChecklist, Project, ProjectStatus, Service, ServiceKind, ServiceStatus, Task,
    TaskComment, TaskStatus, DEFAULT_CHECKLIST,
};
pub use subject::{ScopedRecord, Session, Subject};
pub use types::{ClientId, InvoiceId, ProjectId, ServiceId, TaskId, UserId};

/// Get current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
