//! Record-level narrowing on top of the permission table.
//!
//! The table grants category access ("client users may view clients").
//! These checks confine a scoped subject to the records of its own client,
//! and optionally confine staff to the clients they are assigned to.

use clientdesk_core::{Client, ClientId, Role, ScopedRecord, Subject};

use crate::error::{AccessDenied, Result};

/// Deny access when the subject is scoped and `record` belongs to another client.
///
/// Unscoped subjects always pass; they are limited by the table alone.
pub fn check_ownership<R: ScopedRecord + ?Sized>(subject: &Subject, record: &R) -> Result<()> {
    let Some(scope) = subject.scope() else {
        return Ok(());
    };

    let owner = record.owning_client();
    if scope == owner {
        return Ok(());
    }

    tracing::debug!(
        user = %subject.user_id(),
        %scope,
        %owner,
        "ownership check failed"
    );
    Err(AccessDenied::OutOfScope {
        scope: scope.clone(),
        owner: owner.clone(),
    })
}

/// The only client a list query may return for this subject, if restricted.
pub fn visible_client_filter(subject: &Subject) -> Option<&ClientId> {
    subject.scope()
}

/// Whether the subject works on `client`.
///
/// Administrators are assigned everywhere, team members only where listed
/// in the client's team, client users only on their own client.
pub fn is_assigned(subject: &Subject, client: &Client) -> bool {
    match subject.role() {
        Role::PrivilegedAdmin => true,
        Role::TeamMember => client.assigned_team.contains(subject.user_id()),
        Role::ClientUser => subject.scope() == Some(&client.id),
    }
}

/// Like [`is_assigned`], as a check.
pub fn check_assignment(subject: &Subject, client: &Client) -> Result<()> {
    if is_assigned(subject, client) {
        Ok(())
    } else {
        Err(AccessDenied::NotAssigned(client.id.clone()))
    }
}
