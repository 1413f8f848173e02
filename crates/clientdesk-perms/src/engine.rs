//! Permission checks against a [`PermissionTable`].
//!
//! [`Authorizer`] borrows a frozen table and answers membership queries. The
//! free functions answer the same queries against the standard table.

use clientdesk_core::{Permission, Resource, Role, ScopedRecord, Subject};

use crate::error::{AccessDenied, Result};
use crate::ownership::check_ownership;
use crate::table::PermissionTable;

/// Answers authorization queries against a permission table.
///
/// Cheap to copy; hand one to every request handler.
#[derive(Debug, Clone, Copy)]
pub struct Authorizer {
    table: &'static PermissionTable,
}

impl Default for Authorizer {
    fn default() -> Self {
        Self::standard()
    }
}

impl Authorizer {
    /// Use a custom table. The table must outlive the process.
    pub const fn new(table: &'static PermissionTable) -> Self {
        Self { table }
    }

    /// Use the standard table.
    pub fn standard() -> Self {
        Self::new(PermissionTable::standard())
    }

    pub fn table(&self) -> &'static PermissionTable {
        self.table
    }

    /// Whether `role` holds `permission` on `resource`.
    pub fn has_permission(&self, role: Role, resource: Resource, permission: Permission) -> bool {
        self.table.grants(role, resource).contains(permission)
    }

    pub fn can_view(&self, role: Role, resource: Resource) -> bool {
        self.has_permission(role, resource, Permission::View)
    }

    pub fn can_create(&self, role: Role, resource: Resource) -> bool {
        self.has_permission(role, resource, Permission::Create)
    }

    pub fn can_edit(&self, role: Role, resource: Resource) -> bool {
        self.has_permission(role, resource, Permission::Edit)
    }

    pub fn can_delete(&self, role: Role, resource: Resource) -> bool {
        self.has_permission(role, resource, Permission::Delete)
    }

    /// Category-level check for a subject.
    pub fn authorize(
        &self,
        subject: &Subject,
        resource: Resource,
        permission: Permission,
    ) -> Result<()> {
        let role = subject.role();
        let allowed = self.has_permission(role, resource, permission);
        tracing::debug!(
            user = %subject.user_id(),
            %role,
            %resource,
            %permission,
            allowed,
            "authorization check"
        );

        if allowed {
            Ok(())
        } else {
            Err(AccessDenied::NotGranted {
                role,
                resource,
                permission,
            })
        }
    }

    /// Category-level check followed by ownership narrowing.
    ///
    /// Both must pass; a table grant never overrides a scope mismatch.
    pub fn authorize_record<R: ScopedRecord + ?Sized>(
        &self,
        subject: &Subject,
        resource: Resource,
        permission: Permission,
        record: &R,
    ) -> Result<()> {
        self.authorize(subject, resource, permission)?;
        check_ownership(subject, record)
    }
}

/// Whether `role` holds `permission` on `resource` in the standard table.
pub fn has_permission(role: Role, resource: Resource, permission: Permission) -> bool {
    Authorizer::standard().has_permission(role, resource, permission)
}

pub fn can_view(role: Role, resource: Resource) -> bool {
    has_permission(role, resource, Permission::View)
}

pub fn can_create(role: Role, resource: Resource) -> bool {
    has_permission(role, resource, Permission::Create)
}

pub fn can_edit(role: Role, resource: Resource) -> bool {
    has_permission(role, resource, Permission::Edit)
}

pub fn can_delete(role: Role, resource: Resource) -> bool {
    has_permission(role, resource, Permission::Delete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::PermissionSet;
    use clientdesk_core::ClientId;

    #[test]
    fn test_finance_visibility() {
        assert!(can_view(Role::PrivilegedAdmin, Resource::Finance));
        assert!(can_view(Role::TeamMember, Resource::Finance));
        assert!(!can_view(Role::ClientUser, Resource::Finance));
    }

    #[test]
    fn test_client_creation() {
        assert!(!can_create(Role::ClientUser, Resource::Clients));
        assert!(can_create(Role::PrivilegedAdmin, Resource::Clients));
    }

    #[test]
    fn test_team_member_tasks() {
        assert!(!can_delete(Role::TeamMember, Resource::Tasks));
        assert!(can_edit(Role::TeamMember, Resource::Tasks));
        assert!(can_create(Role::TeamMember, Resource::Tasks));
    }

    #[test]
    fn test_client_user_can_comment_but_not_edit_tasks() {
        assert!(has_permission(Role::ClientUser, Resource::Tasks, Permission::Comment));
        assert!(!can_edit(Role::ClientUser, Resource::Tasks));
    }

    #[test]
    fn test_admin_cannot_edit_files() {
        assert!(!can_edit(Role::PrivilegedAdmin, Resource::Files));
        assert!(can_delete(Role::PrivilegedAdmin, Resource::Files));
    }

    #[test]
    fn test_custom_table() {
        static ONLY_FILES: PermissionTable = PermissionTable::empty().with(
            Role::ClientUser,
            Resource::Files,
            PermissionSet::of(&[Permission::View]),
        );
        let authz = Authorizer::new(&ONLY_FILES);

        assert!(authz.can_view(Role::ClientUser, Resource::Files));
        assert!(!authz.can_view(Role::PrivilegedAdmin, Resource::Clients));
    }

    #[test]
    fn test_authorize_reports_denied_triple() {
        let subject = Subject::team_member("u1");
        let err = Authorizer::standard()
            .authorize(&subject, Resource::Clients, Permission::Delete)
            .unwrap_err();

        assert_eq!(
            err,
            AccessDenied::NotGranted {
                role: Role::TeamMember,
                resource: Resource::Clients,
                permission: Permission::Delete,
            }
        );
    }

    #[test]
    fn test_ownership_narrowing_overrides_grant() {
        let authz = Authorizer::standard();
        let subject = Subject::client_user("u1", "C1");

        assert!(authz.can_view(subject.role(), Resource::Clients));
        assert!(authz
            .authorize_record(&subject, Resource::Clients, Permission::View, &ClientId::from("C1"))
            .is_ok());
        assert!(matches!(
            authz.authorize_record(
                &subject,
                Resource::Clients,
                Permission::View,
                &ClientId::from("C2")
            ),
            Err(AccessDenied::OutOfScope { .. })
        ));
    }

    #[test]
    fn test_table_denial_wins_over_matching_scope() {
        let subject = Subject::client_user("u1", "C1");
        let result = Authorizer::standard().authorize_record(
            &subject,
            Resource::Finance,
            Permission::View,
            &ClientId::from("C1"),
        );
        assert!(matches!(result, Err(AccessDenied::NotGranted { .. })));
    }
}
