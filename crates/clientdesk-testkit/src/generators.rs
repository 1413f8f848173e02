//! Proptest generators for property-based testing.

use proptest::prelude::*;

use clientdesk_core::{ClientId, Permission, Resource, Role, Subject, UserId};

/// Generate any role.
pub fn role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

/// Generate any resource category.
pub fn resource() -> impl Strategy<Value = Resource> {
    prop::sample::select(Resource::ALL.to_vec())
}

/// Generate any permission.
pub fn permission() -> impl Strategy<Value = Permission> {
    prop::sample::select(Permission::ALL.to_vec())
}

/// Generate a short client id.
pub fn client_id() -> impl Strategy<Value = ClientId> {
    "[a-z0-9]{1,12}".prop_map(ClientId::from)
}

pub fn user_id() -> impl Strategy<Value = UserId> {
    "u-[a-z0-9]{1,8}".prop_map(UserId::from)
}

/// Generate a subject that satisfies the scope rule for its role.
pub fn subject() -> impl Strategy<Value = Subject> {
    (user_id(), role(), client_id()).prop_map(|(user, role, client)| match role {
        Role::PrivilegedAdmin => Subject::admin(user),
        Role::TeamMember => Subject::team_member(user),
        Role::ClientUser => Subject::client_user(user, client),
    })
}

/// Generate a client user together with a client id it does not own.
pub fn client_user_and_foreign_client() -> impl Strategy<Value = (Subject, ClientId)> {
    (user_id(), client_id(), client_id())
        .prop_filter("owner must differ", |(_, own, other)| own != other)
        .prop_map(|(user, own, other)| (Subject::client_user(user, own), other))
}
