//! The permission table.
//!
//! The table is a dense `[role][resource]` array of permission bit sets,
//! built at compile time. It has no write path: once the process starts it
//! is a plain `static`, safe to read from any number of threads.

use std::fmt;

use clientdesk_core::{Permission, Resource, Role};

/// A set of permissions, stored as a bit mask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionSet(u8);

impl PermissionSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Build a set from a list of permissions.
    pub const fn of(permissions: &[Permission]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < permissions.len() {
            bits |= permissions[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate members in [`Permission::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl fmt::Debug for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        let mut first = true;
        for p in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(p.as_str())?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |bits, p| bits | p.bit()))
    }
}

const ROLES: usize = Role::ALL.len();
const RESOURCES: usize = Resource::ALL.len();

/// Fixed mapping from (role, resource) to granted permissions.
///
/// Every cell not explicitly granted is [`PermissionSet::EMPTY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    cells: [[PermissionSet; RESOURCES]; ROLES],
}

use Permission::{Comment, Create, Delete, Edit, View};

const CRUD: PermissionSet = PermissionSet::of(&[View, Create, Edit, Delete]);
const VIEW: PermissionSet = PermissionSet::of(&[View]);

// Rows follow `Role::ALL`; columns follow `Resource::ALL`:
// clients, projects, services, tasks, files, analytics, users, finance.
static STANDARD: PermissionTable = PermissionTable {
    cells: [
        // PrivilegedAdmin
        [
            CRUD,
            CRUD,
            CRUD,
            CRUD,
            PermissionSet::of(&[View, Create, Delete]),
            VIEW,
            CRUD,
            CRUD,
        ],
        // TeamMember
        [
            VIEW,
            PermissionSet::of(&[View, Edit]),
            PermissionSet::of(&[View, Edit]),
            PermissionSet::of(&[View, Create, Edit]),
            PermissionSet::of(&[View, Create]),
            VIEW,
            VIEW,
            VIEW,
        ],
        // ClientUser
        [
            VIEW,
            VIEW,
            VIEW,
            PermissionSet::of(&[View, Comment]),
            PermissionSet::of(&[View, Create]),
            PermissionSet::EMPTY,
            PermissionSet::EMPTY,
            PermissionSet::EMPTY,
        ],
    ],
};

impl PermissionTable {
    /// The table every deployment uses.
    pub fn standard() -> &'static PermissionTable {
        &STANDARD
    }

    /// A table granting nothing.
    pub const fn empty() -> Self {
        Self {
            cells: [[PermissionSet::EMPTY; RESOURCES]; ROLES],
        }
    }

    /// Replace one cell. Used to build custom tables before they are frozen.
    pub const fn with(mut self, role: Role, resource: Resource, grants: PermissionSet) -> Self {
        self.cells[role.index()][resource.index()] = grants;
        self
    }

    /// Permissions granted to `role` on `resource`.
    pub const fn grants(&self, role: Role, resource: Resource) -> PermissionSet {
        self.cells[role.index()][resource.index()]
    }

    /// Every cell of the table, row by row.
    pub fn entries(&self) -> impl Iterator<Item = (Role, Resource, PermissionSet)> + '_ {
        Role::ALL.into_iter().flat_map(move |role| {
            Resource::ALL
                .into_iter()
                .map(move |resource| (role, resource, self.grants(role, resource)))
        })
    }
}
