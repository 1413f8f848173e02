//! The vocabulary of authorization: roles, resources, and permissions.
//!
//! Each enum has a fixed wire name (used by serde, `Display` and `FromStr`)
//! and a dense index used by the permission table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The fixed category assigned to an authenticated subject.
///
/// Roles are flat: no role inherits grants from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Full administrative access across all clients.
    #[serde(rename = "SUPER_ADMIN")]
    PrivilegedAdmin,
    /// Agency staff working on client projects.
    #[serde(rename = "TEAM_MEMBER")]
    TeamMember,
    /// A user belonging to exactly one client.
    #[serde(rename = "CLIENT")]
    ClientUser,
}

impl Role {
    /// Every role, in table order.
    pub const ALL: [Role; 3] = [Role::PrivilegedAdmin, Role::TeamMember, Role::ClientUser];

    /// Wire name of this role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::PrivilegedAdmin => "SUPER_ADMIN",
            Role::TeamMember => "TEAM_MEMBER",
            Role::ClientUser => "CLIENT",
        }
    }

    /// Dense index into the permission table.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether subjects with this role are confined to a single client.
    pub const fn is_client_scoped(self) -> bool {
        matches!(self, Role::ClientUser)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(Role::PrivilegedAdmin),
            "TEAM_MEMBER" => Ok(Role::TeamMember),
            "CLIENT" => Ok(Role::ClientUser),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// A category of protected domain objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Clients,
    Projects,
    Services,
    Tasks,
    Files,
    Analytics,
    Users,
    Finance,
}

impl Resource {
    /// Every resource, in table order.
    pub const ALL: [Resource; 8] = [
        Resource::Clients,
        Resource::Projects,
        Resource::Services,
        Resource::Tasks,
        Resource::Files,
        Resource::Analytics,
        Resource::Users,
        Resource::Finance,
    ];

    /// Wire name of this resource.
    pub const fn as_str(self) -> &'static str {
        match self {
            Resource::Clients => "clients",
            Resource::Projects => "projects",
            Resource::Services => "services",
            Resource::Tasks => "tasks",
            Resource::Files => "files",
            Resource::Analytics => "analytics",
            Resource::Users => "users",
            Resource::Finance => "finance",
        }
    }

    /// Dense index into the permission table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CoreError::UnknownResource(s.to_string()))
    }
}

/// A class of action checked against a role's grants for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    Create,
    Edit,
    Delete,
    Comment,
    Approve,
}

impl Permission {
    /// Every permission.
    pub const ALL: [Permission; 6] = [
        Permission::View,
        Permission::Create,
        Permission::Edit,
        Permission::Delete,
        Permission::Comment,
        Permission::Approve,
    ];

    /// Wire name of this permission.
    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Create => "create",
            Permission::Edit => "edit",
            Permission::Delete => "delete",
            Permission::Comment => "comment",
            Permission::Approve => "approve",
        }
    }

    /// Single-bit mask for this permission.
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::UnknownPermission(s.to_string()))
    }
}
