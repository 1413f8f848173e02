//! Authenticated subjects and client-scoped records.
//!
//! A [`Subject`] is built per request from the session handed over by the
//! identity provider and discarded when the request ends.

use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::error::{CoreError, Result};
use crate::types::{ClientId, UserId};

/// Session data as handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
}

/// The authenticated actor of a request.
///
/// Invariant: `scope` is present if and only if `role` is
/// [`Role::ClientUser`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    user_id: UserId,
    role: Role,
    scope: Option<ClientId>,
}

impl Subject {
    /// Create a subject, checking the role/scope invariant.
    pub fn new(user_id: UserId, role: Role, scope: Option<ClientId>) -> Result<Self> {
        match (role.is_client_scoped(), scope.is_some()) {
            (true, false) => Err(CoreError::InvalidSubject(format!(
                "{} subject {} has no owning client",
                role, user_id
            ))),
            (false, true) => Err(CoreError::InvalidSubject(format!(
                "{} subject {} must not carry a client scope",
                role, user_id
            ))),
            _ => Ok(Self {
                user_id,
                role,
                scope,
            }),
        }
    }

    /// Build a subject from identity-provider session data.
    pub fn from_session(session: &Session) -> Result<Self> {
        Self::new(
            session.user_id.clone(),
            session.role,
            session.client_id.clone(),
        )
    }

    /// A privileged administrator.
    pub fn admin(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::PrivilegedAdmin,
            scope: None,
        }
    }

    /// A team member.
    pub fn team_member(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::TeamMember,
            scope: None,
        }
    }

    /// A client user confined to `client_id`.
    pub fn client_user(user_id: impl Into<UserId>, client_id: impl Into<ClientId>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::ClientUser,
            scope: Some(client_id.into()),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The owning client this subject is confined to, if any.
    pub fn scope(&self) -> Option<&ClientId> {
        self.scope.as_ref()
    }

    /// Convert back into session data.
    pub fn to_session(&self) -> Session {
        Session {
            user_id: self.user_id.clone(),
            role: self.role,
            client_id: self.scope.clone(),
        }
    }
}

/// A record owned by a single client.
///
/// Ownership narrowing compares a subject's scope against
/// [`ScopedRecord::owning_client`].
pub trait ScopedRecord {
    fn owning_client(&self) -> &ClientId;
}

impl ScopedRecord for ClientId {
    fn owning_client(&self) -> &ClientId {
        self
    }
}

impl<T: ScopedRecord + ?Sized> ScopedRecord for &T {
    fn owning_client(&self) -> &ClientId {
        (**self).owning_client()
    }
}
