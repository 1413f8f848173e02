//! Identity collaborator: turns a bearer token into a [`Subject`].
//!
//! The Portal never authenticates on its own. Request handlers resolve the
//! caller through an [`IdentityProvider`] and pass the result (or `None`)
//! into every Portal operation.

use std::collections::HashMap;

use async_trait::async_trait;

use clientdesk_core::{Session, Subject};

use crate::error::{PortalError, Result};

/// Resolves tokens to authenticated subjects.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token is unknown or expired.
    async fn resolve(&self, token: &str) -> Result<Option<Subject>>;
}

/// A fixed token -> subject map, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    subjects: HashMap<String, Subject>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subject` under `token`, replacing any previous entry.
    pub fn insert(&mut self, token: impl Into<String>, subject: Subject) {
        self.subjects.insert(token.into(), subject);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, token: impl Into<String>, subject: Subject) -> Self {
        self.insert(token, subject);
        self
    }

    /// Build from session data, rejecting sessions that break the scope rule.
    pub fn from_sessions<I, T>(sessions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, Session)>,
        T: Into<String>,
    {
        let mut provider = Self::new();
        for (token, session) in sessions {
            provider.insert(token, Subject::from_session(&session)?);
        }
        Ok(provider)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Subject>> {
        Ok(self.subjects.get(token).cloned())
    }
}

/// Resolve a token that must be present and valid.
pub async fn authenticate<P: IdentityProvider + ?Sized>(
    provider: &P,
    token: Option<&str>,
) -> Result<Subject> {
    let Some(token) = token else {
        return Err(PortalError::Unauthenticated);
    };
    provider
        .resolve(token)
        .await?
        .ok_or(PortalError::Unauthenticated)
}
