//! Strong type definitions for record identifiers.
//!
//! All identifiers are newtypes to prevent misuse at compile time: a
//! `ProjectId` can never be passed where a `ClientId` is expected, which
//! matters most for ownership checks.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from an existing string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identifier (16 bytes, hex-encoded).
            pub fn generate() -> Self {
                let bytes: [u8; 16] = rand::random();
                Self(hex::encode(bytes))
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier, returning the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

record_id!(
    /// Identifier of a client (the tenant boundary).
    ClientId
);
record_id!(
    /// Identifier of a project.
    ProjectId
);
record_id!(
    /// Identifier of a service within a project.
    ServiceId
);
record_id!(
    /// Identifier of a task within a service.
    TaskId
);
record_id!(
    /// Identifier of an invoice.
    InvoiceId
);
record_id!(
    /// Identifier of an authenticated user.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_hex_and_unique() {
        let a = ClientId::generate();
        let b = ClientId::generate();

        assert_eq!(a.as_str().len(), 32);
        assert!(hex::decode(a.as_str()).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_display_and_debug() {
        let id = ProjectId::new("p-1");
        assert_eq!(format!("{}", id), "p-1");
        assert_eq!(format!("{:?}", id), "ProjectId(p-1)");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ClientId::from("c1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"c1\"");
    }
}
