//! Identifier newtypes.
//!
//! Satellites and playbooks are identified by the human-readable names the
//! scenario script and the operator use (`"Flock 4g-16"`, `"Playbook-04"`),
//! so they wrap a [`String`]. Audit events are machine-generated and use
//! UUID v7 (time-ordered) like every other generated identifier.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a newtype wrapper around a human-readable [`String`] name.
macro_rules! define_name {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from its display name.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }
    };
}

define_name! {
    /// Identifier of a satellite in the fleet (e.g. `"Flock 4g-14"`).
    SatelliteId
}

define_name! {
    /// Identifier of a remediation playbook (e.g. `"Playbook-04"`).
    PlaybookId
}

define_id! {
    /// Unique identifier for an entry in the approval audit trail.
    AuditEventId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_ids_serialize_as_plain_strings() {
        let id = SatelliteId::new("Flock 4g-16");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"Flock 4g-16\""));
    }

    #[test]
    fn name_ids_compare_by_name() {
        assert_eq!(PlaybookId::from("Playbook-04"), PlaybookId::new("Playbook-04"));
        assert_ne!(PlaybookId::from("Playbook-04"), PlaybookId::from("Playbook-07"));
    }

    #[test]
    fn audit_ids_are_unique() {
        let a = AuditEventId::new();
        let b = AuditEventId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }
}
