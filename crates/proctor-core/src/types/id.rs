//! Newtype wrappers around [`uuid::Uuid`] for relay-assigned identifiers.
//!
//! Student identities are client-asserted strings and are not wrapped here;
//! only identifiers the relay mints itself live in this module.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a newtype ID wrapper around `Uuid`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

    };
}

define_id!(
    /// Unique identifier for one accepted WebSocket connection.
    ConnectionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_is_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn test_connection_id_displays_as_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(ConnectionId(uuid).to_string(), uuid.to_string());
    }

    #[test]
    fn test_connection_id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&ConnectionId(uuid)).expect("serialize");
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
