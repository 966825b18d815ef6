use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a Uuid-backed identifier newtype.
///
/// Each identifier wraps a UUID to provide type safety and prevent mixing up
/// a train id with an order id, even though both are UUIDs underneath.
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(
    /// Identifies a train in the catalogue.
    TrainId
);

typed_id!(
    /// Identifies a station in the catalogue.
    StationId
);

typed_id!(
    /// Identifies a registered user (the account that pays for orders).
    UserId
);

typed_id!(
    /// Identifies a passenger profile owned by a user.
    PassengerId
);

typed_id!(
    /// Identifies an order.
    OrderId
);

typed_id!(
    /// Identifies a single ticket row.
    TicketId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_ids() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = TrainId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn display_matches_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(TicketId::from(uuid).to_string(), uuid.to_string());
    }

    #[test]
    fn serializes_transparently() {
        let id = PassengerId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let back: PassengerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
