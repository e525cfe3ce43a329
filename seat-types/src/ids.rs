//! Identity and ordering types for SeatSync.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Parse an identifier from its hyphenated string form.
            pub fn parse(s: &str) -> Option<Self> {
                uuid::Uuid::parse_str(s).ok().map(Self)
            }

            /// Get the inner UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
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

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), &self.to_string()[..8])
            }
        }
    };
}

uuid_id! {
    /// A unique identifier for a guest.
    ///
    /// UUID v4, assigned when the guest is created by a batch add or import.
    GuestId
}

uuid_id! {
    /// A unique identifier for a seating table.
    TableId
}

uuid_id! {
    /// A unique identifier for an event (one complete seating layout).
    EventId
}

uuid_id! {
    /// A unique identifier for an editor session.
    ///
    /// Used by the broadcast protocol for echo suppression and presence.
    EditorId
}

/// A monotonically increasing revision number for one event's layout.
///
/// Bumped by a session on every committed local mutation and carried on every
/// broadcast [`Delta`](crate::Delta). Revisions are more reliable than
/// timestamps because editor clocks can drift.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Revision(u64);

impl Revision {
    /// Create a new Revision with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this Revision.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Create a Revision representing "never edited".
    pub fn zero() -> Self {
        Self(0)
    }

    /// Increment the revision by one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_id_is_uuid_v4() {
        let id = GuestId::new();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn guest_id_parse_roundtrip() {
        let original = GuestId::new();
        let restored = GuestId::parse(&original.to_string()).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn guest_id_parse_rejects_garbage() {
        assert!(GuestId::parse("not-a-uuid").is_none());
        assert!(GuestId::parse("").is_none());
    }

    #[test]
    fn ids_are_distinct() {
        assert_ne!(EventId::new(), EventId::new());
        assert_ne!(EditorId::new(), EditorId::new());
    }

    #[test]
    fn revision_ordering() {
        let r1 = Revision::new(100);
        let r2 = Revision::new(200);
        assert!(r1 < r2);
        assert!(r2 > r1);
    }

    #[test]
    fn revision_next() {
        let r = Revision::new(100);
        assert_eq!(r.next().value(), 101);
    }

    #[test]
    fn revision_zero() {
        assert_eq!(Revision::zero().value(), 0);
    }

    #[test]
    fn revision_saturating_add() {
        let r = Revision::new(u64::MAX);
        assert_eq!(r.next().value(), u64::MAX); // Saturates, doesn't wrap
    }
}
