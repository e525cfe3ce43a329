//! The seating data model: guests, tables, rules, and the Layout.
//!
//! A [`Layout`] is the complete state for one event. Guest records live in a
//! single directory; tables and the unassigned pool hold only guest ids, so
//! exclusive ownership (every guest seated in exactly one place) is a property
//! of the id sequences rather than of duplicated records.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::{GuestId, TableId};

/// Confirmation lifecycle status of a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuestStatus {
    /// Invited, no response yet. The initial status.
    Unconfirmed,
    /// Confirmed attendance.
    Confirmed,
    /// Cancelled attendance.
    Cancelled,
    /// Arrived and checked in at the event. Only entered via check-in,
    /// only exited via an explicit unlock.
    CheckedIn,
}

impl GuestStatus {
    /// Advance along the cycle `unconfirmed → confirmed → cancelled → unconfirmed`.
    ///
    /// Checked-in is not part of the cycle and maps to itself; callers must
    /// reject cycling a checked-in guest before calling this.
    pub fn cycled(self) -> Self {
        match self {
            Self::Unconfirmed => Self::Confirmed,
            Self::Confirmed => Self::Cancelled,
            Self::Cancelled => Self::Unconfirmed,
            Self::CheckedIn => Self::CheckedIn,
        }
    }
}

/// A guest on the event's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    /// Unique identifier.
    pub id: GuestId,
    /// Display name.
    pub name: String,
    /// Confirmation lifecycle status.
    pub status: GuestStatus,
    /// Whether the guest is locked against relocation.
    ///
    /// Invariant: `locked == true` implies `status == CheckedIn`; the two
    /// fields are always set and cleared together.
    #[serde(default)]
    pub locked: bool,
    /// Unix timestamp (seconds) of check-in, if checked in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<u64>,
}

impl Guest {
    /// Create a new guest: unconfirmed, unlocked, not checked in.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GuestId::new(),
            name: name.into(),
            status: GuestStatus::Unconfirmed,
            locked: false,
            check_in_time: None,
        }
    }
}

/// A seating table with a fixed capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Unique identifier.
    pub id: TableId,
    /// Display name.
    pub name: String,
    /// Maximum number of seats. Always greater than zero.
    pub capacity: u32,
    /// Seated guests, in seat order.
    pub seats: Vec<GuestId>,
}

impl Table {
    /// Create a new empty table.
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: TableId::new(),
            name: name.into(),
            capacity,
            seats: Vec::new(),
        }
    }

    /// Number of occupied seats.
    pub fn occupied(&self) -> usize {
        self.seats.len()
    }
}

/// A "must never share a table" rule between two guests.
///
/// The pair is unordered; construction canonicalizes it by sorting the ids so
/// `(a, b)` and `(b, a)` are the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rule(GuestId, GuestId);

impl Rule {
    /// Create a canonicalized rule between two guests.
    pub fn new(a: GuestId, b: GuestId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Check whether the rule involves the given guest.
    pub fn involves(&self, guest: GuestId) -> bool {
        self.0 == guest || self.1 == guest
    }

    /// The other member of the pair, if the rule involves the given guest.
    pub fn partner_of(&self, guest: GuestId) -> Option<GuestId> {
        if self.0 == guest {
            Some(self.1)
        } else if self.1 == guest {
            Some(self.0)
        } else {
            None
        }
    }

    /// Both members of the pair, in canonical order.
    pub fn members(&self) -> (GuestId, GuestId) {
        (self.0, self.1)
    }
}

/// Identifies a guest container: a specific table or the unassigned pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerId {
    /// A seating table.
    Table(TableId),
    /// The unassigned pool - conceptually a table with no capacity limit.
    Unassigned,
}

/// The complete seating state for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Layout {
    /// Directory of every guest record, keyed by id.
    pub guests: BTreeMap<GuestId, Guest>,
    /// Seating tables, in display order.
    pub tables: Vec<Table>,
    /// Guests not assigned to any table, in display order.
    pub unassigned: Vec<GuestId>,
    /// "Must not share a table" rules.
    pub rules: BTreeSet<Rule>,
}

impl Layout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a guest record.
    pub fn guest(&self, id: GuestId) -> Option<&Guest> {
        self.guests.get(&id)
    }

    /// Look up a guest record mutably.
    pub fn guest_mut(&mut self, id: GuestId) -> Option<&mut Guest> {
        self.guests.get_mut(&id)
    }

    /// Look up a table.
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    /// Look up a table mutably.
    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == id)
    }

    /// The container currently holding the given guest, if any.
    pub fn container_of(&self, guest: GuestId) -> Option<ContainerId> {
        if self.unassigned.contains(&guest) {
            return Some(ContainerId::Unassigned);
        }
        self.tables
            .iter()
            .find(|t| t.seats.contains(&guest))
            .map(|t| ContainerId::Table(t.id))
    }

    /// The seat sequence of a container, if the container exists.
    pub fn seats(&self, container: ContainerId) -> Option<&Vec<GuestId>> {
        match container {
            ContainerId::Unassigned => Some(&self.unassigned),
            ContainerId::Table(id) => self.table(id).map(|t| &t.seats),
        }
    }

    /// The seat sequence of a container, mutably.
    pub fn seats_mut(&mut self, container: ContainerId) -> Option<&mut Vec<GuestId>> {
        match container {
            ContainerId::Unassigned => Some(&mut self.unassigned),
            ContainerId::Table(id) => self.table_mut(id).map(|t| &mut t.seats),
        }
    }

    /// Total number of guests on the roster.
    pub fn guest_count(&self) -> usize {
        self.guests.len()
    }

    /// Number of guests seated at tables.
    pub fn assigned_count(&self) -> usize {
        self.tables.iter().map(|t| t.seats.len()).sum()
    }

    /// Verify the structural invariants of the layout.
    ///
    /// 1. Exclusive ownership: every guest id appears in exactly one of
    ///    {a table's seats, the unassigned pool}, and every seated id has a
    ///    guest record.
    /// 2. Capacity: no table seats more guests than its capacity.
    /// 3. Rule satisfaction: no table contains both members of any rule.
    /// 4. Lock coherence: `locked` implies `status == CheckedIn` and vice versa.
    pub fn verify(&self) -> Result<(), LayoutError> {
        let mut seen: BTreeSet<GuestId> = BTreeSet::new();
        let containers = self
            .tables
            .iter()
            .map(|t| (&t.seats, Some(t)))
            .chain(std::iter::once((&self.unassigned, None)));

        for (seats, table) in containers {
            for &id in seats {
                if !self.guests.contains_key(&id) {
                    return Err(LayoutError::UnknownGuest { guest: id });
                }
                if !seen.insert(id) {
                    return Err(LayoutError::DuplicateSeat { guest: id });
                }
            }
            if let Some(table) = table {
                if table.capacity == 0 {
                    return Err(LayoutError::ZeroCapacity { table: table.id });
                }
                if table.seats.len() > table.capacity as usize {
                    return Err(LayoutError::OverCapacity {
                        table: table.id,
                        occupied: table.seats.len(),
                        capacity: table.capacity,
                    });
                }
                for rule in &self.rules {
                    let (a, b) = rule.members();
                    if table.seats.contains(&a) && table.seats.contains(&b) {
                        return Err(LayoutError::RuleViolated {
                            table: table.id,
                            a,
                            b,
                        });
                    }
                }
            }
        }

        for (&id, guest) in &self.guests {
            if !seen.contains(&id) {
                return Err(LayoutError::OrphanGuest { guest: id });
            }
            if guest.locked != (guest.status == GuestStatus::CheckedIn) {
                return Err(LayoutError::LockIncoherent { guest: id });
            }
        }

        Ok(())
    }
}

/// Structural invariant violations found by [`Layout::verify`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// A seat references a guest id with no record in the directory.
    #[error("seat references unknown guest {guest}")]
    UnknownGuest {
        /// The unresolved guest id.
        guest: GuestId,
    },

    /// A guest id appears in more than one container.
    #[error("guest {guest} is seated in more than one container")]
    DuplicateSeat {
        /// The duplicated guest id.
        guest: GuestId,
    },

    /// A guest record exists but is seated nowhere.
    #[error("guest {guest} is not seated in any container")]
    OrphanGuest {
        /// The unseated guest id.
        guest: GuestId,
    },

    /// A table was created with capacity zero.
    #[error("table {table} has zero capacity")]
    ZeroCapacity {
        /// The offending table.
        table: TableId,
    },

    /// A table seats more guests than its capacity.
    #[error("table {table} seats {occupied} guests but has capacity {capacity}")]
    OverCapacity {
        /// The offending table.
        table: TableId,
        /// Seats occupied.
        occupied: usize,
        /// The table's capacity.
        capacity: u32,
    },

    /// A table seats both members of a rule.
    #[error("table {table} seats both {a} and {b}, which must not share a table")]
    RuleViolated {
        /// The offending table.
        table: TableId,
        /// First rule member.
        a: GuestId,
        /// Second rule member.
        b: GuestId,
    },

    /// A guest's locked flag disagrees with its status.
    #[error("guest {guest} has an incoherent locked/status pair")]
    LockIncoherent {
        /// The offending guest.
        guest: GuestId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seated_layout() -> (Layout, GuestId, TableId) {
        let mut layout = Layout::new();
        let guest = Guest::new("Ada");
        let gid = guest.id;
        layout.guests.insert(gid, guest);
        let mut table = Table::new("Head table", 4);
        let tid = table.id;
        table.seats.push(gid);
        layout.tables.push(table);
        (layout, gid, tid)
    }

    #[test]
    fn status_cycle_order() {
        assert_eq!(GuestStatus::Unconfirmed.cycled(), GuestStatus::Confirmed);
        assert_eq!(GuestStatus::Confirmed.cycled(), GuestStatus::Cancelled);
        assert_eq!(GuestStatus::Cancelled.cycled(), GuestStatus::Unconfirmed);
    }

    #[test]
    fn status_cycle_never_reaches_checked_in() {
        let mut status = GuestStatus::Unconfirmed;
        for _ in 0..10 {
            status = status.cycled();
            assert_ne!(status, GuestStatus::CheckedIn);
        }
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&GuestStatus::CheckedIn).unwrap();
        assert_eq!(json, "\"checked-in\"");
        let back: GuestStatus = serde_json::from_str("\"unconfirmed\"").unwrap();
        assert_eq!(back, GuestStatus::Unconfirmed);
    }

    #[test]
    fn new_guest_defaults() {
        let guest = Guest::new("Ada");
        assert_eq!(guest.status, GuestStatus::Unconfirmed);
        assert!(!guest.locked);
        assert!(guest.check_in_time.is_none());
    }

    #[test]
    fn rule_is_canonical() {
        let a = GuestId::new();
        let b = GuestId::new();
        assert_eq!(Rule::new(a, b), Rule::new(b, a));
    }

    #[test]
    fn rule_partner_lookup() {
        let a = GuestId::new();
        let b = GuestId::new();
        let c = GuestId::new();
        let rule = Rule::new(a, b);
        assert_eq!(rule.partner_of(a), Some(b));
        assert_eq!(rule.partner_of(b), Some(a));
        assert_eq!(rule.partner_of(c), None);
        assert!(rule.involves(a));
        assert!(!rule.involves(c));
    }

    #[test]
    fn container_of_finds_table_and_pool() {
        let (mut layout, gid, tid) = seated_layout();
        assert_eq!(layout.container_of(gid), Some(ContainerId::Table(tid)));

        let pooled = Guest::new("Bob");
        let pid = pooled.id;
        layout.guests.insert(pid, pooled);
        layout.unassigned.push(pid);
        assert_eq!(layout.container_of(pid), Some(ContainerId::Unassigned));
        assert_eq!(layout.container_of(GuestId::new()), None);
    }

    #[test]
    fn verify_accepts_valid_layout() {
        let (layout, _, _) = seated_layout();
        assert_eq!(layout.verify(), Ok(()));
    }

    #[test]
    fn verify_rejects_duplicate_seat() {
        let (mut layout, gid, _) = seated_layout();
        layout.unassigned.push(gid);
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::DuplicateSeat { guest }) if guest == gid
        ));
    }

    #[test]
    fn verify_rejects_orphan_guest() {
        let (mut layout, _, _) = seated_layout();
        let orphan = Guest::new("Nobody");
        let oid = orphan.id;
        layout.guests.insert(oid, orphan);
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::OrphanGuest { guest }) if guest == oid
        ));
    }

    #[test]
    fn verify_rejects_over_capacity() {
        let (mut layout, _, tid) = seated_layout();
        layout.table_mut(tid).unwrap().capacity = 4;
        for name in ["B", "C", "D", "E"] {
            let guest = Guest::new(name);
            let gid = guest.id;
            layout.guests.insert(gid, guest);
            layout.table_mut(tid).unwrap().seats.push(gid);
        }
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::OverCapacity { table, .. }) if table == tid
        ));
    }

    #[test]
    fn verify_rejects_seated_rule_pair() {
        let (mut layout, gid, tid) = seated_layout();
        let other = Guest::new("Rival");
        let oid = other.id;
        layout.guests.insert(oid, other);
        layout.table_mut(tid).unwrap().seats.push(oid);
        layout.rules.insert(Rule::new(gid, oid));
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::RuleViolated { table, .. }) if table == tid
        ));
    }

    #[test]
    fn verify_rejects_incoherent_lock() {
        let (mut layout, gid, _) = seated_layout();
        layout.guest_mut(gid).unwrap().locked = true; // status still Unconfirmed
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::LockIncoherent { guest }) if guest == gid
        ));
    }
}
