//! Roster management: guests, tables, rules, and layout reset.

use thiserror::Error;

use seat_types::{Guest, GuestId, Layout, Rule, Table, TableId};

/// Guest, table, and rule management on a layout.
pub struct Roster;

impl Roster {
    /// Add a batch of guests to the unassigned pool, in input order.
    ///
    /// Each guest starts unconfirmed and unlocked. Returns the new ids in
    /// the same order as `names`.
    pub fn add_guests<I, S>(layout: &mut Layout, names: I) -> Vec<GuestId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(|name| {
                let guest = Guest::new(name);
                let id = guest.id;
                layout.guests.insert(id, guest);
                layout.unassigned.push(id);
                id
            })
            .collect()
    }

    /// Hard-delete a guest: remove it from whichever container holds it,
    /// drop its record, and prune any rules referencing it.
    pub fn delete_guest(layout: &mut Layout, guest: GuestId) -> Result<(), RosterError> {
        if layout.guests.remove(&guest).is_none() {
            return Err(RosterError::UnknownGuest { guest });
        }
        layout.unassigned.retain(|&g| g != guest);
        for table in &mut layout.tables {
            table.seats.retain(|&g| g != guest);
        }
        layout.rules.retain(|rule| !rule.involves(guest));
        Ok(())
    }

    /// Create a table with the given capacity (must be at least 1).
    pub fn add_table(
        layout: &mut Layout,
        name: impl Into<String>,
        capacity: u32,
    ) -> Result<TableId, RosterError> {
        if capacity == 0 {
            return Err(RosterError::ZeroCapacity);
        }
        let table = Table::new(name, capacity);
        let id = table.id;
        layout.tables.push(table);
        Ok(id)
    }

    /// Delete a table, transferring its seated guests (in seat order) to the
    /// unassigned pool. Guests are never destroyed by table deletion.
    pub fn delete_table(layout: &mut Layout, table: TableId) -> Result<(), RosterError> {
        let pos = layout
            .tables
            .iter()
            .position(|t| t.id == table)
            .ok_or(RosterError::UnknownTable { table })?;
        let removed = layout.tables.remove(pos);
        layout.unassigned.extend(removed.seats);
        Ok(())
    }

    /// Add a "must not share a table" rule between two guests.
    ///
    /// Rejects self-pairs and unknown guests. The pair is canonicalized, so
    /// adding `(a, b)` and `(b, a)` yields one rule.
    pub fn add_rule(layout: &mut Layout, a: GuestId, b: GuestId) -> Result<(), RosterError> {
        if a == b {
            return Err(RosterError::SelfRule { guest: a });
        }
        for guest in [a, b] {
            if !layout.guests.contains_key(&guest) {
                return Err(RosterError::UnknownGuest { guest });
            }
        }
        layout.rules.insert(Rule::new(a, b));
        Ok(())
    }

    /// Remove the rule between two guests, if present.
    pub fn remove_rule(layout: &mut Layout, a: GuestId, b: GuestId) -> bool {
        layout.rules.remove(&Rule::new(a, b))
    }

    /// Return every seated guest to the unassigned pool and remove all
    /// tables. Guest records and rules are kept.
    pub fn reset_assignments(layout: &mut Layout) {
        for table in layout.tables.drain(..) {
            layout.unassigned.extend(table.seats);
        }
    }
}

/// Errors from roster operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// The guest id is not on the roster.
    #[error("unknown guest {guest}")]
    UnknownGuest {
        /// The unresolved guest id.
        guest: GuestId,
    },

    /// The table id does not exist.
    #[error("unknown table {table}")]
    UnknownTable {
        /// The unresolved table id.
        table: TableId,
    },

    /// A rule cannot pair a guest with themselves.
    #[error("guest {guest} cannot have a rule against themselves")]
    SelfRule {
        /// The guest.
        guest: GuestId,
    },

    /// Tables must seat at least one guest.
    #[error("table capacity must be at least 1")]
    ZeroCapacity,
}
