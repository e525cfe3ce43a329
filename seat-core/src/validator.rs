//! Constraint validation for seating moves.
//!
//! All checks are pure reads. The move engine calls them before mutating
//! anything, so a rejected move leaves the layout byte-for-byte unchanged.

use std::collections::BTreeSet;
use thiserror::Error;

use seat_types::{GuestId, Rule, Table, TableId};

/// Stateless capacity and rule checks.
pub struct ConstraintValidator;

impl ConstraintValidator {
    /// Check that a table can accept `incoming` additional guests.
    pub fn check_capacity(table: &Table, incoming: usize) -> Result<(), Violation> {
        if table.seats.len() + incoming > table.capacity as usize {
            return Err(Violation::CapacityExceeded {
                table: table.id,
                capacity: table.capacity,
                occupied: table.seats.len(),
                incoming,
            });
        }
        Ok(())
    }

    /// Check that seating `guest` at `table` would not put both members of
    /// any rule at the same table.
    ///
    /// Rules only constrain shared tables; moves into the unassigned pool
    /// never consult this.
    pub fn check_rule_conflict(
        guest: GuestId,
        table: &Table,
        rules: &BTreeSet<Rule>,
    ) -> Result<(), Violation> {
        for rule in rules {
            if let Some(partner) = rule.partner_of(guest) {
                if table.seats.contains(&partner) {
                    return Err(Violation::RuleConflict {
                        guest,
                        other: partner,
                        table: table.id,
                    });
                }
            }
        }
        Ok(())
    }
}

/// A constraint that would be violated by a proposed move.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The destination table is full.
    #[error("table {table} is full ({occupied}/{capacity}, {incoming} incoming)")]
    CapacityExceeded {
        /// The destination table.
        table: TableId,
        /// The table's capacity.
        capacity: u32,
        /// Seats already occupied.
        occupied: usize,
        /// Guests the move would add.
        incoming: usize,
    },

    /// The moved guest must not share a table with a guest already seated
    /// there.
    #[error("guest {guest} must not sit with {other}, already at table {table}")]
    RuleConflict {
        /// The guest being moved.
        guest: GuestId,
        /// The seated partner of the violated rule.
        other: GuestId,
        /// The destination table.
        table: TableId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use seat_types::Rule;

    fn table_with(capacity: u32, seated: &[GuestId]) -> Table {
        let mut table = Table::new("Test", capacity);
        table.seats.extend_from_slice(seated);
        table
    }

    #[test]
    fn capacity_allows_exact_fill() {
        let seated = [GuestId::new(), GuestId::new()];
        let table = table_with(3, &seated);
        assert_eq!(ConstraintValidator::check_capacity(&table, 1), Ok(()));
    }

    #[test]
    fn capacity_rejects_overflow() {
        let seated = [GuestId::new(), GuestId::new(), GuestId::new()];
        let table = table_with(3, &seated);
        let err = ConstraintValidator::check_capacity(&table, 1).unwrap_err();
        assert!(matches!(
            err,
            Violation::CapacityExceeded {
                capacity: 3,
                occupied: 3,
                incoming: 1,
                ..
            }
        ));
    }

    #[test]
    fn rule_conflict_names_both_guests() {
        let mover = GuestId::new();
        let seated = GuestId::new();
        let table = table_with(4, &[seated]);
        let rules: BTreeSet<Rule> = [Rule::new(mover, seated)].into_iter().collect();

        let err = ConstraintValidator::check_rule_conflict(mover, &table, &rules).unwrap_err();
        assert_eq!(
            err,
            Violation::RuleConflict {
                guest: mover,
                other: seated,
                table: table.id,
            }
        );
    }

    #[test]
    fn rule_without_seated_partner_passes() {
        let mover = GuestId::new();
        let absent = GuestId::new();
        let table = table_with(4, &[GuestId::new()]);
        let rules: BTreeSet<Rule> = [Rule::new(mover, absent)].into_iter().collect();

        assert_eq!(
            ConstraintValidator::check_rule_conflict(mover, &table, &rules),
            Ok(())
        );
    }
}
