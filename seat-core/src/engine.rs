//! Guest relocation between containers.
//!
//! A relocation is a small state machine: locate the guest, check the lock,
//! short-circuit same-container reorders, validate capacity then rules, and
//! only then mutate. All validation happens before any mutation, so a failed
//! move leaves the layout byte-for-byte unchanged.
//!
//! Moving a locked (checked-in) guest across containers is an operator-level
//! override and needs two phases: `relocate` returns a [`PendingMove`], and
//! the caller either passes it to [`MoveEngine::confirm`] or drops it to
//! cancel. A confirmed override commits the move and then unlocks the guest.

use thiserror::Error;

use seat_types::{ContainerId, GuestId, Layout};

use crate::lifecycle::{GuestLifecycle, LifecycleError};
use crate::validator::{ConstraintValidator, Violation};

/// A request to move one guest between (or within) containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// The guest to move.
    pub guest: GuestId,
    /// The container currently holding the guest.
    pub from: ContainerId,
    /// The destination container.
    pub to: ContainerId,
    /// Insertion index in the destination, clamped to its length.
    /// `None` appends.
    pub to_index: Option<usize>,
}

/// The result of a successful `relocate` call.
#[derive(Debug)]
#[must_use = "a ConfirmationRequired outcome holds a pending move that must be confirmed or dropped"]
pub enum MoveOutcome {
    /// The move was validated and committed.
    Committed,
    /// The guest is locked; the caller must confirm the override or drop
    /// the pending value to cancel.
    ConfirmationRequired(PendingMove),
}

/// A proposed move of a locked guest, awaiting confirmation.
///
/// Dropping the value cancels the move with no state change.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingMove {
    request: MoveRequest,
}

impl PendingMove {
    /// The move awaiting confirmation.
    pub fn request(&self) -> &MoveRequest {
        &self.request
    }
}

/// Orchestrates relocations, consulting the validator and lifecycle.
pub struct MoveEngine;

impl MoveEngine {
    /// Relocate a guest according to `request`.
    ///
    /// Returns [`MoveOutcome::ConfirmationRequired`] instead of committing
    /// when the guest is locked and the move crosses containers.
    pub fn relocate(layout: &mut Layout, request: MoveRequest) -> Result<MoveOutcome, MoveError> {
        Self::locate(layout, &request)?;

        let locked = layout
            .guest(request.guest)
            .map(|g| g.locked)
            .unwrap_or(false);
        if locked && request.to != request.from {
            return Ok(MoveOutcome::ConfirmationRequired(PendingMove { request }));
        }

        Self::validate_and_commit(layout, &request)?;
        Ok(MoveOutcome::Committed)
    }

    /// Commit a previously proposed locked-guest move, then unlock the guest.
    ///
    /// The layout may have changed since the proposal, so the request is
    /// located and validated again from scratch.
    pub fn confirm(layout: &mut Layout, pending: PendingMove) -> Result<(), MoveError> {
        let request = pending.request;
        Self::locate(layout, &request)?;
        Self::validate_and_commit(layout, &request)?;
        GuestLifecycle::unlock(layout, request.guest)?;
        Ok(())
    }

    fn locate(layout: &Layout, request: &MoveRequest) -> Result<(), MoveError> {
        let seats = layout
            .seats(request.from)
            .ok_or(MoveError::UnknownContainer {
                container: request.from,
            })?;
        if !seats.contains(&request.guest) {
            return Err(MoveError::NotFound {
                guest: request.guest,
                container: request.from,
            });
        }
        Ok(())
    }

    fn validate_and_commit(layout: &mut Layout, request: &MoveRequest) -> Result<(), MoveError> {
        // Same-container moves are pure permutations; the pool accepts
        // anything. Only a cross-container move into a table is validated.
        if request.to != request.from {
            if let ContainerId::Table(id) = request.to {
                let table = layout.table(id).ok_or(MoveError::UnknownContainer {
                    container: request.to,
                })?;
                ConstraintValidator::check_capacity(table, 1)?;
                ConstraintValidator::check_rule_conflict(request.guest, table, &layout.rules)?;
            }
        }

        let source = layout
            .seats_mut(request.from)
            .ok_or(MoveError::UnknownContainer {
                container: request.from,
            })?;
        let pos = source
            .iter()
            .position(|&g| g == request.guest)
            .ok_or(MoveError::NotFound {
                guest: request.guest,
                container: request.from,
            })?;
        source.remove(pos);

        let dest = layout
            .seats_mut(request.to)
            .ok_or(MoveError::UnknownContainer {
                container: request.to,
            })?;
        let index = request.to_index.unwrap_or(dest.len()).min(dest.len());
        dest.insert(index, request.guest);
        Ok(())
    }
}

/// Errors from relocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The guest is not in the stated source container.
    #[error("guest {guest} not found in {container:?}")]
    NotFound {
        /// The guest that could not be located.
        guest: GuestId,
        /// The container searched.
        container: ContainerId,
    },

    /// The source or destination container does not exist.
    #[error("container {container:?} does not exist")]
    UnknownContainer {
        /// The missing container.
        container: ContainerId,
    },

    /// The move would violate a capacity or rule constraint.
    #[error(transparent)]
    Violation(#[from] Violation),

    /// Unlocking after a confirmed override failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use seat_types::{Guest, GuestStatus, Rule, Table, TableId};

    struct Fixture {
        layout: Layout,
        t1: TableId,
        t2: TableId,
        a: GuestId,
        b: GuestId,
        c: GuestId,
    }

    // T1 (capacity 2) holds [A, B]; T2 (capacity 4) is empty; C is unassigned.
    fn fixture() -> Fixture {
        let mut layout = Layout::new();
        let (a, b, c) = (Guest::new("A"), Guest::new("B"), Guest::new("C"));
        let (aid, bid, cid) = (a.id, b.id, c.id);
        for guest in [a, b, c] {
            layout.guests.insert(guest.id, guest);
        }

        let mut t1 = Table::new("T1", 2);
        t1.seats.extend([aid, bid]);
        let t2 = Table::new("T2", 4);
        let (t1id, t2id) = (t1.id, t2.id);
        layout.tables.extend([t1, t2]);
        layout.unassigned.push(cid);

        Fixture {
            layout,
            t1: t1id,
            t2: t2id,
            a: aid,
            b: bid,
            c: cid,
        }
    }

    fn move_req(guest: GuestId, from: ContainerId, to: ContainerId) -> MoveRequest {
        MoveRequest {
            guest,
            from,
            to,
            to_index: None,
        }
    }

    #[test]
    fn move_into_full_table_fails_and_changes_nothing() {
        let mut fx = fixture();
        let before = fx.layout.clone();

        let err = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.c, ContainerId::Unassigned, ContainerId::Table(fx.t1)),
        )
        .unwrap_err();

        assert!(matches!(err, MoveError::Violation(Violation::CapacityExceeded { .. })));
        assert_eq!(fx.layout, before);
    }

    #[test]
    fn move_violating_rule_names_both_guests() {
        let mut fx = fixture();
        fx.layout.rules.insert(Rule::new(fx.b, fx.c));
        // Seat B at the roomy T2, then try to seat C beside them.
        let outcome = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.b, ContainerId::Table(fx.t1), ContainerId::Table(fx.t2)),
        )
        .unwrap();
        assert!(matches!(outcome, MoveOutcome::Committed));
        let before = fx.layout.clone();

        let err = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.c, ContainerId::Unassigned, ContainerId::Table(fx.t2)),
        )
        .unwrap_err();

        assert_eq!(
            err,
            MoveError::Violation(Violation::RuleConflict {
                guest: fx.c,
                other: fx.b,
                table: fx.t2,
            })
        );
        assert_eq!(fx.layout, before);
    }

    #[test]
    fn move_to_pool_always_succeeds() {
        let mut fx = fixture();
        let outcome = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.a, ContainerId::Table(fx.t1), ContainerId::Unassigned),
        )
        .unwrap();
        assert!(matches!(outcome, MoveOutcome::Committed));
        assert_eq!(fx.layout.unassigned, vec![fx.c, fx.a]);
        assert_eq!(fx.layout.verify(), Ok(()));
    }

    #[test]
    fn same_container_reorder_skips_validation() {
        let mut fx = fixture();
        // T1 is at capacity; a reorder inside it must still succeed.
        let outcome = MoveEngine::relocate(
            &mut fx.layout,
            MoveRequest {
                guest: fx.b,
                from: ContainerId::Table(fx.t1),
                to: ContainerId::Table(fx.t1),
                to_index: Some(0),
            },
        )
        .unwrap();
        assert!(matches!(outcome, MoveOutcome::Committed));
        assert_eq!(fx.layout.table(fx.t1).unwrap().seats, vec![fx.b, fx.a]);
    }

    #[test]
    fn to_index_is_clamped() {
        let mut fx = fixture();
        let outcome = MoveEngine::relocate(
            &mut fx.layout,
            MoveRequest {
                guest: fx.c,
                from: ContainerId::Unassigned,
                to: ContainerId::Table(fx.t2),
                to_index: Some(99),
            },
        )
        .unwrap();
        assert!(matches!(outcome, MoveOutcome::Committed));
        assert_eq!(fx.layout.table(fx.t2).unwrap().seats, vec![fx.c]);
    }

    #[test]
    fn missing_guest_is_not_found() {
        let mut fx = fixture();
        let err = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.a, ContainerId::Unassigned, ContainerId::Table(fx.t2)),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::NotFound { guest, .. } if guest == fx.a));
    }

    #[test]
    fn unknown_table_is_rejected() {
        let mut fx = fixture();
        let ghost = ContainerId::Table(TableId::new());
        let err = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.c, ContainerId::Unassigned, ghost),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::UnknownContainer { .. }));
    }

    #[test]
    fn locked_guest_requires_confirmation() {
        let mut fx = fixture();
        GuestLifecycle::check_in(&mut fx.layout, fx.a, 100).unwrap();
        let before = fx.layout.clone();

        let outcome = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.a, ContainerId::Table(fx.t1), ContainerId::Unassigned),
        )
        .unwrap();

        let pending = match outcome {
            MoveOutcome::ConfirmationRequired(p) => p,
            MoveOutcome::Committed => panic!("locked guest moved without confirmation"),
        };
        // Proposal alone changes nothing; dropping it cancels.
        assert_eq!(fx.layout, before);
        drop(pending);
        assert_eq!(fx.layout, before);
    }

    #[test]
    fn confirmed_override_moves_and_unlocks() {
        let mut fx = fixture();
        GuestLifecycle::check_in(&mut fx.layout, fx.a, 100).unwrap();

        let outcome = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.a, ContainerId::Table(fx.t1), ContainerId::Unassigned),
        )
        .unwrap();
        let pending = match outcome {
            MoveOutcome::ConfirmationRequired(p) => p,
            MoveOutcome::Committed => panic!("expected confirmation"),
        };

        MoveEngine::confirm(&mut fx.layout, pending).unwrap();

        assert!(fx.layout.unassigned.contains(&fx.a));
        let guest = fx.layout.guest(fx.a).unwrap();
        assert!(!guest.locked);
        assert_eq!(guest.status, GuestStatus::Confirmed);
        assert_eq!(fx.layout.verify(), Ok(()));
    }

    #[test]
    fn locked_guest_reorders_in_place_without_confirmation() {
        let mut fx = fixture();
        GuestLifecycle::check_in(&mut fx.layout, fx.a, 100).unwrap();

        let outcome = MoveEngine::relocate(
            &mut fx.layout,
            MoveRequest {
                guest: fx.a,
                from: ContainerId::Table(fx.t1),
                to: ContainerId::Table(fx.t1),
                to_index: Some(1),
            },
        )
        .unwrap();
        assert!(matches!(outcome, MoveOutcome::Committed));
        assert_eq!(fx.layout.table(fx.t1).unwrap().seats, vec![fx.b, fx.a]);
        // Still locked: in-place reorder is not an override.
        assert!(fx.layout.guest(fx.a).unwrap().locked);
    }

    #[test]
    fn stale_confirmation_is_revalidated() {
        let mut fx = fixture();
        GuestLifecycle::check_in(&mut fx.layout, fx.a, 100).unwrap();

        let outcome = MoveEngine::relocate(
            &mut fx.layout,
            move_req(fx.a, ContainerId::Table(fx.t1), ContainerId::Table(fx.t2)),
        )
        .unwrap();
        let pending = match outcome {
            MoveOutcome::ConfirmationRequired(p) => p,
            MoveOutcome::Committed => panic!("expected confirmation"),
        };

        // A collaborator moved the guest away before the confirm arrived.
        fx.layout.tables[0].seats.retain(|&g| g != fx.a);
        fx.layout.unassigned.push(fx.a);

        let err = MoveEngine::confirm(&mut fx.layout, pending).unwrap_err();
        assert!(matches!(err, MoveError::NotFound { .. }));
    }
}
