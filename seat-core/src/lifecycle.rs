//! Guest confirmation lifecycle and check-in locking.
//!
//! Status follows the cycle unconfirmed → confirmed → cancelled →
//! unconfirmed. Check-in is outside the cycle: it sets the status to
//! checked-in and locks the guest in one step, and only an explicit unlock
//! leaves that state. Locked and checked-in are always set and cleared
//! together so the lock-coherence invariant holds after every operation.

use thiserror::Error;

use seat_types::{GuestId, GuestStatus, Layout};

/// Status transitions and check-in locking.
pub struct GuestLifecycle;

impl GuestLifecycle {
    /// Check a guest in at time `now` (unix seconds).
    ///
    /// Sets status to checked-in, locks the guest, and records the
    /// timestamp. A second check-in is rejected rather than refreshed so
    /// the original arrival time survives.
    pub fn check_in(layout: &mut Layout, guest: GuestId, now: u64) -> Result<u64, LifecycleError> {
        let record = layout
            .guest_mut(guest)
            .ok_or(LifecycleError::UnknownGuest { guest })?;
        if record.status == GuestStatus::CheckedIn {
            return Err(LifecycleError::AlreadyCheckedIn { guest });
        }
        record.status = GuestStatus::CheckedIn;
        record.locked = true;
        record.check_in_time = Some(now);
        Ok(now)
    }

    /// Advance a guest one step along the confirmation cycle and return the
    /// new status.
    pub fn cycle_status(layout: &mut Layout, guest: GuestId) -> Result<GuestStatus, LifecycleError> {
        let record = layout
            .guest_mut(guest)
            .ok_or(LifecycleError::UnknownGuest { guest })?;
        if record.status == GuestStatus::CheckedIn {
            return Err(LifecycleError::CheckedInIsLocked { guest });
        }
        record.status = record.status.cycled();
        Ok(record.status)
    }

    /// Unlock a guest, downgrading checked-in status to confirmed.
    ///
    /// The check-in timestamp is historical and survives the unlock.
    pub fn unlock(layout: &mut Layout, guest: GuestId) -> Result<(), LifecycleError> {
        let record = layout
            .guest_mut(guest)
            .ok_or(LifecycleError::UnknownGuest { guest })?;
        if record.status == GuestStatus::CheckedIn {
            record.status = GuestStatus::Confirmed;
        }
        record.locked = false;
        Ok(())
    }
}

/// Errors from lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The guest id is not on the roster.
    #[error("unknown guest {guest}")]
    UnknownGuest {
        /// The unresolved guest id.
        guest: GuestId,
    },

    /// The guest is already checked in.
    #[error("guest {guest} is already checked in")]
    AlreadyCheckedIn {
        /// The guest.
        guest: GuestId,
    },

    /// Checked-in guests keep their status until explicitly unlocked.
    #[error("guest {guest} is checked in; unlock before changing status")]
    CheckedInIsLocked {
        /// The guest.
        guest: GuestId,
    },
}
