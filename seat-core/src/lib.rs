//! # seatsync-core
//!
//! Pure seating logic for SeatSync. Everything in this crate operates on a
//! [`Layout`](seat_types::Layout) passed in by the caller; there is no I/O,
//! no clock, and no global state, so every operation is instantly testable.
//!
//! - [`validator`] - capacity and rule checks, consulted before any commit
//! - [`lifecycle`] - guest status cycle, check-in, unlock
//! - [`engine`] - drag-and-drop relocation with two-phase locked-guest override
//! - [`roster`] - guest/table/rule management and layout reset
//! - [`seating`] - plan generation fallback, assistant payload parsing, chart

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod lifecycle;
pub mod roster;
pub mod seating;
pub mod validator;

pub use engine::{MoveEngine, MoveError, MoveOutcome, MoveRequest, PendingMove};
pub use lifecycle::{GuestLifecycle, LifecycleError};
pub use roster::{Roster, RosterError};
pub use seating::{
    apply_plan, fallback_plan, parse_assistant_payload, seating_chart, PlanParseError,
    PlannedTable, SeatingPlan, DEFAULT_TABLE_SIZE,
};
pub use validator::{ConstraintValidator, Violation};
