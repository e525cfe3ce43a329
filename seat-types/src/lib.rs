//! # seatsync-types
//!
//! Data model and wire format types for SeatSync, a collaborative event
//! seating planner.
//!
//! This crate provides the foundational types used across all SeatSync crates:
//! - [`GuestId`], [`TableId`], [`EventId`], [`EditorId`], [`Revision`] - Identity and ordering types
//! - [`Guest`], [`Table`], [`Rule`], [`Layout`] - The seating data model
//! - [`LayoutDocument`] - The persisted JSON document shape
//! - [`Delta`], [`Frame`] - Broadcast wire format for multi-editor sync
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod delta;
mod document;
mod error;
mod ids;
mod model;

pub use delta::{CheckInNotice, Delta, Frame, PresenceEvent, DELTA_SCHEMA_VERSION};
pub use document::{DocumentError, LayoutDocument, RuleSection, SeatRecord, TableDocument};
pub use error::WireError;
pub use ids::{EditorId, EventId, GuestId, Revision, TableId};
pub use model::{ContainerId, Guest, GuestStatus, Layout, LayoutError, Rule, Table};
