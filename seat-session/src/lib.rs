//! # seatsync-session
//!
//! I/O orchestration for one editor of one event. An [`EditorSession`] owns
//! the authoritative in-memory layout, runs every mutation through
//! `seatsync-core`, publishes committed snapshots to collaborators, and
//! ingests theirs.
//!
//! The session is generic over its seams, in the same spirit as a pluggable
//! transport:
//! - [`EventChannel`] - the realtime broadcast transport ([`InMemoryHub`]
//!   is the reference implementation)
//! - [`PersistenceGateway`] - the durable document store
//! - [`SeatingAssistant`] - the external plan generator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assistant;
pub mod channel;
pub mod persistence;
pub mod session;
pub mod store;

pub use assistant::{
    plans_or_fallback, AssistantError, HttpAssistant, MockAssistant, PlanSource, SeatingAssistant,
    SeatingRequest,
};
pub use channel::{ChannelError, ChannelSubscription, EventChannel, InMemoryHub};
pub use persistence::{MemoryGateway, PersistenceError, PersistenceGateway};
pub use session::{EditorSession, MoveStatus, SessionError, SessionNotice};
pub use store::LayoutStore;
