//! Broadcast wire format for multi-editor sync.
//!
//! Every committed local mutation is published as a [`Delta`] carrying a full
//! snapshot of the layout. Receivers replace their state wholesale; there is
//! no operation log and no merge. Check-ins additionally travel as a
//! dedicated [`CheckInNotice`] so attendance terminals can react without
//! diffing layouts. Frames are encoded as MessagePack.

use serde::{Deserialize, Serialize};

use crate::{EditorId, EventId, GuestId, Layout, Revision, WireError};

/// Schema version carried by every [`Delta`].
///
/// Receivers reject deltas whose schema they do not understand instead of
/// misinterpreting the payload.
pub const DELTA_SCHEMA_VERSION: u8 = 1;

/// A full-layout snapshot published after a committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Wire schema version, always [`DELTA_SCHEMA_VERSION`] when produced
    /// by this crate.
    pub schema: u8,
    /// The event this layout belongs to.
    pub event_id: EventId,
    /// The session that committed the mutation. Receivers drop their own
    /// frames by comparing this against their id.
    pub editor_id: EditorId,
    /// The publisher's layout revision after the mutation.
    pub revision: Revision,
    /// Unix timestamp (seconds) of publication.
    pub timestamp: u64,
    /// The complete layout after the mutation.
    pub layout: Layout,
}

impl Delta {
    /// Build a delta at the current schema version.
    pub fn new(
        event_id: EventId,
        editor_id: EditorId,
        revision: Revision,
        timestamp: u64,
        layout: Layout,
    ) -> Self {
        Self {
            schema: DELTA_SCHEMA_VERSION,
            event_id,
            editor_id,
            revision,
            timestamp,
            layout,
        }
    }

    /// Whether this delta's schema can be interpreted by this build.
    pub fn is_supported(&self) -> bool {
        self.schema == DELTA_SCHEMA_VERSION
    }

    /// Reject deltas whose schema this build cannot interpret.
    pub fn ensure_supported(&self) -> Result<(), WireError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(WireError::UnsupportedSchema {
                found: self.schema,
                supported: DELTA_SCHEMA_VERSION,
            })
        }
    }
}

/// A guest check-in announcement.
///
/// Published alongside the layout delta so attendance displays can show
/// "guest arrived" without comparing snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInNotice {
    /// The event the guest belongs to.
    pub event_id: EventId,
    /// The session that performed the check-in.
    pub editor_id: EditorId,
    /// The checked-in guest.
    pub guest_id: GuestId,
    /// The guest's display name at check-in time.
    pub guest_name: String,
    /// Unix timestamp (seconds) recorded on the guest.
    pub check_in_time: u64,
    /// Unix timestamp (seconds) of publication.
    pub timestamp: u64,
}

/// An editor joining or leaving an event's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceEvent {
    /// An editor subscribed to the event.
    Joined {
        /// The editor that joined.
        editor: EditorId,
    },
    /// An editor left the event.
    Left {
        /// The editor that left.
        editor: EditorId,
    },
}

impl PresenceEvent {
    /// The editor the event is about.
    pub fn editor(&self) -> EditorId {
        match self {
            Self::Joined { editor } | Self::Left { editor } => *editor,
        }
    }
}

/// One frame on an event's broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    /// A full-layout snapshot.
    LayoutChange(Delta),
    /// A guest check-in announcement.
    CheckIn(CheckInNotice),
    /// An editor joined or left.
    Presence(PresenceEvent),
}

impl Frame {
    /// Encode the frame as MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec(self).map_err(|e| WireError::Serialization(e.to_string()))
    }

    /// Decode a frame from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(|e| WireError::Deserialization(e.to_string()))
    }

    /// The originating editor, for echo suppression. Presence frames are
    /// emitted by the channel rather than an editor, so they carry none.
    pub fn origin(&self) -> Option<EditorId> {
        match self {
            Self::LayoutChange(delta) => Some(delta.editor_id),
            Self::CheckIn(notice) => Some(notice.editor_id),
            Self::Presence(_) => None,
        }
    }
}
