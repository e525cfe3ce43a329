//! Realtime broadcast channel, scoped per event.
//!
//! The channel fans every published frame out to every subscriber of the
//! event, the publisher included. Dropping one's own frames (echo
//! suppression) is the ingester's job, because only it knows its editor id.
//! The channel makes no ordering promise across editors.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;

use seat_types::{EditorId, EventId, Frame, PresenceEvent, WireError};

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The editor already holds a subscription for this event.
    #[error("editor {editor} is already subscribed to event {event}")]
    AlreadySubscribed {
        /// The event.
        event: EventId,
        /// The editor.
        editor: EditorId,
    },

    /// A frame could not be encoded for delivery.
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// A subscription's receiving end: raw frame bytes, in delivery order.
#[derive(Debug)]
pub struct ChannelSubscription {
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl ChannelSubscription {
    /// Take the next pending frame without waiting, if one is queued.
    pub fn try_next(&mut self) -> Option<Vec<u8>> {
        self.receiver.try_recv().ok()
    }
}

/// Publish/subscribe transport for broadcast frames.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Deliver encoded frame bytes to every subscriber of the event.
    async fn publish(&self, event: EventId, frame: Vec<u8>) -> Result<(), ChannelError>;

    /// Subscribe an editor to an event's frames.
    async fn subscribe(
        &self,
        event: EventId,
        editor: EditorId,
    ) -> Result<ChannelSubscription, ChannelError>;

    /// Unsubscribe an editor.
    async fn leave(&self, event: EventId, editor: EditorId) -> Result<(), ChannelError>;

    /// Editors currently subscribed to the event.
    fn present(&self, event: EventId) -> Vec<EditorId>;
}

/// In-process reference channel: a registry of per-event rooms.
///
/// Clones share state, so every session in a test can hold the same hub.
#[derive(Debug, Default)]
pub struct InMemoryHub {
    rooms: std::sync::Arc<DashMap<EventId, Vec<Member>>>,
}

#[derive(Debug)]
struct Member {
    editor: EditorId,
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

impl InMemoryHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fan bytes out to every member of a room, pruning members whose
    /// receiver has been dropped.
    fn fan_out(&self, event: EventId, bytes: &[u8]) {
        if let Some(mut room) = self.rooms.get_mut(&event) {
            room.retain(|member| member.sender.send(bytes.to_vec()).is_ok());
        }
    }

    fn presence(&self, event: EventId, presence: PresenceEvent) -> Result<(), ChannelError> {
        let bytes = Frame::Presence(presence).to_bytes()?;
        self.fan_out(event, &bytes);
        Ok(())
    }
}

impl Clone for InMemoryHub {
    fn clone(&self) -> Self {
        Self {
            rooms: std::sync::Arc::clone(&self.rooms),
        }
    }
}

#[async_trait]
impl EventChannel for InMemoryHub {
    async fn publish(&self, event: EventId, frame: Vec<u8>) -> Result<(), ChannelError> {
        self.fan_out(event, &frame);
        Ok(())
    }

    async fn subscribe(
        &self,
        event: EventId,
        editor: EditorId,
    ) -> Result<ChannelSubscription, ChannelError> {
        {
            let room = self.rooms.entry(event).or_default();
            if room.iter().any(|m| m.editor == editor) {
                return Err(ChannelError::AlreadySubscribed { event, editor });
            }
        }

        // Announce before adding, so the joiner does not see its own join.
        self.presence(event, PresenceEvent::Joined { editor })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        self.rooms
            .entry(event)
            .or_default()
            .push(Member { editor, sender });

        Ok(ChannelSubscription { receiver })
    }

    async fn leave(&self, event: EventId, editor: EditorId) -> Result<(), ChannelError> {
        if let Some(mut room) = self.rooms.get_mut(&event) {
            room.retain(|m| m.editor != editor);
        }
        self.presence(event, PresenceEvent::Left { editor })?;
        Ok(())
    }

    fn present(&self, event: EventId) -> Vec<EditorId> {
        self.rooms
            .get(&event)
            .map(|room| room.iter().map(|m| m.editor).collect())
            .unwrap_or_default()
    }
}
