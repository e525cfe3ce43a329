//! Durable storage for layout documents.
//!
//! Writes are unconditional overwrites. There is no version check, so a
//! save by one session can clobber a concurrent save by another performed
//! between the first session's load and its write. Known hazard; sessions
//! mitigate nothing here and the trait does not pretend otherwise.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use seat_types::{DocumentError, EventId, LayoutDocument};

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No document exists for the event.
    #[error("no stored layout for event {event}")]
    NotFound {
        /// The event.
        event: EventId,
    },

    /// The stored text is not a valid layout document.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The backing store failed.
    #[error("storage failed: {0}")]
    Storage(String),
}

/// Durable get/put of layout documents, keyed by event id.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Load the document for an event.
    async fn get(&self, event: EventId) -> Result<LayoutDocument, PersistenceError>;

    /// Store the document for an event, overwriting whatever is there.
    async fn put(&self, event: EventId, document: &LayoutDocument)
        -> Result<(), PersistenceError>;
}

/// In-memory gateway storing documents as JSON text.
///
/// Clones share state. `fail_next_put` forces the next write to fail, for
/// exercising retry paths in tests.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    inner: Arc<MemoryGatewayInner>,
}

#[derive(Debug, Default)]
struct MemoryGatewayInner {
    records: DashMap<EventId, String>,
    fail_next_put: std::sync::Mutex<Option<String>>,
}

impl MemoryGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cause the next `put` to fail with the given error.
    pub fn fail_next_put(&self, error: &str) {
        if let Ok(mut slot) = self.inner.fail_next_put.lock() {
            *slot = Some(error.to_string());
        }
    }
}

impl Clone for MemoryGateway {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn get(&self, event: EventId) -> Result<LayoutDocument, PersistenceError> {
        let text = self
            .inner
            .records
            .get(&event)
            .ok_or(PersistenceError::NotFound { event })?;
        Ok(LayoutDocument::from_json(text.value())?)
    }

    async fn put(
        &self,
        event: EventId,
        document: &LayoutDocument,
    ) -> Result<(), PersistenceError> {
        let forced = self
            .inner
            .fail_next_put
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(error) = forced {
            return Err(PersistenceError::Storage(error));
        }

        let text = document.to_json()?;
        self.inner.records.insert(event, text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seat_types::{Guest, Layout};

    fn document() -> LayoutDocument {
        let mut layout = Layout::new();
        let guest = Guest::new("Ada");
        layout.unassigned.push(guest.id);
        layout.guests.insert(guest.id, guest);
        LayoutDocument::from_layout(&layout).unwrap()
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let gateway = MemoryGateway::new();
        let event = EventId::new();
        let doc = document();

        gateway.put(event, &doc).await.unwrap();
        let loaded = gateway.get(event).await.unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn get_unknown_event_is_not_found() {
        let gateway = MemoryGateway::new();
        let event = EventId::new();
        assert!(matches!(
            gateway.get(event).await,
            Err(PersistenceError::NotFound { event: e }) if e == event
        ));
    }

    #[tokio::test]
    async fn put_overwrites_unconditionally() {
        let gateway = MemoryGateway::new();
        let event = EventId::new();
        gateway.put(event, &document()).await.unwrap();

        let empty = LayoutDocument::default();
        gateway.put(event, &empty).await.unwrap();
        assert_eq!(gateway.get(event).await.unwrap(), empty);
    }

    #[tokio::test]
    async fn forced_put_failure_is_one_shot() {
        let gateway = MemoryGateway::new();
        let event = EventId::new();
        gateway.fail_next_put("disk full");

        assert!(matches!(
            gateway.put(event, &document()).await,
            Err(PersistenceError::Storage(_))
        ));
        gateway.put(event, &document()).await.unwrap();
    }

    #[tokio::test]
    async fn clones_share_records() {
        let gateway = MemoryGateway::new();
        let other = gateway.clone();
        let event = EventId::new();

        gateway.put(event, &document()).await.unwrap();
        assert!(other.get(event).await.is_ok());
    }
}
