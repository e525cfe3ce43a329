//! Per-session layout state.

use seat_types::{EventId, Layout, Revision};

/// The authoritative in-memory snapshot for one event, owned by exactly one
/// session.
///
/// Never shared between sessions or stored globally; each session threads
/// its own store through the engine calls. Concurrency exists only across
/// sessions, via broadcast.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    event_id: EventId,
    layout: Layout,
    revision: Revision,
    has_unsaved_changes: bool,
}

impl LayoutStore {
    /// Create a store holding the given layout at the given revision.
    pub fn new(event_id: EventId, layout: Layout, revision: Revision) -> Self {
        Self {
            event_id,
            layout,
            revision,
            has_unsaved_changes: false,
        }
    }

    /// Create a store for an event with no persisted layout yet.
    pub fn empty(event_id: EventId) -> Self {
        Self::new(event_id, Layout::new(), Revision::zero())
    }

    /// The event this store belongs to.
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// The current layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The current layout, mutably. Callers are responsible for calling
    /// [`mark_dirty`](Self::mark_dirty) after a committed mutation.
    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    /// The revision of the current layout.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Whether the layout has changed since the last successful save.
    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// Record a committed local mutation: bump the revision and flag the
    /// store dirty. Returns the new revision.
    pub fn mark_dirty(&mut self) -> Revision {
        self.revision = self.revision.next();
        self.has_unsaved_changes = true;
        self.revision
    }

    /// Record a successful save.
    pub fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
    }

    /// Replace the layout wholesale with a collaborator's snapshot.
    ///
    /// Adopts the remote revision. Does not touch the dirty flag: unsaved
    /// local work stays flagged as unsaved.
    pub fn replace(&mut self, layout: Layout, revision: Revision) {
        self.layout = layout;
        self.revision = revision;
    }
}
