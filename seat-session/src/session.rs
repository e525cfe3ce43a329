//! One editor's session over one event.
//!
//! The session owns the layout store, runs every mutation through the core
//! engine, and broadcasts a full-layout [`Delta`] after each committed
//! change. Incoming frames are drained by [`EditorSession::poll_remote`],
//! which drops the session's own frames (echo suppression), rejects deltas
//! with an unsupported schema or a stale revision, and otherwise replaces
//! the local layout wholesale.

use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

use seat_core::{
    apply_plan, GuestLifecycle, LifecycleError, MoveEngine, MoveError, MoveOutcome, MoveRequest,
    PendingMove, Roster, RosterError, SeatingPlan,
};
use seat_types::{
    CheckInNotice, Delta, EditorId, EventId, Frame, GuestId, GuestStatus, Layout, LayoutDocument,
    Revision, TableId,
};

use crate::assistant::{plans_or_fallback, PlanSource, SeatingAssistant, SeatingRequest};
use crate::channel::{ChannelError, ChannelSubscription, EventChannel};
use crate::persistence::{PersistenceError, PersistenceGateway};
use crate::store::LayoutStore;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The broadcast channel failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Loading or saving the document failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A frame could not be encoded.
    #[error(transparent)]
    Wire(#[from] seat_types::WireError),

    /// A relocation was rejected.
    #[error(transparent)]
    Move(#[from] MoveError),

    /// A lifecycle operation was rejected.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A roster operation was rejected.
    #[error(transparent)]
    Roster(#[from] RosterError),

    /// `confirm_move` was called with no proposal outstanding.
    #[error("no move is awaiting confirmation")]
    NoPendingMove,
}

/// The result of a `relocate` call on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// The move was committed and broadcast.
    Committed,
    /// The guest is locked; call `confirm_move` or `cancel_move`.
    AwaitingConfirmation,
}

/// Something a collaborator did, surfaced by [`EditorSession::poll_remote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// A collaborator's layout replaced ours.
    LayoutUpdated {
        /// Who committed the change.
        editor: EditorId,
        /// The adopted revision.
        revision: Revision,
    },
    /// A collaborator checked a guest in.
    GuestCheckedIn {
        /// The guest.
        guest: GuestId,
        /// The guest's name at check-in time.
        name: String,
    },
    /// An editor joined the event.
    EditorJoined(EditorId),
    /// An editor left the event.
    EditorLeft(EditorId),
}

/// One editor's live session over one event.
pub struct EditorSession<C: EventChannel, P: PersistenceGateway> {
    channel: C,
    persistence: P,
    editor_id: EditorId,
    store: LayoutStore,
    subscription: ChannelSubscription,
    pending_move: Option<PendingMove>,
    is_saving: bool,
    is_generating: bool,
}

impl<C: EventChannel, P: PersistenceGateway> EditorSession<C, P> {
    /// Open a session: load the persisted layout (a missing document means
    /// a fresh event) and subscribe to the event's channel.
    pub async fn open(
        channel: C,
        persistence: P,
        event_id: EventId,
        editor_id: EditorId,
    ) -> Result<Self, SessionError> {
        let store = match persistence.get(event_id).await {
            Ok(document) => {
                let layout = document.into_layout().map_err(PersistenceError::from)?;
                LayoutStore::new(event_id, layout, Revision::zero())
            }
            Err(PersistenceError::NotFound { .. }) => LayoutStore::empty(event_id),
            Err(error) => return Err(error.into()),
        };

        let subscription = channel.subscribe(event_id, editor_id).await?;
        debug!(event = %event_id, editor = %editor_id, "session opened");

        Ok(Self {
            channel,
            persistence,
            editor_id,
            store,
            subscription,
            pending_move: None,
            is_saving: false,
            is_generating: false,
        })
    }

    /// This session's editor id.
    pub fn editor_id(&self) -> EditorId {
        self.editor_id
    }

    /// The event being edited.
    pub fn event_id(&self) -> EventId {
        self.store.event_id()
    }

    /// The current layout.
    pub fn layout(&self) -> &Layout {
        self.store.layout()
    }

    /// The current layout revision.
    pub fn revision(&self) -> Revision {
        self.store.revision()
    }

    /// Whether there are committed changes not yet saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.store.has_unsaved_changes()
    }

    /// Whether a save is in flight.
    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Whether a plan generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    /// Whether a locked-guest move awaits confirmation.
    pub fn has_pending_move(&self) -> bool {
        self.pending_move.is_some()
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Bump the revision, flag unsaved changes, and broadcast the full
    /// layout. Called after every committed local mutation.
    async fn publish_layout(&mut self) -> Result<(), SessionError> {
        let revision = self.store.mark_dirty();
        let delta = Delta::new(
            self.store.event_id(),
            self.editor_id,
            revision,
            Self::timestamp(),
            self.store.layout().clone(),
        );
        let bytes = Frame::LayoutChange(delta).to_bytes()?;
        self.channel.publish(self.store.event_id(), bytes).await?;
        debug!(%revision, "published layout delta");
        Ok(())
    }

    /// Add guests to the unassigned pool and broadcast.
    pub async fn add_guests<I, S>(&mut self, names: I) -> Result<Vec<GuestId>, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = Roster::add_guests(self.store.layout_mut(), names);
        self.publish_layout().await?;
        Ok(ids)
    }

    /// Hard-delete a guest and broadcast.
    pub async fn delete_guest(&mut self, guest: GuestId) -> Result<(), SessionError> {
        Roster::delete_guest(self.store.layout_mut(), guest)?;
        self.publish_layout().await
    }

    /// Create a table and broadcast.
    pub async fn add_table(
        &mut self,
        name: impl Into<String>,
        capacity: u32,
    ) -> Result<TableId, SessionError> {
        let id = Roster::add_table(self.store.layout_mut(), name, capacity)?;
        self.publish_layout().await?;
        Ok(id)
    }

    /// Delete a table, moving its guests to the pool, and broadcast.
    pub async fn delete_table(&mut self, table: TableId) -> Result<(), SessionError> {
        Roster::delete_table(self.store.layout_mut(), table)?;
        self.publish_layout().await
    }

    /// Add a "must not share a table" rule and broadcast.
    pub async fn add_rule(&mut self, a: GuestId, b: GuestId) -> Result<(), SessionError> {
        Roster::add_rule(self.store.layout_mut(), a, b)?;
        self.publish_layout().await
    }

    /// Remove a rule. Broadcasts only if the rule existed.
    pub async fn remove_rule(&mut self, a: GuestId, b: GuestId) -> Result<bool, SessionError> {
        if Roster::remove_rule(self.store.layout_mut(), a, b) {
            self.publish_layout().await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Return every guest to the pool, drop all tables, and broadcast.
    pub async fn reset_assignments(&mut self) -> Result<(), SessionError> {
        Roster::reset_assignments(self.store.layout_mut());
        self.publish_layout().await
    }

    /// Advance a guest's confirmation status and broadcast.
    pub async fn cycle_status(&mut self, guest: GuestId) -> Result<GuestStatus, SessionError> {
        let status = GuestLifecycle::cycle_status(self.store.layout_mut(), guest)?;
        self.publish_layout().await?;
        Ok(status)
    }

    /// Unlock a guest and broadcast.
    pub async fn unlock_guest(&mut self, guest: GuestId) -> Result<(), SessionError> {
        GuestLifecycle::unlock(self.store.layout_mut(), guest)?;
        self.publish_layout().await
    }

    /// Relocate a guest. A locked guest crossing containers is not moved;
    /// the proposal is held until `confirm_move` or `cancel_move`.
    pub async fn relocate(&mut self, request: MoveRequest) -> Result<MoveStatus, SessionError> {
        match MoveEngine::relocate(self.store.layout_mut(), request)? {
            MoveOutcome::Committed => {
                self.publish_layout().await?;
                Ok(MoveStatus::Committed)
            }
            MoveOutcome::ConfirmationRequired(pending) => {
                self.pending_move = Some(pending);
                Ok(MoveStatus::AwaitingConfirmation)
            }
        }
    }

    /// Commit the held locked-guest move, unlock the guest, and broadcast.
    pub async fn confirm_move(&mut self) -> Result<(), SessionError> {
        let pending = self.pending_move.take().ok_or(SessionError::NoPendingMove)?;
        MoveEngine::confirm(self.store.layout_mut(), pending)?;
        self.publish_layout().await
    }

    /// Discard the held proposal. No state change, no broadcast.
    pub fn cancel_move(&mut self) -> bool {
        self.pending_move.take().is_some()
    }

    /// Check a guest in, broadcast the layout, and announce the arrival.
    pub async fn check_in(&mut self, guest: GuestId) -> Result<u64, SessionError> {
        let when = GuestLifecycle::check_in(self.store.layout_mut(), guest, Self::timestamp())?;
        let name = self
            .store
            .layout()
            .guest(guest)
            .map(|g| g.name.clone())
            .unwrap_or_default();
        self.publish_layout().await?;

        let notice = CheckInNotice {
            event_id: self.store.event_id(),
            editor_id: self.editor_id,
            guest_id: guest,
            guest_name: name,
            check_in_time: when,
            timestamp: Self::timestamp(),
        };
        let bytes = Frame::CheckIn(notice).to_bytes()?;
        self.channel.publish(self.store.event_id(), bytes).await?;
        Ok(when)
    }

    /// Save the layout, overwriting whatever is stored.
    ///
    /// On failure the in-memory layout and the unsaved flag are untouched,
    /// so the caller can retry without losing work.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        let document =
            LayoutDocument::from_layout(self.store.layout()).map_err(PersistenceError::from)?;

        self.is_saving = true;
        let result = self.persistence.put(self.store.event_id(), &document).await;
        self.is_saving = false;
        result?;

        self.store.mark_saved();
        debug!(revision = %self.store.revision(), "layout saved");
        Ok(())
    }

    /// Ask the assistant for seating plans for the current roster, falling
    /// back to the deterministic generator on any failure.
    ///
    /// The guest list follows the layout's seat order (pool first, then
    /// tables), so the fallback chunks guests the way they were entered
    /// rather than by id.
    pub async fn generate_seating(
        &mut self,
        assistant: &dyn SeatingAssistant,
        plan_count: usize,
    ) -> (Vec<SeatingPlan>, PlanSource) {
        let layout = self.store.layout();
        let guest_list = layout
            .unassigned
            .iter()
            .chain(layout.tables.iter().flat_map(|t| t.seats.iter()))
            .filter_map(|id| layout.guest(*id).map(|g| g.name.as_str()))
            .collect::<Vec<_>>()
            .join("\n");
        let request = SeatingRequest {
            guest_list,
            plan_count,
        };

        self.is_generating = true;
        let outcome = plans_or_fallback(assistant, &request).await;
        self.is_generating = false;
        outcome
    }

    /// Rebuild the assignment from a plan and broadcast.
    pub async fn apply_plan(
        &mut self,
        plan: &SeatingPlan,
        capacity: u32,
    ) -> Result<(), SessionError> {
        apply_plan(self.store.layout_mut(), plan, capacity)?;
        self.publish_layout().await
    }

    /// Drain every pending incoming frame without blocking.
    ///
    /// Own frames are dropped. Undecodable frames, unsupported delta
    /// schemas, and deltas older than the local revision are logged and
    /// skipped. Accepted deltas replace the layout wholesale.
    pub fn poll_remote(&mut self) -> Vec<SessionNotice> {
        let mut notices = Vec::new();

        while let Some(bytes) = self.subscription.try_next() {
            let frame = match Frame::from_bytes(&bytes) {
                Ok(frame) => frame,
                Err(error) => {
                    warn!(%error, "skipping undecodable frame");
                    continue;
                }
            };
            if frame.origin() == Some(self.editor_id) {
                continue;
            }

            match frame {
                Frame::LayoutChange(delta) => {
                    if let Err(error) = delta.ensure_supported() {
                        warn!(%error, "skipping delta");
                        continue;
                    }
                    if delta.revision < self.store.revision() {
                        warn!(
                            remote = %delta.revision,
                            local = %self.store.revision(),
                            "skipping stale delta"
                        );
                        continue;
                    }
                    self.store.replace(delta.layout, delta.revision);
                    notices.push(SessionNotice::LayoutUpdated {
                        editor: delta.editor_id,
                        revision: delta.revision,
                    });
                }
                Frame::CheckIn(notice) => {
                    match GuestLifecycle::check_in(
                        self.store.layout_mut(),
                        notice.guest_id,
                        notice.check_in_time,
                    ) {
                        Ok(_) => {
                            self.store.mark_dirty();
                        }
                        // Already applied via a delta, or the guest is gone.
                        Err(error) => debug!(%error, "check-in notice not applied"),
                    }
                    notices.push(SessionNotice::GuestCheckedIn {
                        guest: notice.guest_id,
                        name: notice.guest_name,
                    });
                }
                Frame::Presence(presence) => {
                    let editor = presence.editor();
                    if editor == self.editor_id {
                        continue;
                    }
                    notices.push(match presence {
                        seat_types::PresenceEvent::Joined { .. } => {
                            SessionNotice::EditorJoined(editor)
                        }
                        seat_types::PresenceEvent::Left { .. } => {
                            SessionNotice::EditorLeft(editor)
                        }
                    });
                }
            }
        }

        notices
    }

    /// Editors currently subscribed to this event, excluding this session.
    pub fn active_editors(&self) -> Vec<EditorId> {
        self.channel
            .present(self.store.event_id())
            .into_iter()
            .filter(|&e| e != self.editor_id)
            .collect()
    }

    /// Leave the event's channel.
    pub async fn close(self) -> Result<(), SessionError> {
        self.channel
            .leave(self.store.event_id(), self.editor_id)
            .await?;
        Ok(())
    }
}
