//! Store - the optimistic state container.
//!
//! The store applies a mutation locally the moment the user asks for it and
//! hands back a pending token that carries everything needed to undo it.
//! Whoever talks to the remote authority later either commits the token or
//! rolls it back:
//!
//! | mutation | optimistic step            | commit                           | rollback                    |
//! |----------|----------------------------|----------------------------------|-----------------------------|
//! | create   | prepend temp record (id<0) | drop temp, prepend server record | drop temp                   |
//! | update   | replace with merged record | nothing (local merge is trusted) | put `original` back         |
//! | delete   | remove record              | nothing                          | restore the whole collection|
//!
//! Mutations on the same id are not coordinated. If two are in flight, the
//! one that resolves last decides the outcome: a late update rollback, for
//! example, restores the record as it was before *that* update and silently
//! discards whatever a concurrently committed update wrote.

use crate::{
    error::Result, Action, Dream, DreamId, DreamInput, DreamPatch, Error, StoreState,
    TempIdClock, Timestamp,
};

/// An optimistic create awaiting the server.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending create must be committed or rolled back"]
pub struct PendingCreate {
    temp_id: DreamId,
    input: DreamInput,
}

impl PendingCreate {
    /// Id of the placeholder record.
    pub fn temp_id(&self) -> DreamId {
        self.temp_id
    }

    /// The validated, normalized input to send.
    pub fn input(&self) -> &DreamInput {
        &self.input
    }
}

/// An optimistic update awaiting the server.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending update must be committed or rolled back"]
pub struct PendingUpdate {
    original: Dream,
    patch: DreamPatch,
}

impl PendingUpdate {
    pub fn id(&self) -> DreamId {
        self.original.id
    }

    /// The record as it was before the patch.
    pub fn original(&self) -> &Dream {
        &self.original
    }

    pub fn patch(&self) -> &DreamPatch {
        &self.patch
    }
}

/// An optimistic delete awaiting the server.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending delete must be committed or rolled back"]
pub struct PendingDelete {
    id: DreamId,
    prior: Vec<Dream>,
}

impl PendingDelete {
    pub fn id(&self) -> DreamId {
        self.id
    }

    /// The full collection captured before removal.
    pub fn prior(&self) -> &[Dream] {
        &self.prior
    }
}

/// The journal as the client sees it.
#[derive(Debug, Clone, Default)]
pub struct DreamStore {
    state: StoreState,
    clock: TempIdClock,
}

impl DreamStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an already loaded collection.
    ///
    /// The order of `dreams` is kept as given; see [`crate::sort_for_display`].
    pub fn with_dreams(dreams: Vec<Dream>) -> Self {
        Self {
            state: StoreState::with_dreams(dreams),
            clock: TempIdClock::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Owned copy of the current state for a view to render.
    pub fn snapshot(&self) -> StoreState {
        self.state.clone()
    }

    pub fn dreams(&self) -> &[Dream] {
        &self.state.dreams
    }

    pub fn get(&self, id: DreamId) -> Option<&Dream> {
        self.state.get(id)
    }

    /// Apply a raw action.
    pub fn dispatch(&mut self, action: Action) {
        self.state.reduce(action);
    }

    pub fn begin_load(&mut self) {
        self.dispatch(Action::FetchStart);
    }

    pub fn finish_load(&mut self, dreams: Vec<Dream>) {
        self.dispatch(Action::FetchSuccess(dreams));
    }

    /// Append a further page.
    pub fn finish_load_more(&mut self, page: Vec<Dream>) {
        self.dispatch(Action::FetchMore(page));
    }

    pub fn fail_load(&mut self, error: &Error) {
        self.dispatch(Action::FetchError(error.to_string()));
    }

    pub fn clear_error(&mut self) {
        self.dispatch(Action::ClearError);
    }

    /// Validate `input` and show it at the front under a temporary id.
    ///
    /// Fails with [`Error::Validation`] without touching state.
    pub fn begin_create(&mut self, input: DreamInput, now: Timestamp) -> Result<PendingCreate> {
        let input = input.prepared()?;
        let temp_id = self.clock.tick(now);

        self.dispatch(Action::Prepend(input.clone().into_dream(temp_id, now)));

        Ok(PendingCreate { temp_id, input })
    }

    /// Swap the placeholder for the server's record.
    pub fn commit_create(&mut self, pending: PendingCreate, authoritative: Dream) {
        self.dispatch(Action::Remove(pending.temp_id));
        self.dispatch(Action::Prepend(authoritative));
    }

    /// Drop the placeholder and record the failure.
    pub fn rollback_create(&mut self, pending: PendingCreate, error: &Error) {
        self.dispatch(Action::Remove(pending.temp_id));
        self.dispatch(Action::SetError(error.to_string()));
    }

    /// Replace the record with `id` by its patched version.
    ///
    /// Fails with [`Error::Unsaved`] for a placeholder id, with
    /// [`Error::NotFound`] when the record is not in the store, and with
    /// [`Error::Validation`] when the patched record would be empty.
    pub fn begin_update(&mut self, id: DreamId, patch: DreamPatch) -> Result<PendingUpdate> {
        ensure_saved(id)?;
        let original = self.get(id).cloned().ok_or(Error::NotFound(id))?;

        let optimistic = original.merged(&patch);
        optimistic.validate()?;

        self.dispatch(Action::Replace(optimistic));

        Ok(PendingUpdate { original, patch })
    }

    /// The optimistic record stays as is, whatever the server returned.
    pub fn commit_update(&mut self, _pending: PendingUpdate) {}

    /// Put the pre-update record back in place.
    pub fn rollback_update(&mut self, pending: PendingUpdate, error: &Error) {
        self.dispatch(Action::Replace(pending.original));
        self.dispatch(Action::SetError(error.to_string()));
    }

    /// Remove the record with `id`, remembering the full collection.
    pub fn begin_delete(&mut self, id: DreamId) -> Result<PendingDelete> {
        ensure_saved(id)?;
        if self.state.position(id).is_none() {
            return Err(Error::NotFound(id));
        }

        let prior = self.state.dreams.clone();
        self.dispatch(Action::Remove(id));

        Ok(PendingDelete { id, prior })
    }

    pub fn commit_delete(&mut self, _pending: PendingDelete) {}

    /// Restore the collection exactly as it was before the delete.
    pub fn rollback_delete(&mut self, pending: PendingDelete, error: &Error) {
        self.dispatch(Action::Restore(pending.prior));
        self.dispatch(Action::SetError(error.to_string()));
    }
}

/// Placeholders cannot be edited or deleted until their create resolves.
fn ensure_saved(id: DreamId) -> Result<()> {
    if id < 0 {
        return Err(Error::Unsaved(id));
    }
    Ok(())
}
