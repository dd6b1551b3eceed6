//! Async driver around the engine's [`DreamStore`].
//!
//! Each mutation runs in three steps: apply locally under the lock, release
//! the lock and call the remote, then take the lock again to commit or roll
//! back. The lock is never held across an `await`, so a view can take
//! snapshots while requests are in flight.

use crate::remote::{AuthToken, RemoteAuthority};
use dream_engine::{
    error::Result, extract_tags, Dream, DreamId, DreamInput, DreamPatch, DreamStats, DreamStore,
    Error, ListQuery, StatsQuery, StoreState, Timestamp,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Optimistic journal store backed by a [`RemoteAuthority`].
pub struct OptimisticStore<R> {
    remote: R,
    auth: AuthToken,
    inner: Mutex<DreamStore>,
    vocabulary: Mutex<Vec<String>>,
    detached: AtomicBool,
}

impl<R: RemoteAuthority> OptimisticStore<R> {
    pub fn new(remote: R, auth: AuthToken) -> Self {
        Self::with_store(remote, auth, DreamStore::new())
    }

    /// Start from an already loaded collection.
    pub fn with_dreams(remote: R, auth: AuthToken, dreams: Vec<Dream>) -> Self {
        Self::with_store(remote, auth, DreamStore::with_dreams(dreams))
    }

    fn with_store(remote: R, auth: AuthToken, store: DreamStore) -> Self {
        Self {
            remote,
            auth,
            inner: Mutex::new(store),
            vocabulary: Mutex::new(Vec::new()),
            detached: AtomicBool::new(false),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> StoreState {
        self.lock().snapshot()
    }

    /// The user's known tags as of the last [`refresh_tags`](Self::refresh_tags).
    pub fn vocabulary(&self) -> Vec<String> {
        self.vocabulary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_error(&self) {
        self.lock().clear_error();
    }

    /// Stop applying remote results to local state.
    ///
    /// Requests already in flight still complete and their results are still
    /// returned to the caller, but the collection is left as it is. Call this
    /// when the view that owns the store goes away.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Replace the collection with the first page matching `query`.
    pub async fn load(&self, query: &ListQuery) -> Result<()> {
        let auth = self.credential()?;
        self.resolve(|store| store.begin_load());

        match self.remote.list_dreams(auth, query).await {
            Ok(dreams) => {
                tracing::debug!(count = dreams.len(), "dreams loaded");
                self.resolve(|store| store.finish_load(dreams));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load dreams");
                self.resolve(|store| store.fail_load(&e));
                Err(e)
            }
        }
    }

    /// Append the page matching `query`, returning how many rows it had.
    pub async fn load_more(&self, query: &ListQuery) -> Result<usize> {
        let auth = self.credential()?;
        self.resolve(|store| store.begin_load());

        match self.remote.list_dreams(auth, query).await {
            Ok(page) => {
                let returned = page.len();
                self.resolve(|store| store.finish_load_more(page));
                Ok(returned)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load more dreams");
                self.resolve(|store| store.fail_load(&e));
                Err(e)
            }
        }
    }

    /// Local record if present, otherwise ask the remote. Does not modify the
    /// collection.
    pub async fn get(&self, id: DreamId) -> Result<Option<Dream>> {
        let local = self.lock().get(id).cloned();
        if local.is_some() {
            return Ok(local);
        }
        if id < 0 {
            return Ok(None);
        }
        let auth = self.credential()?;
        self.remote.get_dream(auth, id).await
    }

    /// Create a dream, showing it immediately under a temporary id.
    ///
    /// Invalid input is rejected before anything changes or is sent.
    pub async fn create(&self, input: DreamInput) -> Result<Dream> {
        let auth = self.credential()?;
        let pending = self.lock().begin_create(input, now_millis())?;
        let temp_id = pending.temp_id();

        match self.remote.create_dream(auth, pending.input()).await {
            Ok(dream) => {
                tracing::debug!(temp_id, id = dream.id, "create confirmed");
                let returned = dream.clone();
                self.resolve(|store| store.commit_create(pending, dream));
                Ok(returned)
            }
            Err(e) => {
                tracing::warn!(temp_id, error = %e, "create failed, rolled back");
                self.resolve(|store| store.rollback_create(pending, &e));
                Err(e)
            }
        }
    }

    /// Patch a dream, showing the merged record immediately.
    ///
    /// On success the local merge is kept as is. Returns the record the
    /// remote reported. A placeholder still awaiting its create fails with
    /// [`Error::Unsaved`] and nothing is sent.
    pub async fn update(&self, id: DreamId, patch: DreamPatch) -> Result<Dream> {
        let auth = self.credential()?;
        let pending = self.lock().begin_update(id, patch)?;

        match self.remote.update_dream(auth, id, pending.patch()).await {
            Ok(dream) => {
                tracing::debug!(id, "update confirmed");
                self.resolve(|store| store.commit_update(pending));
                Ok(dream)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "update failed, rolled back");
                self.resolve(|store| store.rollback_update(pending, &e));
                Err(e)
            }
        }
    }

    /// Delete a dream, removing it from view immediately.
    pub async fn delete(&self, id: DreamId) -> Result<()> {
        let auth = self.credential()?;
        let pending = self.lock().begin_delete(id)?;

        match self.remote.delete_dream(auth, id).await {
            Ok(()) => {
                tracing::debug!(id, "delete confirmed");
                self.resolve(|store| store.commit_delete(pending));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "delete failed, rolled back");
                self.resolve(|store| store.rollback_delete(pending, &e));
                Err(e)
            }
        }
    }

    /// Fetch the user's distinct tags and remember them for suggestions.
    pub async fn refresh_tags(&self) -> Result<Vec<String>> {
        let auth = self.credential()?;
        let tags = self.remote.list_unique_tags(auth).await?;
        if !self.is_detached() {
            *self
                .vocabulary
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = tags.clone();
        }
        Ok(tags)
    }

    /// Tags from the known vocabulary that `text` seems to mention, minus
    /// the ones already chosen.
    pub fn suggest_tags(&self, text: &str, chosen: &[String]) -> Vec<String> {
        let vocabulary = self.vocabulary();
        extract_tags(text, &vocabulary)
            .into_iter()
            .filter(|tag| !chosen.contains(tag))
            .collect()
    }

    pub async fn stats(&self, query: &StatsQuery) -> Result<DreamStats> {
        let auth = self.credential()?;
        self.remote.get_stats(auth, query).await
    }

    fn credential(&self) -> Result<&AuthToken> {
        if self.auth.is_empty() {
            return Err(Error::Auth("not authenticated".to_string()));
        }
        Ok(&self.auth)
    }

    fn lock(&self) -> MutexGuard<'_, DreamStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a remote outcome unless the store has been detached.
    fn resolve(&self, apply: impl FnOnce(&mut DreamStore)) {
        if self.is_detached() {
            tracing::trace!("store detached, result dropped");
            return;
        }
        apply(&mut *self.lock());
    }
}

fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}
