//! Behavior of the optimistic store against an in-memory authority.

use async_trait::async_trait;
use dream_client::{AuthToken, OptimisticStore, RemoteAuthority};
use dream_engine::{
    error::Result, sort_for_display, Dream, DreamId, DreamInput, DreamPatch, DreamStats,
    DreamType, Error, ListQuery, StatsQuery,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Answer to a held call: `None` lets it proceed, `Some(e)` fails it.
type Gate = oneshot::Receiver<Option<Error>>;

/// Server-side journal for a single user.
struct FakeAuthority {
    dreams: Mutex<Vec<Dream>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
    failures: Mutex<VecDeque<Error>>,
    gates: Mutex<VecDeque<Gate>>,
}

impl FakeAuthority {
    fn new(dreams: Vec<Dream>) -> Arc<Self> {
        Arc::new(Self {
            dreams: Mutex::new(dreams),
            next_id: AtomicI64::new(100),
            calls: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            gates: Mutex::new(VecDeque::new()),
        })
    }

    fn fail_next(&self, error: Error) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Hold the next call until the returned sender fires.
    fn hold_next(&self) -> oneshot::Sender<Option<Error>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn stored(&self, id: DreamId) -> Option<Dream> {
        self.dreams.lock().unwrap().iter().find(|d| d.id == id).cloned()
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            if let Ok(Some(error)) = gate.await {
                return Err(error);
            }
        }
        let failure = self.failures.lock().unwrap().pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteAuthority for FakeAuthority {
    async fn list_dreams(&self, _auth: &AuthToken, query: &ListQuery) -> Result<Vec<Dream>> {
        self.enter().await?;
        let type_filter = query.type_filter()?;
        let search = query.search.as_deref().map(str::to_lowercase);

        let mut dreams: Vec<Dream> = self
            .dreams
            .lock()
            .unwrap()
            .iter()
            .filter(|d| type_filter.map_or(true, |t| d.dream_type == t))
            .filter(|d| {
                search.as_deref().map_or(true, |s| {
                    d.title.to_lowercase().contains(s)
                        || d.content.to_lowercase().contains(s)
                        || d.tags.iter().any(|t| t.contains(s))
                })
            })
            .cloned()
            .collect();
        sort_for_display(&mut dreams);

        Ok(dreams
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect())
    }

    async fn get_dream(&self, _auth: &AuthToken, id: DreamId) -> Result<Option<Dream>> {
        self.enter().await?;
        Ok(self.stored(id))
    }

    async fn create_dream(&self, _auth: &AuthToken, input: &DreamInput) -> Result<Dream> {
        self.enter().await?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let dream = input.clone().into_dream(id, 1_706_745_600_000 + id);
        self.dreams.lock().unwrap().push(dream.clone());
        Ok(dream)
    }

    async fn update_dream(
        &self,
        _auth: &AuthToken,
        id: DreamId,
        patch: &DreamPatch,
    ) -> Result<Dream> {
        self.enter().await?;
        let mut dreams = self.dreams.lock().unwrap();
        let dream = dreams
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(Error::NotFound(id))?;
        let mut merged = dream.merged(patch);
        // the server trims titles; the client keeps what the user typed
        merged.title = merged.title.trim().to_string();
        merged.updated_at += 1;
        *dream = merged.clone();
        Ok(merged)
    }

    async fn delete_dream(&self, _auth: &AuthToken, id: DreamId) -> Result<()> {
        self.enter().await?;
        let mut dreams = self.dreams.lock().unwrap();
        let before = dreams.len();
        dreams.retain(|d| d.id != id);
        if dreams.len() == before {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    async fn list_unique_tags(&self, _auth: &AuthToken) -> Result<Vec<String>> {
        self.enter().await?;
        let mut tags: Vec<String> = self
            .dreams
            .lock()
            .unwrap()
            .iter()
            .flat_map(|d| d.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn get_stats(&self, _auth: &AuthToken, query: &StatsQuery) -> Result<DreamStats> {
        self.enter().await?;
        let type_filter = query.type_filter()?;
        let dreams = self.dreams.lock().unwrap();
        Ok(DreamStats::from_entries(
            dreams
                .iter()
                .filter(|d| type_filter.map_or(true, |t| d.dream_type == t))
                .map(|d| (d.dream_type, d.tags.as_slice())),
        ))
    }
}

fn dream(id: DreamId, title: &str, date: Option<i64>, tags: &[&str]) -> Dream {
    let mut dream = DreamInput::new(title, "content")
        .with_tags(tags.iter().copied())
        .into_dream(id, 1_706_745_600_000 + id);
    dream.date = date;
    dream
}

fn seed() -> Vec<Dream> {
    let mut dreams = vec![
        dream(1, "Море", Some(1_000), &["море", "полёт"]),
        dream(2, "Кот", Some(3_000), &["кот"]),
        dream(3, "Без даты", None, &[]),
        dream(4, "Замок", Some(2_000), &["замок", "море"]),
    ];
    sort_for_display(&mut dreams);
    dreams
}

fn token() -> AuthToken {
    AuthToken::new("query_id=AAH&user=%7B%22id%22%3A42%7D&auth_date=1706745600&hash=ab12")
}

async fn loaded_store() -> (Arc<FakeAuthority>, OptimisticStore<Arc<FakeAuthority>>) {
    let remote = FakeAuthority::new(seed());
    let store = OptimisticStore::new(remote.clone(), token());
    store.load(&ListQuery::default()).await.unwrap();
    (remote, store)
}

fn ids(store: &OptimisticStore<Arc<FakeAuthority>>) -> Vec<DreamId> {
    store.snapshot().dreams.iter().map(|d| d.id).collect()
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn load_orders_by_date_with_undated_last() {
    let (_, store) = loaded_store().await;
    assert_eq!(ids(&store), vec![2, 4, 1, 3]);
    let state = store.snapshot();
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn repeated_loads_are_idempotent() {
    let (_, store) = loaded_store().await;
    let first = store.snapshot();
    store.load(&ListQuery::default()).await.unwrap();
    assert_eq!(store.snapshot(), first);
}

#[tokio::test]
async fn load_failure_surfaces_error() {
    let remote = FakeAuthority::new(seed());
    let store = OptimisticStore::new(remote.clone(), token());
    remote.fail_next(Error::RemoteOperation("request failed with status 500".into()));

    let result = store.load(&ListQuery::default()).await;

    assert!(result.is_err());
    let state = store.snapshot();
    assert!(!state.loading);
    assert_eq!(
        state.error.as_deref(),
        Some("remote operation failed: request failed with status 500")
    );
    assert!(state.dreams.is_empty());
}

#[tokio::test]
async fn load_more_appends_next_page() {
    let remote = FakeAuthority::new(seed());
    let store = OptimisticStore::new(remote.clone(), token());
    let query = ListQuery::page(3, 0);

    store.load(&query).await.unwrap();
    assert_eq!(ids(&store), vec![2, 4, 1]);

    let next = query.next_page(3).unwrap();
    let returned = store.load_more(&next).await.unwrap();
    assert_eq!(returned, 1);
    assert_eq!(ids(&store), vec![2, 4, 1, 3]);
    assert!(next.next_page(returned).is_none());
}

#[tokio::test]
async fn filtered_load_passes_query_through() {
    let (_, store) = loaded_store().await;
    store
        .load(&ListQuery::default().with_search("море"))
        .await
        .unwrap();
    assert_eq!(ids(&store), vec![4, 1]);
}

#[tokio::test]
async fn get_prefers_local_then_asks_remote() {
    let remote = FakeAuthority::new(seed());
    let store = OptimisticStore::new(remote.clone(), token());

    let fetched = store.get(2).await.unwrap();
    assert_eq!(fetched.map(|d| d.title), Some("Кот".to_string()));
    assert_eq!(remote.calls(), 1);
    // a remote get does not populate the collection
    assert!(store.snapshot().dreams.is_empty());

    store.load(&ListQuery::default()).await.unwrap();
    let calls = remote.calls();
    assert!(store.get(2).await.unwrap().is_some());
    assert_eq!(remote.calls(), calls);

    assert_eq!(store.get(999).await.unwrap(), None);
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_is_visible_before_the_server_answers() {
    let (remote, store) = loaded_store().await;
    let release = remote.hold_next();

    let create = store.create(DreamInput::new("Flight", "over the sea").with_type(DreamType::Lucid));
    let observe = async {
        tokio::task::yield_now().await;
        let during = store.snapshot();
        release.send(None).unwrap();
        during
    };
    let (created, during) = tokio::join!(create, observe);

    let head = &during.dreams[0];
    assert!(head.is_temporary());
    assert_eq!(head.title, "Flight");
    assert_eq!(during.dreams.len(), 5);

    let created = created.unwrap();
    let after = store.snapshot();
    assert_eq!(after.dreams.len(), 5);
    assert_eq!(after.dreams[0], created);
    assert!(after.dreams.iter().all(|d| !d.is_temporary()));
}

#[tokio::test]
async fn create_success_replaces_placeholder_with_server_record() {
    let (remote, store) = loaded_store().await;

    let created = store
        .create(DreamInput::new("Flight", "").with_tags([" Sky ", "sky", "Sea"]))
        .await
        .unwrap();

    assert_eq!(created.id, 100);
    assert_eq!(created.tags, vec!["sky", "sea"]);
    assert_eq!(ids(&store), vec![100, 2, 4, 1, 3]);
    assert_eq!(remote.stored(100), Some(created));
}

#[tokio::test]
async fn create_failure_restores_collection() {
    let (remote, store) = loaded_store().await;
    let before = store.snapshot().dreams;
    remote.fail_next(Error::RemoteOperation("request failed with status 500".into()));

    let result = store.create(DreamInput::new("Flight", "over the sea")).await;

    assert!(matches!(result, Err(Error::RemoteOperation(_))));
    let state = store.snapshot();
    assert_eq!(state.dreams, before);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn empty_create_is_rejected_without_a_request() {
    let (remote, store) = loaded_store().await;
    let before = store.snapshot();
    let calls = remote.calls();

    let result = store.create(DreamInput::new("  ", "")).await;

    assert_eq!(
        result.unwrap_err(),
        Error::Validation("A title, content, or tag is required to save a dream.".into())
    );
    assert_eq!(store.snapshot(), before);
    assert_eq!(remote.calls(), calls);
}

#[tokio::test]
async fn tag_only_create_is_accepted() {
    let (_, store) = loaded_store().await;
    let created = store
        .create(DreamInput::new("", "").with_tags(["кошмар"]))
        .await
        .unwrap();
    assert_eq!(created.tags, vec!["кошмар"]);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn update_success_keeps_local_merge() {
    let (remote, store) = loaded_store().await;

    let returned = store
        .update(4, DreamPatch::default().title("  Замок  ").date(None))
        .await
        .unwrap();

    // the authority trimmed the title, the local copy was not refreshed
    assert_eq!(returned.title, "Замок");
    let local = store.snapshot().get(4).cloned().unwrap();
    assert_eq!(local.title, "  Замок  ");
    assert_eq!(local.date, None);
    assert_eq!(remote.stored(4).unwrap().date, None);
    // position is kept even though the date changed
    assert_eq!(ids(&store), vec![2, 4, 1, 3]);
}

#[tokio::test]
async fn update_failure_restores_original() {
    let (remote, store) = loaded_store().await;
    let original = store.snapshot().get(1).cloned().unwrap();
    remote.fail_next(Error::RemoteOperation("connection reset".into()));

    let result = store
        .update(1, DreamPatch::default().content("rewritten").tags(["x"]))
        .await;

    assert!(result.is_err());
    assert_eq!(store.snapshot().get(1), Some(&original));
    assert!(store.snapshot().error.is_some());
}

#[tokio::test]
async fn update_of_unknown_id_makes_no_request() {
    let (remote, store) = loaded_store().await;
    let calls = remote.calls();

    let result = store.update(42, DreamPatch::default().title("x")).await;

    assert_eq!(result.unwrap_err(), Error::NotFound(42));
    assert_eq!(remote.calls(), calls);
}

#[tokio::test]
async fn overlapping_updates_last_rollback_wins() {
    let (remote, store) = loaded_store().await;
    let original = store.snapshot().get(4).cloned().unwrap();

    let first_gate = remote.hold_next();
    let second_gate = remote.hold_next();

    let first = store.update(4, DreamPatch::default().title("first"));
    let second = store.update(4, DreamPatch::default().content("second"));
    let driver = async {
        tokio::task::yield_now().await;
        second_gate.send(None).unwrap();
        tokio::task::yield_now().await;
        first_gate
            .send(Some(Error::RemoteOperation("timeout".into())))
            .unwrap();
    };
    let (first, second, ()) = tokio::join!(first, second, driver);

    assert_eq!(
        [first.is_err(), second.is_err()].iter().filter(|e| **e).count(),
        1
    );
    // the failed update restored the record it captured, discarding the
    // other update even though that one was confirmed
    assert_eq!(store.snapshot().get(4), Some(&original));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_success_removes_record() {
    let (remote, store) = loaded_store().await;
    store.delete(2).await.unwrap();
    assert_eq!(ids(&store), vec![4, 1, 3]);
    assert_eq!(remote.stored(2), None);
}

#[tokio::test]
async fn delete_failure_restores_full_collection() {
    let (remote, store) = loaded_store().await;
    let before = store.snapshot().dreams;
    remote.fail_next(Error::NotFound(4));

    let result = store.delete(4).await;

    assert_eq!(result.unwrap_err(), Error::NotFound(4));
    let state = store.snapshot();
    assert_eq!(state.dreams, before);
    assert_eq!(state.error.as_deref(), Some("dream not found: 4"));

    store.clear_error();
    assert!(store.snapshot().error.is_none());
}

#[tokio::test]
async fn delete_of_unknown_id_makes_no_request() {
    let (remote, store) = loaded_store().await;
    let calls = remote.calls();
    assert_eq!(store.delete(99).await.unwrap_err(), Error::NotFound(99));
    assert_eq!(remote.calls(), calls);
}

#[tokio::test]
async fn pending_placeholder_cannot_be_edited_or_deleted() {
    let (remote, store) = loaded_store().await;
    let calls = remote.calls();
    let release = remote.hold_next();

    let create = store.create(DreamInput::new("Flight", "over the sea"));
    let meddle = async {
        tokio::task::yield_now().await;
        let temp_id = store.snapshot().dreams[0].id;
        assert!(temp_id < 0);

        let update = store
            .update(temp_id, DreamPatch::default().title("edited"))
            .await;
        let delete = store.delete(temp_id).await;
        let during = store.snapshot();
        release.send(None).unwrap();
        (temp_id, update, delete, during)
    };
    let (created, (temp_id, update, delete, during)) = tokio::join!(create, meddle);

    assert_eq!(update.unwrap_err(), Error::Unsaved(temp_id));
    assert_eq!(delete.unwrap_err(), Error::Unsaved(temp_id));
    assert_eq!(during.dreams[0].title, "Flight");
    assert_eq!(during.dreams.len(), 5);

    // only the create reached the remote
    assert_eq!(remote.calls(), calls + 1);
    let created = created.unwrap();
    assert_eq!(ids(&store), vec![created.id, 2, 4, 1, 3]);
    assert_eq!(remote.stored(created.id), Some(created));
}

// ============================================================================
// Tags and Stats
// ============================================================================

#[tokio::test]
async fn suggestions_use_refreshed_vocabulary() {
    let (_, store) = loaded_store().await;
    assert!(store.suggest_tags("видел кота", &[]).is_empty());

    let tags = store.refresh_tags().await.unwrap();
    assert_eq!(tags, vec!["замок", "кот", "море", "полёт"]);

    let suggested = store.suggest_tags(
        "Снился кот в замке, потом море и полёты",
        &["полёт".to_string()],
    );
    assert_eq!(suggested, vec!["кот", "море"]);
}

#[tokio::test]
async fn stats_come_from_the_remote() {
    let (_, store) = loaded_store().await;
    let stats = store.stats(&StatsQuery::default()).await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.by_type.normal, 4);
    assert_eq!(stats.tags[0].tag, "море");
    assert_eq!(stats.tags[0].count, 2);
}

// ============================================================================
// Authentication and Lifecycle
// ============================================================================

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let remote = FakeAuthority::new(seed());
    let store = OptimisticStore::new(remote.clone(), AuthToken::new(""));

    assert!(matches!(
        store.load(&ListQuery::default()).await,
        Err(Error::Auth(_))
    ));
    assert!(matches!(
        store.create(DreamInput::new("Flight", "")).await,
        Err(Error::Auth(_))
    ));
    assert_eq!(remote.calls(), 0);
    assert!(store.snapshot().dreams.is_empty());
}

#[tokio::test]
async fn detached_store_ignores_late_results() {
    let (remote, store) = loaded_store().await;
    let before = store.snapshot().dreams;
    let release = remote.hold_next();

    let delete = store.delete(2);
    let driver = async {
        tokio::task::yield_now().await;
        store.detach();
        release
            .send(Some(Error::RemoteOperation("request failed with status 500".into())))
            .unwrap();
    };
    let (result, ()) = tokio::join!(delete, driver);

    // the caller still hears about the failure
    assert!(result.is_err());
    // but the optimistic removal is not rolled back and no error is recorded
    let state = store.snapshot();
    assert_eq!(state.dreams.len(), before.len() - 1);
    assert!(state.error.is_none());
    assert!(store.is_detached());
}
