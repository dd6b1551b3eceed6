//! Store state and the transition function over it.
//!
//! Every change to the client-visible collection is expressed as an
//! [`Action`] and applied by [`StoreState::reduce`]. The intent methods on
//! [`crate::DreamStore`] only decide which actions to dispatch.

use crate::{Dream, DreamId};
use serde::{Deserialize, Serialize};

/// A transition of the store state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    /// A fetch began.
    FetchStart,
    /// Replace the whole collection.
    FetchSuccess(Vec<Dream>),
    /// Append a page, skipping ids already present.
    FetchMore(Vec<Dream>),
    FetchError(String),
    /// Put a dream at the front.
    Prepend(Dream),
    /// Swap the dream with the same id in place; no-op when absent.
    Replace(Dream),
    Remove(DreamId),
    /// Put back a previously captured collection.
    Restore(Vec<Dream>),
    SetError(String),
    ClearError,
}

/// Client-visible state. Views read clones of this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// Journal in display order; fresh creates sit at the front.
    pub dreams: Vec<Dream>,
    pub loading: bool,
    pub error: Option<String>,
}

impl StoreState {
    /// State seeded with an initial collection.
    pub fn with_dreams(dreams: Vec<Dream>) -> Self {
        Self {
            dreams,
            loading: false,
            error: None,
        }
    }

    /// Apply one action.
    pub fn reduce(&mut self, action: Action) {
        match action {
            Action::FetchStart => {
                self.loading = true;
                self.error = None;
            }
            Action::FetchSuccess(dreams) => {
                self.loading = false;
                self.dreams = dreams;
            }
            Action::FetchMore(page) => {
                self.loading = false;
                for dream in page {
                    if self.position(dream.id).is_none() {
                        self.dreams.push(dream);
                    }
                }
            }
            Action::FetchError(message) => {
                self.loading = false;
                self.error = Some(message);
            }
            Action::Prepend(dream) => self.dreams.insert(0, dream),
            Action::Replace(dream) => {
                if let Some(index) = self.position(dream.id) {
                    self.dreams[index] = dream;
                }
            }
            Action::Remove(id) => self.dreams.retain(|d| d.id != id),
            Action::Restore(dreams) => self.dreams = dreams,
            Action::SetError(message) => self.error = Some(message),
            Action::ClearError => self.error = None,
        }
    }

    /// Index of the dream with `id`.
    pub fn position(&self, id: DreamId) -> Option<usize> {
        self.dreams.iter().position(|d| d.id == id)
    }

    pub fn get(&self, id: DreamId) -> Option<&Dream> {
        self.dreams.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.dreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dreams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DreamInput;

    fn dream(id: DreamId, title: &str) -> Dream {
        DreamInput::new(title, "").into_dream(id, 1000)
    }

    fn ids(state: &StoreState) -> Vec<DreamId> {
        state.dreams.iter().map(|d| d.id).collect()
    }

    #[test]
    fn fetch_cycle() {
        let mut state = StoreState::default();
        state.error = Some("stale".into());

        state.reduce(Action::FetchStart);
        assert!(state.loading);
        assert_eq!(state.error, None);

        state.reduce(Action::FetchSuccess(vec![dream(1, "a"), dream(2, "b")]));
        assert!(!state.loading);
        assert_eq!(ids(&state), vec![1, 2]);
    }

    #[test]
    fn fetch_error_keeps_collection() {
        let mut state = StoreState::with_dreams(vec![dream(1, "a")]);
        state.reduce(Action::FetchStart);
        state.reduce(Action::FetchError("offline".into()));
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("offline"));
        assert_eq!(ids(&state), vec![1]);
    }

    #[test]
    fn fetch_more_skips_known_ids() {
        let mut state = StoreState::with_dreams(vec![dream(1, "a"), dream(2, "b")]);
        state.reduce(Action::FetchMore(vec![dream(2, "b"), dream(3, "c")]));
        assert_eq!(ids(&state), vec![1, 2, 3]);
    }

    #[test]
    fn prepend_and_remove() {
        let mut state = StoreState::with_dreams(vec![dream(1, "a")]);
        state.reduce(Action::Prepend(dream(-5, "temp")));
        assert_eq!(ids(&state), vec![-5, 1]);

        state.reduce(Action::Remove(-5));
        assert_eq!(ids(&state), vec![1]);

        // removing an unknown id is a no-op
        state.reduce(Action::Remove(99));
        assert_eq!(ids(&state), vec![1]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut state = StoreState::with_dreams(vec![dream(1, "a"), dream(2, "b"), dream(3, "c")]);
        state.reduce(Action::Replace(dream(2, "changed")));
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(state.get(2).unwrap().title, "changed");
    }

    #[test]
    fn replace_of_missing_record_is_ignored() {
        let mut state = StoreState::with_dreams(vec![dream(1, "a")]);
        state.reduce(Action::Replace(dream(2, "ghost")));
        assert_eq!(ids(&state), vec![1]);
    }

    #[test]
    fn action_serialization_format() {
        let json = serde_json::to_value(Action::Remove(4)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "remove", "payload": 4}));
        let json = serde_json::to_value(Action::FetchStart).unwrap();
        assert_eq!(json, serde_json::json!({"type": "fetch_start"}));
    }
}
