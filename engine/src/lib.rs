//! # Dream Engine
//!
//! Domain logic for a Telegram Mini App dream journal.
//!
//! This crate holds everything about the journal that does not depend on a
//! network or a database: the dream model and its validation, tag
//! suggestions from free text, the optimistic store state machine, and the
//! wire types the server and client exchange.
//!
//! ## Design Principles
//!
//! - **No IO**: callers pass in the current time and perform all requests
//! - **Deterministic**: the same inputs always produce the same state
//! - **Testable**: pure logic, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Dreams
//!
//! A [`Dream`] has a title, content, optional date, lowercase tags and a
//! [`DreamType`]. At least one of title, content or tags must be non-empty;
//! [`DreamInput::validate`] enforces this before anything is sent.
//!
//! ### Optimistic store
//!
//! [`DreamStore`] applies create/update/delete locally and returns a pending
//! token ([`PendingCreate`], [`PendingUpdate`], [`PendingDelete`]) that is
//! later committed or rolled back depending on what the server said.
//! All state changes go through [`Action`]s applied by [`StoreState::reduce`].
//!
//! ### Tag extraction
//!
//! [`extract_tags`] suggests tags from a user's existing vocabulary using a
//! prefix-and-length heuristic tolerant of word endings.
//!
//! ## Quick Start
//!
//! ```rust
//! use dream_engine::{DreamInput, DreamStore, Error, extract_tags};
//!
//! let mut store = DreamStore::new();
//!
//! // Suggest tags for the text being typed
//! let tags = extract_tags("сон про кота над морем", &["кот", "море"]);
//! assert_eq!(tags, vec!["кот", "море"]);
//!
//! // Apply a create optimistically
//! let input = DreamInput::new("Кот", "сон про кота над морем").with_tags(tags);
//! let pending = store.begin_create(input, 1706745600000).unwrap();
//! assert!(store.dreams()[0].is_temporary());
//!
//! // The request failed: roll back
//! let error = Error::RemoteOperation("request failed with status 500".into());
//! store.rollback_create(pending, &error);
//! assert!(store.dreams().is_empty());
//! ```

pub mod api;
pub mod clock;
pub mod dream;
pub mod error;
pub mod state;
pub mod stats;
pub mod store;
pub mod tags;

// Re-export main types at crate root
pub use api::{
    DeleteResponse, DreamEnvelope, DreamsResponse, ErrorResponse, ListQuery, StatsQuery,
    StatsResponse, TagsResponse, AUTH_HEADER,
};
pub use clock::TempIdClock;
pub use dream::{
    display_order, normalize_tags, sort_for_display, Dream, DreamInput, DreamPatch, DreamType,
};
pub use error::Error;
pub use state::{Action, StoreState};
pub use stats::{DreamStats, TagCount, TypeCounts};
pub use store::{DreamStore, PendingCreate, PendingDelete, PendingUpdate};
pub use tags::extract_tags;

/// Type aliases for clarity
pub type DreamId = i64;
/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;
