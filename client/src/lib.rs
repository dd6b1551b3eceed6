//! Client side of the dream journal.
//!
//! [`OptimisticStore`] keeps the user's journal in memory, applies every
//! create/update/delete immediately, and reconciles with a
//! [`RemoteAuthority`] afterwards, rolling the local change back if the
//! remote call fails. [`HttpRemote`] is the production authority, talking to
//! `dream-server` over HTTP.
//!
//! ```no_run
//! use dream_client::{AuthToken, HttpRemote, OptimisticStore};
//! use dream_engine::{DreamInput, ListQuery};
//!
//! # async fn run(init_data: String) -> dream_engine::error::Result<()> {
//! let remote = HttpRemote::new("https://dreams.example.com")?;
//! let store = OptimisticStore::new(remote, AuthToken::new(init_data));
//!
//! store.load(&ListQuery::default()).await?;
//! let dream = store.create(DreamInput::new("Flight", "over the sea")).await?;
//! println!("saved as {}", dream.id);
//! # Ok(())
//! # }
//! ```

mod http;
mod remote;
mod store;

pub use http::{HttpRemote, DEFAULT_TIMEOUT};
pub use remote::{AuthToken, RemoteAuthority};
pub use store::OptimisticStore;
