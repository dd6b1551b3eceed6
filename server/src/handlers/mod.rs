//! Request handlers for the journal API.

mod dreams;
mod stats;
mod tags;
mod users;

pub use dreams::*;
pub use stats::*;
pub use tags::*;
pub use users::*;
