//! Database module for PostgreSQL persistence.

mod dreams;
mod pool;
mod users;

pub use dreams::*;
pub use pool::*;
pub use users::*;
