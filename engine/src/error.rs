//! Error types shared by the dream journal crates.

use crate::DreamId;
use thiserror::Error;

/// All possible errors surfaced by the journal.
///
/// The same taxonomy is used on both sides of the wire: the client produces
/// these from HTTP responses, the server maps them onto status codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input violates the title/content/tag invariant. Raised before any
    /// request leaves the client.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-success response or transport failure.
    #[error("remote operation failed: {0}")]
    RemoteOperation(String),

    #[error("dream not found: {0}")]
    NotFound(DreamId),

    /// The record is a local placeholder whose create has not been
    /// confirmed; the remote authority has nothing under this id.
    #[error("dream {0} is still being saved")]
    Unsaved(DreamId),

    #[error("unknown dream type: {0}")]
    UnknownDreamType(String),
}

impl Error {
    /// Whether this error came back from the remote authority.
    ///
    /// `NotFound` counts as remote: it is the specific case of a rejected
    /// operation on a record that does not exist for the caller.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::RemoteOperation(_) | Error::NotFound(_))
    }
}

/// Result type for journal operations.
pub type Result<T> = std::result::Result<T, Error>;
