//! The seam between the optimistic store and whatever holds the truth.

use async_trait::async_trait;
use dream_engine::{
    error::Result, Dream, DreamId, DreamInput, DreamPatch, DreamStats, ListQuery, StatsQuery,
};
use std::fmt;
use std::sync::Arc;

/// Raw Telegram init data, forwarded verbatim as the request credential.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(init_data: impl Into<String>) -> Self {
        Self(init_data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when there is no init data, e.g. outside the Telegram client.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

// init data carries a signature; keep it out of logs
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthToken").field(&"..").finish()
    }
}

/// Remote authority over a user's journal.
///
/// Every call is scoped to the user identified by `auth`. Implementations
/// report failures with [`dream_engine::Error`]: `Auth` for rejected
/// credentials, `NotFound` for ids the user does not own, `RemoteOperation`
/// for everything else.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    async fn list_dreams(&self, auth: &AuthToken, query: &ListQuery) -> Result<Vec<Dream>>;

    async fn get_dream(&self, auth: &AuthToken, id: DreamId) -> Result<Option<Dream>>;

    /// Store a new dream and return it with its permanent id.
    async fn create_dream(&self, auth: &AuthToken, input: &DreamInput) -> Result<Dream>;

    async fn update_dream(&self, auth: &AuthToken, id: DreamId, patch: &DreamPatch)
        -> Result<Dream>;

    async fn delete_dream(&self, auth: &AuthToken, id: DreamId) -> Result<()>;

    /// Every distinct tag the user has used, sorted.
    async fn list_unique_tags(&self, auth: &AuthToken) -> Result<Vec<String>>;

    async fn get_stats(&self, auth: &AuthToken, query: &StatsQuery) -> Result<DreamStats>;
}

#[async_trait]
impl<T: RemoteAuthority + ?Sized> RemoteAuthority for Arc<T> {
    async fn list_dreams(&self, auth: &AuthToken, query: &ListQuery) -> Result<Vec<Dream>> {
        (**self).list_dreams(auth, query).await
    }

    async fn get_dream(&self, auth: &AuthToken, id: DreamId) -> Result<Option<Dream>> {
        (**self).get_dream(auth, id).await
    }

    async fn create_dream(&self, auth: &AuthToken, input: &DreamInput) -> Result<Dream> {
        (**self).create_dream(auth, input).await
    }

    async fn update_dream(
        &self,
        auth: &AuthToken,
        id: DreamId,
        patch: &DreamPatch,
    ) -> Result<Dream> {
        (**self).update_dream(auth, id, patch).await
    }

    async fn delete_dream(&self, auth: &AuthToken, id: DreamId) -> Result<()> {
        (**self).delete_dream(auth, id).await
    }

    async fn list_unique_tags(&self, auth: &AuthToken) -> Result<Vec<String>> {
        (**self).list_unique_tags(auth).await
    }

    async fn get_stats(&self, auth: &AuthToken, query: &StatsQuery) -> Result<DreamStats> {
        (**self).get_stats(auth, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("query_id=1&hash=abc");
        assert_eq!(format!("{:?}", token), r#"AuthToken("..")"#);
        assert_eq!(token.as_str(), "query_id=1&hash=abc");
    }

    #[test]
    fn blank_token_is_empty() {
        assert!(AuthToken::new("  ").is_empty());
        assert!(!AuthToken::new("hash=abc").is_empty());
    }
}
