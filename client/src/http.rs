//! HTTP implementation of [`RemoteAuthority`] against `dream-server`.

use crate::remote::{AuthToken, RemoteAuthority};
use async_trait::async_trait;
use dream_engine::{
    error::Result, DeleteResponse, Dream, DreamEnvelope, DreamId, DreamInput, DreamPatch,
    DreamStats, DreamsResponse, Error, ErrorResponse, ListQuery, StatsQuery, StatsResponse,
    TagsResponse, AUTH_HEADER,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Request timeout used by [`HttpRemote::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the journal API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    client: Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::RemoteOperation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an authenticated request and decode a JSON body.
    ///
    /// `target` is the dream the request is about, used to report a 404.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        auth: &AuthToken,
        target: Option<DreamId>,
    ) -> Result<T> {
        if auth.is_empty() {
            return Err(Error::Auth("not authenticated".to_string()));
        }

        let response = request
            .header(AUTH_HEADER, auth.as_str())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "request rejected");
            return Err(error_from_status(status, &body, target));
        }

        response.json::<T>().await.map_err(|e| {
            Error::RemoteOperation(format!("failed to decode response body: {}", e))
        })
    }
}

#[async_trait]
impl RemoteAuthority for HttpRemote {
    async fn list_dreams(&self, auth: &AuthToken, query: &ListQuery) -> Result<Vec<Dream>> {
        let request = self.client.get(self.url("/api/dreams")).query(query);
        let body: DreamsResponse = self.send(request, auth, None).await?;
        Ok(body.dreams)
    }

    async fn get_dream(&self, auth: &AuthToken, id: DreamId) -> Result<Option<Dream>> {
        let request = self.client.get(self.url(&format!("/api/dreams/{}", id)));
        match self.send::<DreamEnvelope<Dream>>(request, auth, Some(id)).await {
            Ok(body) => Ok(Some(body.dream)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_dream(&self, auth: &AuthToken, input: &DreamInput) -> Result<Dream> {
        let request = self
            .client
            .post(self.url("/api/dreams"))
            .json(&DreamEnvelope { dream: input });
        let body: DreamEnvelope<Dream> = self.send(request, auth, None).await?;
        Ok(body.dream)
    }

    async fn update_dream(
        &self,
        auth: &AuthToken,
        id: DreamId,
        patch: &DreamPatch,
    ) -> Result<Dream> {
        let request = self
            .client
            .put(self.url(&format!("/api/dreams/{}", id)))
            .json(&DreamEnvelope { dream: patch });
        let body: DreamEnvelope<Dream> = self.send(request, auth, Some(id)).await?;
        Ok(body.dream)
    }

    async fn delete_dream(&self, auth: &AuthToken, id: DreamId) -> Result<()> {
        let request = self.client.delete(self.url(&format!("/api/dreams/{}", id)));
        let _: DeleteResponse = self.send(request, auth, Some(id)).await?;
        Ok(())
    }

    async fn list_unique_tags(&self, auth: &AuthToken) -> Result<Vec<String>> {
        let request = self.client.get(self.url("/api/tags"));
        let body: TagsResponse = self.send(request, auth, None).await?;
        Ok(body.tags)
    }

    async fn get_stats(&self, auth: &AuthToken, query: &StatsQuery) -> Result<DreamStats> {
        let request = self.client.get(self.url("/api/stats")).query(query);
        let body: StatsResponse = self.send(request, auth, None).await?;
        Ok(body.stats)
    }
}

fn transport_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::RemoteOperation("request timed out".to_string())
    } else {
        Error::RemoteOperation(format!("request failed: {}", error))
    }
}

/// Map a non-success response to an engine error.
fn error_from_status(status: StatusCode, body: &str, target: Option<DreamId>) -> Error {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|r| match r.details {
            Some(details) => format!("{}: {}", r.error, details),
            None => r.error,
        })
        .unwrap_or_else(|_| format!("request failed with status {}", status.as_u16()));

    match (status, target) {
        (StatusCode::BAD_REQUEST, _) => Error::Validation(message),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => Error::Auth(message),
        (StatusCode::NOT_FOUND, Some(id)) => Error::NotFound(id),
        _ => Error::RemoteOperation(message),
    }
}
