//! REST implementation of [`Remote`] on top of `reqwest`.
//!
//! Thin HTTP wrapper. URL building and response parsing are pure functions
//! for testability.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Remote, RemoteError};
use crate::config::ApiConfig;
use crate::item::{Frame, ItemId, OrderedItem, Shot};

// =============================================================================
// ROUTING
// =============================================================================

/// Route segments for an entity kind.
pub trait Resource: OrderedItem + DeserializeOwned {
    /// Plural path segment of the items themselves.
    const COLLECTION: &'static str;
    /// Plural path segment of the owning parent.
    const PARENT: &'static str;
}

impl Resource for Frame {
    const COLLECTION: &'static str = "frames";
    const PARENT: &'static str = "storyboards";
}

impl Resource for Shot {
    const COLLECTION: &'static str = "shots";
    const PARENT: &'static str = "projects";
}

/// `{base}/{parent}/{parent_id}/{collection}`
pub(crate) fn collection_url(base_url: &str, parent: &str, parent_id: ItemId, collection: &str) -> String {
    format!("{base_url}/{parent}/{parent_id}/{collection}")
}

/// `{base}/{collection}/{id}`
pub(crate) fn item_url(base_url: &str, collection: &str, id: ItemId) -> String {
    format!("{base_url}/{collection}/{id}")
}

/// `{base}/{collection}/{id}/{field}`
pub(crate) fn field_url(base_url: &str, collection: &str, id: ItemId, field: &str) -> String {
    format!("{base_url}/{collection}/{id}/{field}")
}

// =============================================================================
// API CLIENT
// =============================================================================

/// Shared HTTP client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::ClientBuild`] if the TLS backend fails to initialize.
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| RemoteError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get(&self, url: &str) -> Result<String, RemoteError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        read_body(response).await
    }

    pub(crate) async fn send_json<B>(&self, method: Method, url: &str, body: &B) -> Result<String, RemoteError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let response = self
            .http
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        read_body(response).await
    }

    pub(crate) async fn delete(&self, url: &str) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        read_body(response).await?;
        Ok(())
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, RemoteError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| RemoteError::Request(e.to_string()))?;
    check_status(status, text)
}

pub(crate) fn check_status(status: u16, body: String) -> Result<String, RemoteError> {
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(RemoteError::Status { status, body })
    }
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, RemoteError> {
    serde_json::from_str(text).map_err(|e| RemoteError::Parse(e.to_string()))
}

#[derive(Serialize)]
struct OrderBody {
    order: usize,
}

// =============================================================================
// HTTP REMOTE
// =============================================================================

/// [`Remote`] for the items of one parent (a storyboard's frames, a project's shots).
pub struct HttpRemote<T> {
    api: ApiClient,
    parent_id: ItemId,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Resource> HttpRemote<T> {
    #[must_use]
    pub fn new(api: ApiClient, parent_id: ItemId) -> Self {
        Self { api, parent_id, _kind: PhantomData }
    }

    fn list_url(&self) -> String {
        collection_url(self.api.base_url(), T::PARENT, self.parent_id, T::COLLECTION)
    }
}

#[async_trait]
impl<T: Resource> Remote<T> for HttpRemote<T> {
    async fn list(&self) -> Result<Vec<T>, RemoteError> {
        let text = self.api.get(&self.list_url()).await?;
        parse_json(&text)
    }

    async fn create(&self, patch: &T::Patch) -> Result<T, RemoteError> {
        let text = self
            .api
            .send_json(Method::POST, &self.list_url(), patch)
            .await?;
        parse_json(&text)
    }

    async fn update(&self, id: ItemId, patch: &T::Patch) -> Result<(), RemoteError> {
        let url = item_url(self.api.base_url(), T::COLLECTION, id);
        self.api.send_json(Method::PATCH, &url, patch).await?;
        Ok(())
    }

    async fn delete(&self, id: ItemId) -> Result<(), RemoteError> {
        self.api
            .delete(&item_url(self.api.base_url(), T::COLLECTION, id))
            .await
    }

    async fn change_order(&self, id: ItemId, order: usize) -> Result<(), RemoteError> {
        let url = field_url(self.api.base_url(), T::COLLECTION, id, "order");
        self.api
            .send_json(Method::PUT, &url, &OrderBody { order })
            .await?;
        Ok(())
    }
}
