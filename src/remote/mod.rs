//! Remote persistence seam.
//!
//! DESIGN
//! ======
//! The backend is an external REST service. The autosave core only needs
//! five operations per entity kind, expressed as the [`Remote`] trait so tests
//! can substitute in-memory mocks and hosts can plug in other transports.
//! [`http`] holds the `reqwest` implementation.

pub mod http;

use async_trait::async_trait;

use crate::item::{ItemId, OrderedItem};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by remote API calls.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request could not be sent or its body not read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl crate::error::ErrorCode for RemoteError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_REMOTE_REQUEST",
            Self::Status { status: 404, .. } => "E_REMOTE_NOT_FOUND",
            Self::Status { .. } => "E_REMOTE_STATUS",
            Self::Parse(_) => "E_REMOTE_PARSE",
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Persistence operations for one collection of ordered items.
///
/// Implementations are scoped to a single parent (one storyboard, one
/// project), so `list` and `create` take no parent argument.
#[async_trait]
pub trait Remote<T: OrderedItem>: Send + Sync {
    /// Fetch every item of the collection.
    async fn list(&self) -> Result<Vec<T>, RemoteError>;

    /// Create an item. The returned item carries the authoritative id and order.
    async fn create(&self, patch: &T::Patch) -> Result<T, RemoteError>;

    /// Persist a (partial) set of fields.
    async fn update(&self, id: ItemId, patch: &T::Patch) -> Result<(), RemoteError>;

    /// Delete an item. The server shifts later siblings down.
    async fn delete(&self, id: ItemId) -> Result<(), RemoteError>;

    /// Move an item to `order`. The server shifts the crossed interval.
    async fn change_order(&self, id: ItemId, order: usize) -> Result<(), RemoteError>;
}

#[cfg(test)]
#[path = "mock_test.rs"]
pub(crate) mod mock;
