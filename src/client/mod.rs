//! Resource backend client
//!
//! The CRUD binder talks to the mock cloud backend through the
//! [`ResourceClient`] trait. [`http::HttpResourceClient`] is the production
//! implementation; tests substitute in-memory fakes.
//!
//! # Module Structure
//!
//! - [`http`] - reqwest-based client for the backend's REST API
//!
//! # Example
//!
//! ```ignore
//! use tf_mock_provider::client::{http::HttpResourceClient, ResourceClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = HttpResourceClient::new("http://localhost:3000")?;
//!     let found = client.read("aws_s3_bucket", "my-bucket").await?;
//!     Ok(())
//! }
//! ```

pub mod http;

use crate::value::AttrMap;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A successful backend response: the resource identity and the full
/// attribute state the backend reports for it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceResponse {
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Errors from a backend call
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Backend rejected the request with a readable message
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Unexpected status with no readable message
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Build the error for a non-success response, surfacing the backend's
    /// message when the body carries one
    pub fn from_response(operation: &'static str, status: StatusCode, body: &str) -> Self {
        match extract_message(body) {
            Some(message) => ClientError::Rejected { status, message },
            None => ClientError::Status {
                operation,
                status,
                body: body.to_string(),
            },
        }
    }

    /// HTTP status of the failed response, if the backend answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Rejected { status, .. } | ClientError::Status { status, .. } => {
                Some(*status)
            }
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Pull a message out of `{"error": "..."}`, `{"message": "..."}` or
/// `{"error": {"message": "..."}}`
fn extract_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let message = match json.get("error") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Object(inner)) => inner.get("message").and_then(Value::as_str),
        _ => None,
    }
    .or_else(|| json.get("message").and_then(Value::as_str))?;

    Some(message.to_string())
}

/// Capability to manage resources on the backend
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Create a resource; anything but 201 is an error
    async fn create(
        &self,
        resource_type: &str,
        attributes: &AttrMap,
    ) -> Result<ResourceResponse, ClientError>;

    /// Read a resource; `Ok(None)` when the backend reports it absent
    async fn read(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Option<ResourceResponse>, ClientError>;

    /// Replace a resource's attributes; anything but 200 is an error
    async fn update(
        &self,
        resource_type: &str,
        id: &str,
        attributes: &AttrMap,
    ) -> Result<ResourceResponse, ClientError>;

    /// Delete a resource; anything but 204 is an error
    async fn delete(&self, resource_type: &str, id: &str) -> Result<(), ClientError>;
}
