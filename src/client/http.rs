//! HTTP client for the mock backend's REST API

use super::{ClientError, ResourceClient, ResourceResponse};
use crate::value::AttrMap;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Truncate long bodies and strip control characters before logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = match body.char_indices().nth(MAX_LOG_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... [truncated, {} bytes total]", &body[..cut], body.len()),
        None => body.to_string(),
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

#[derive(Serialize)]
struct AttributesBody<'a> {
    attributes: &'a AttrMap,
}

#[derive(Serialize)]
struct ConfigureBody<'a> {
    region: &'a str,
}

/// Raw outcome of one request
struct Reply {
    status: StatusCode,
    body: String,
}

/// [`ResourceClient`] backed by the backend's HTTP API
#[derive(Clone)]
pub struct HttpResourceClient {
    client: Client,
    base_url: Url,
}

impl HttpResourceClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a specific per-request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        let client = Client::builder()
            .user_agent(concat!("tf-mock-provider/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Send the provider configuration to the backend
    pub async fn configure(&self, region: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["provider", "configure"])?;
        let reply = self
            .send(Method::POST, url, Some(&ConfigureBody { region }))
            .await?;

        if reply.status != StatusCode::OK {
            return Err(self.failure("configure", reply));
        }
        tracing::info!("Configured backend region {}", region);
        Ok(())
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let path = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Ok(Url::parse(&format!("{}/{}", self.base_url(), path))?)
    }

    fn resource_url(&self, resource_type: &str, id: Option<&str>) -> Result<Url, ClientError> {
        match id {
            Some(id) => self.endpoint(&["resource", resource_type, id]),
            None => self.endpoint(&["resource", resource_type]),
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Reply, ClientError> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(Reply { status, body })
    }

    fn failure(&self, operation: &'static str, reply: Reply) -> ClientError {
        tracing::error!(
            "Backend error on {}: {} - {}",
            operation,
            reply.status,
            sanitize_for_log(&reply.body)
        );
        ClientError::from_response(operation, reply.status, &reply.body)
    }

    fn decode(reply: &Reply) -> Result<ResourceResponse, ClientError> {
        Ok(serde_json::from_str(&reply.body)?)
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn create(
        &self,
        resource_type: &str,
        attributes: &AttrMap,
    ) -> Result<ResourceResponse, ClientError> {
        let url = self.resource_url(resource_type, None)?;
        let reply = self
            .send(Method::POST, url, Some(&AttributesBody { attributes }))
            .await?;

        if reply.status != StatusCode::CREATED {
            return Err(self.failure("create", reply));
        }
        Self::decode(&reply)
    }

    async fn read(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Option<ResourceResponse>, ClientError> {
        let url = self.resource_url(resource_type, Some(id))?;
        let reply = self.send::<()>(Method::GET, url, None).await?;

        match reply.status {
            StatusCode::OK => Self::decode(&reply).map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(self.failure("read", reply)),
        }
    }

    async fn update(
        &self,
        resource_type: &str,
        id: &str,
        attributes: &AttrMap,
    ) -> Result<ResourceResponse, ClientError> {
        let url = self.resource_url(resource_type, Some(id))?;
        let reply = self
            .send(Method::PUT, url, Some(&AttributesBody { attributes }))
            .await?;

        if reply.status != StatusCode::OK {
            return Err(self.failure("update", reply));
        }
        Self::decode(&reply)
    }

    async fn delete(&self, resource_type: &str, id: &str) -> Result<(), ClientError> {
        let url = self.resource_url(resource_type, Some(id))?;
        let reply = self.send::<()>(Method::DELETE, url, None).await?;

        if reply.status != StatusCode::NO_CONTENT {
            return Err(self.failure("delete", reply));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("bad\r\nrequest"), "badrequest");
    }

    #[test]
    fn test_sanitize_multibyte_boundary() {
        let body = "é".repeat(300);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("600 bytes total"));
    }

    #[test]
    fn test_resource_urls_are_encoded() {
        let client = HttpResourceClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");

        let url = client
            .resource_url("aws_s3_bucket", Some("my bucket/1"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/resource/aws_s3_bucket/my%20bucket%2F1"
        );

        let url = client.resource_url("aws_vpc", None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/resource/aws_vpc");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpResourceClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
