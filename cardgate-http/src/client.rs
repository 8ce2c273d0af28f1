//! A [`Transport`] backed by `reqwest`.
//!
//! ## Features
//!
//! - Uses `reqwest` for async HTTP requests
//! - Supports optional timeout and default headers
//! - Integrates with `tracing` if the `telemetry` feature is enabled

use std::time::Duration;

use async_trait::async_trait;
use cardgate::config::GatewayConfigEntry;
use http::HeaderMap;
use reqwest::Client;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Network transport using a shared `reqwest` client.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    /// Shared Reqwest HTTP client
    client: Client,
    /// Headers sent with every request unless the request sets them
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            headers: HeaderMap::new(),
            timeout: None,
        }
    }

    /// Creates a transport configured from a gateway entry.
    #[must_use]
    pub fn from_entry(entry: &GatewayConfigEntry) -> Self {
        let transport = Self::new();
        match entry.timeout() {
            Some(timeout) => transport.with_timeout(timeout),
            None => transport,
        }
    }

    /// Attaches default headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the default headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "cardgate.http.send",
            skip_all,
            fields(method = %request.method, host = request.url.host_str().unwrap_or_default()),
            err
        )
    )]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let context = "send request";
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut merged = self.headers.clone();
        merged.extend(headers);

        let mut req = self.client.request(method, url).headers(merged).body(body);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let response = req
            .send()
            .await
            .map_err(|source| TransportError::Http { context, source })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::BodyRead { context, source })?
            .to_vec();

        #[cfg(feature = "telemetry")]
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "reply received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::endpoint;
    use http::header::CONTENT_TYPE;
    use http::{Method, StatusCode};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_posts_form_body_and_returns_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/transact.php"))
            .and(header(CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded"))
            .and(body_string("type=sale&amount=1.00"))
            .respond_with(ResponseTemplate::new(200).set_body_string("response=1"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().with_timeout(Duration::from_secs(5));
        let url = endpoint(&server.uri(), "/api/transact.php").unwrap();
        let request = HttpRequest::post(url).form("type=sale&amount=1.00".to_owned());
        let reply = transport.send(request).await.unwrap();

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.text(), "response=1");
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/charges"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_string(r#"{"error":{"code":"card_declined"}}"#),
            )
            .mount(&server)
            .await;

        let url = endpoint(&server.uri(), "/v1/charges").unwrap();
        let reply = ReqwestTransport::new()
            .send(HttpRequest::post(url))
            .await
            .unwrap();
        assert_eq!(reply.status, StatusCode::PAYMENT_REQUIRED);
        assert!(!reply.is_success());
        assert!(reply.text().contains("card_declined"));
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("x-client", "cardgate"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-client", "cardgate".parse().unwrap());
        let url = endpoint(&server.uri(), "/").unwrap();
        let reply = ReqwestTransport::new()
            .with_headers(headers)
            .send(HttpRequest::new(Method::GET, url))
            .await
            .unwrap();
        assert!(reply.is_success());
    }

    #[tokio::test]
    async fn test_connection_failure_is_error() {
        let url = endpoint("http://127.0.0.1:1", "/").unwrap();
        let result = ReqwestTransport::new()
            .with_timeout(Duration::from_secs(2))
            .send(HttpRequest::new(Method::GET, url))
            .await;
        assert!(matches!(result, Err(TransportError::Http { .. })));
    }

    #[test]
    fn test_from_entry_applies_timeout() {
        let entry = GatewayConfigEntry {
            timeout_secs: Some(12),
            ..GatewayConfigEntry::default()
        };
        assert_eq!(
            ReqwestTransport::from_entry(&entry).timeout(),
            Some(Duration::from_secs(12))
        );
        assert!(ReqwestTransport::new().timeout().is_none());
    }
}
