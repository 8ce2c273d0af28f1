//! The [`Transport`] seam and its request/response types.

use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use url::Url;

use crate::error::TransportError;

/// Content type of form-encoded bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Content type of XML bodies.
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a `POST` request.
    #[must_use]
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Creates a `DELETE` request.
    #[must_use]
    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Adds a header.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidHeader`] if the name or value is not
    /// valid HTTP.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, TransportError> {
        let name = HeaderName::try_from(name)
            .map_err(|_| TransportError::InvalidHeader(format!("name {name:?}")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|_| TransportError::InvalidHeader(format!("value for {name}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets a header value that is never printed by `Debug`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidHeader`] if the value is not valid HTTP.
    pub fn sensitive_header(
        mut self,
        name: HeaderName,
        value: &str,
    ) -> Result<Self, TransportError> {
        let mut value = HeaderValue::try_from(value)
            .map_err(|_| TransportError::InvalidHeader(format!("value for {name}")))?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidHeader`] if the value is not valid HTTP.
    pub fn authorization(self, value: &str) -> Result<Self, TransportError> {
        self.sensitive_header(AUTHORIZATION, value)
    }

    /// Sets a form-encoded body.
    #[must_use]
    pub fn form(self, body: String) -> Self {
        self.body_with_type(body.into_bytes(), FORM_CONTENT_TYPE)
    }

    /// Sets an XML body.
    #[must_use]
    pub fn xml(self, body: String) -> Self {
        self.body_with_type(body.into_bytes(), XML_CONTENT_TYPE)
    }

    fn body_with_type(mut self, body: Vec<u8>, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body;
        self
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// A reply received from the processor.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a reply with the given status and body and no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Sends one request and returns one reply.
///
/// Implementations perform exactly one round trip. They never retry, and a
/// non-2xx status is returned as an [`HttpResponse`], not an error.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no reply was received.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Joins a path onto a base URL.
///
/// # Errors
///
/// Returns [`TransportError::InvalidUrl`] if the result is not a valid URL.
pub fn endpoint(base: &str, path: &str) -> Result<Url, TransportError> {
    let base = Url::parse(base).map_err(|source| TransportError::InvalidUrl {
        context: "Failed to parse base url",
        source,
    })?;
    base.join(path).map_err(|source| TransportError::InvalidUrl {
        context: "Failed to construct endpoint url",
        source,
    })
}
