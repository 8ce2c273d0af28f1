//! In-memory transport with queued replies, for adapter tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use http::StatusCode;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// A transport that returns canned replies in order and records requests.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Creates a transport with no queued replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply with the given status and body.
    pub fn push_reply(&self, status: StatusCode, body: impl Into<Vec<u8>>) -> &Self {
        self.push_response(HttpResponse::new(status, body))
    }

    /// Queues a fully built reply.
    pub fn push_response(&self, response: HttpResponse) -> &Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(response));
        self
    }

    /// Queues a connection failure.
    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(message.into()));
        self
    }

    /// Every request sent so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Number of replies still queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::Mock(message)),
            None => Err(TransportError::Mock("no reply queued".to_owned())),
        }
    }
}
