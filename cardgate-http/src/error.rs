//! Error types for the transport layer.
//!
//! Only failures where no reply was received are errors here. A reply with a
//! non-2xx status is still a reply: adapters classify its body.

use cardgate::GatewayError;

/// Errors raised by a [`Transport`](crate::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the connection failed.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The reply body could not be read.
    #[error("failed to read response body: {context}: {source}")]
    BodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// An endpoint URL could not be built.
    #[error("URL parse error: {context}: {source}")]
    InvalidUrl {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// A header name or value is not valid HTTP.
    #[error("invalid header {0}")]
    InvalidHeader(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A mock transport had no reply queued or was told to fail.
    #[error("mock transport: {0}")]
    Mock(String),
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidUrl { .. } | TransportError::InvalidHeader(_) => {
                Self::config(err.to_string())
            }
            other => Self::transport(other),
        }
    }
}
