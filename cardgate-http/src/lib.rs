#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport layer for cardgate adapters.
//!
//! Adapters never talk to an HTTP client directly. They build an
//! [`HttpRequest`], hand it to a [`Transport`], and classify whatever bytes
//! come back. That seam lets the same adapter run against the real network,
//! a recording decorator that captures wire transcripts for scrubbing, or a
//! canned in-memory transport in tests.
//!
//! # Modules
//!
//! - [`client`] - [`ReqwestTransport`], the network-backed transport
//! - [`error`] - Transport error types
//! - [`form`] - Form encoding/decoding and HTTP Basic credentials
//! - [`transcript`] - [`TranscriptRecorder`], a wire-log decorator
//! - [`transport`] - The [`Transport`] trait and request/response types
//! - [`mock`] - [`MockTransport`] with queued replies (feature: `mock`)
//!
//! # Feature Flags
//!
//! - `mock` - Enables the in-memory [`MockTransport`]
//! - `telemetry` - Enables tracing instrumentation for requests

pub mod client;
pub mod error;
pub mod form;
pub mod transcript;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::ReqwestTransport;
pub use error::TransportError;
pub use transcript::TranscriptRecorder;
pub use transport::{HttpRequest, HttpResponse, Transport};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
