//! Error types for gateway operations.
//!
//! A [`GatewayError`] signals a caller-programmer mistake detected before any
//! request leaves the process (bad amount, missing option, broken
//! configuration), or a transport failure where no reply was received at all.
//! Processor-reported declines are never errors: they are returned as a
//! [`Response`](crate::Response) whose `success` is `false`.

/// Errors raised by gateway operations instead of a [`Response`](crate::Response).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The amount is negative, fractional in minor units, or unparseable.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A required per-call option was not supplied.
    #[error("missing required option: {0}")]
    MissingOption(&'static str),

    /// The adapter configuration is malformed or incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// The adapter does not implement the requested operation.
    #[error("{gateway} does not support {operation}")]
    Unsupported {
        /// Display name of the gateway.
        gateway: &'static str,
        /// The operation that was requested.
        operation: &'static str,
    },

    /// The payment method variant is not accepted by this operation.
    #[error("invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// The request body could not be encoded in the processor's wire format.
    #[error("request encoding failed: {0}")]
    Encoding(String),

    /// No reply was received from the processor.
    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

impl GatewayError {
    /// Creates a transport error from any boxed error.
    #[must_use]
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transport(err.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
