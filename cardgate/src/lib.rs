#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core contracts for card payment gateway adapters.
//!
//! Every adapter in the cardgate ecosystem translates the same small vocabulary
//! (purchase, authorize, capture, refund, void, verify, store, unstore) into a
//! processor-specific wire format. This crate holds what those adapters share:
//! the uniform [`Response`] shape, the classification contract that produces it,
//! the canonical [`ErrorCode`] table, and the transcript [`Scrubber`] that
//! redacts card data and credentials from wire logs.
//!
//! # Modules
//!
//! - [`amount`] - Minor-unit amounts, currency exponents and money formatting
//! - [`classify`] - Mapping native status signals to success/failure
//! - [`config`] - TOML gateway configuration with environment expansion
//! - [`error`] - Programmer-error type raised before any network call
//! - [`error_code`] - Canonical decline/error reasons and per-adapter lookup tables
//! - [`gateway`] - The [`Gateway`] trait every adapter implements
//! - [`options`] - Per-call options (order id, addresses, stored credentials)
//! - [`params`] - The gateway-native parsed reply map
//! - [`payment`] - Cards and stored tokens
//! - [`response`] - The immutable [`Response`] value object
//! - [`scrub`] - Transcript redaction rules
//! - [`verification`] - AVS and CVV result normalization
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for gateway operations

pub mod amount;
pub mod classify;
pub mod config;
pub mod error;
pub mod error_code;
pub mod gateway;
pub mod options;
pub mod params;
pub mod payment;
pub mod response;
pub mod scrub;
pub mod verification;

pub use amount::{Amount, MoneyFormat};
pub use classify::{Classification, Classify, Precedence};
pub use error::GatewayError;
pub use error_code::{ErrorCode, ErrorCodeTable};
pub use gateway::{Gateway, GatewayInfo};
pub use options::{Address, Options, StoredCredential};
pub use params::Params;
pub use payment::{CardBrand, CreditCard, PaymentMethod};
pub use response::{MultiResponse, Response};
pub use scrub::{FILTERED, ScrubRule, Scrubber};
pub use verification::{AvsResult, CvvResult};
