#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Concrete processor adapters for the cardgate [`Gateway`](cardgate::Gateway) contract.
//!
//! Each adapter translates the shared operation vocabulary into one
//! processor's wire format and back:
//!
//! - [`nmi`] - NMI, form-encoded requests and replies
//! - [`stripe`] - Stripe charges API, form-encoded requests and JSON replies
//! - [`moneris`] - Moneris eSELECTplus, XML requests and replies
//!
//! Every adapter owns a private classifier, a private error code table and a
//! transcript scrubber. Adapters are built from a typed configuration and a
//! shared [`Transport`](cardgate_http::Transport):
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cardgate::config::GatewaysConfig;
//! use cardgate_gateways::nmi::{Nmi, NmiConfig};
//! use cardgate_http::ReqwestTransport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewaysConfig::load()?;
//! let entry = config.gateway("nmi")?;
//! let transport = Arc::new(ReqwestTransport::from_entry(entry));
//! let gateway = Nmi::new(NmiConfig::try_from(entry)?, transport)?;
//! # let _ = gateway;
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for adapter round trips

pub mod moneris;
pub mod nmi;
pub mod stripe;

mod support;

pub use moneris::{Moneris, MonerisConfig};
pub use nmi::{Nmi, NmiConfig};
pub use stripe::{Stripe, StripeConfig};
