//! The contract every gateway adapter implements.
//!
//! One concrete type per processor implements [`Gateway`]. Callers hold
//! adapters as `Box<dyn Gateway>` or `Arc<dyn Gateway>` and drive them through
//! the same vocabulary regardless of wire format.
//!
//! # Outcomes
//!
//! - `Ok(response)` with `response.is_success() == false` is an ordinary
//!   processor decline or validation failure. Inspect
//!   [`Response::error_code`] for the canonical reason.
//! - `Err(GatewayError)` is reserved for mistakes detected before any request
//!   is sent (invalid amount, missing option, unsupported operation) and for
//!   transport failures where no reply arrived at all.

use async_trait::async_trait;

use crate::amount::{Amount, MoneyFormat};
use crate::error::GatewayError;
use crate::options::Options;
use crate::payment::{CardBrand, PaymentMethod};
use crate::response::{MultiResponse, Response};
use crate::scrub::Scrubber;

/// Static metadata describing an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayInfo {
    /// Human-readable processor name, used in messages and logs.
    pub display_name: &'static str,
    /// Processor homepage.
    pub homepage_url: &'static str,
    /// ISO 3166 alpha-2 codes of the countries the processor serves.
    pub supported_countries: &'static [&'static str],
    /// Card brands the processor accepts.
    pub supported_brands: &'static [CardBrand],
    /// Currency used when the caller does not supply one.
    pub default_currency: &'static str,
    /// How the processor expects amounts on the wire.
    pub money_format: MoneyFormat,
}

impl GatewayInfo {
    /// Whether the processor accepts the given brand.
    #[must_use]
    pub fn supports_brand(&self, brand: CardBrand) -> bool {
        self.supported_brands.contains(&brand)
    }

    /// Whether the processor serves the given country.
    #[must_use]
    pub fn supports_country(&self, country: &str) -> bool {
        self.supported_countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(country))
    }
}

/// A card payment processor adapter.
///
/// Adapters implement the required operations; `verify`, `store`, `unstore`
/// and the scrubbing helpers have provided implementations.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Static metadata for this adapter.
    fn info(&self) -> &GatewayInfo;

    /// Authorizes and captures `amount` in one step.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for invalid input or when no reply was received.
    async fn purchase(
        &self,
        amount: Amount,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError>;

    /// Reserves `amount` without capturing it.
    ///
    /// A successful response carries an authorization usable by
    /// [`Gateway::capture`] and [`Gateway::void`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for invalid input or when no reply was received.
    async fn authorize(
        &self,
        amount: Amount,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError>;

    /// Captures a previous authorization.
    ///
    /// An unknown or foreign authorization is reported as a failed response
    /// with [`ErrorCode::ProcessingError`](crate::ErrorCode::ProcessingError).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for invalid input or when no reply was received.
    async fn capture(
        &self,
        amount: Amount,
        authorization: &str,
        options: &Options,
    ) -> Result<Response, GatewayError>;

    /// Refunds a captured transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for invalid input or when no reply was received.
    async fn refund(
        &self,
        amount: Amount,
        authorization: &str,
        options: &Options,
    ) -> Result<Response, GatewayError>;

    /// Cancels an authorization that has not been captured.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for invalid input or when no reply was received.
    async fn void(&self, authorization: &str, options: &Options)
    -> Result<Response, GatewayError>;

    /// The amount [`Gateway::verify`] authorizes.
    fn verify_amount(&self) -> Amount {
        Amount::VERIFY
    }

    /// Checks that a payment method is valid without charging it.
    ///
    /// Authorizes [`Gateway::verify_amount`] and then voids the authorization.
    /// A declined authorization is returned as is. Once the authorization is
    /// approved the result is the authorization response, whatever the void
    /// returns: a failed or erroring void is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the authorization itself errors.
    async fn verify(
        &self,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let authorize = self
            .authorize(self.verify_amount(), payment_method, options)
            .await?;
        if !authorize.is_success() {
            return Ok(authorize);
        }

        let authorization = authorize.authorization().map(str::to_owned);
        let mut chain = MultiResponse::new(authorize);
        if let Some(authorization) = authorization {
            match self.void(&authorization, options).await {
                Ok(void) => {
                    #[cfg(feature = "telemetry")]
                    if !void.is_success() {
                        tracing::warn!(
                            gateway = self.info().display_name,
                            message = void.message(),
                            "verify: void of the verification authorization failed"
                        );
                    }
                    chain.process_ignoring_result(void);
                }
                Err(err) => {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!(
                        gateway = self.info().display_name,
                        error = %err,
                        "verify: void of the verification authorization errored"
                    );
                    drop(err);
                }
            }
        }
        Ok(chain.into_response())
    }

    /// Saves a payment method with the processor.
    ///
    /// The response authorization holds the reusable token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unsupported`] unless the adapter overrides it.
    async fn store(
        &self,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let _ = (payment_method, options);
        Err(GatewayError::Unsupported {
            gateway: self.info().display_name,
            operation: "store",
        })
    }

    /// Removes a stored payment method.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unsupported`] unless the adapter overrides it.
    async fn unstore(&self, token: &str, options: &Options) -> Result<Response, GatewayError> {
        let _ = (token, options);
        Err(GatewayError::Unsupported {
            gateway: self.info().display_name,
            operation: "unstore",
        })
    }

    /// Redaction rules for this adapter's transcripts.
    fn scrubber(&self) -> &Scrubber;

    /// Whether the adapter declares any redaction rules.
    fn supports_scrubbing(&self) -> bool {
        !self.scrubber().is_empty()
    }

    /// Redacts card data and credentials from a wire transcript.
    fn scrub(&self, transcript: &str) -> String {
        self.scrubber().scrub(transcript)
    }

    /// Redacts a transcript given as raw bytes, decoding it lossily.
    fn scrub_bytes(&self, transcript: &[u8]) -> String {
        self.scrubber().scrub_bytes(transcript)
    }
}
