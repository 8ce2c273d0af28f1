//! Per-call options shared by every gateway operation.
//!
//! Adapters read the fields they need and ignore the rest. Fields an adapter
//! cannot work without are fetched through [`Options::require_order_id`] or
//! [`Options::require`], which fail with [`GatewayError::MissingOption`]
//! before any request is built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Full name of the addressee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Company name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// First street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    /// Second street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or province code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// ISO 3166 alpha-2 country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Who initiated a stored-credential transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initiator {
    /// The cardholder is present and started the payment.
    Cardholder,
    /// The merchant charges the stored card without the cardholder.
    Merchant,
}

/// Why a stored credential is being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonType {
    /// Fixed-schedule recurring billing.
    Recurring,
    /// Installment plan.
    Installment,
    /// Ad-hoc charge of a stored card.
    Unscheduled,
}

/// Stored-credential framework data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Who started the transaction.
    pub initiator: Initiator,
    /// Why the credential is used.
    pub reason_type: ReasonType,
    /// Whether this is the first transaction of the chain.
    pub initial_transaction: bool,
    /// Network transaction id of the initial transaction, for subsequent ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_transaction_id: Option<String>,
}

/// Options accompanying a gateway operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Merchant order reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO 4217 currency; adapters fall back to their default currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Customer IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Customer email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Merchant customer reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    /// Billing address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    /// Shipping address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    /// Stored-credential framework data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_credential: Option<StoredCredential>,
    /// Statement descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_descriptor: Option<String>,
    /// Adapter-specific extras.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Options {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the order id.
    #[must_use]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Sets the currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the billing address.
    #[must_use]
    pub fn with_billing_address(mut self, address: Address) -> Self {
        self.billing_address = Some(address);
        self
    }

    /// Sets the stored-credential data.
    #[must_use]
    pub fn with_stored_credential(mut self, stored_credential: StoredCredential) -> Self {
        self.stored_credential = Some(stored_credential);
        self
    }

    /// Adds an adapter-specific extra.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The currency to charge in, falling back to `default`.
    #[must_use]
    pub fn currency_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.currency.as_deref().unwrap_or(default)
    }

    /// The order id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingOption`] if no order id was supplied.
    pub fn require_order_id(&self) -> Result<&str, GatewayError> {
        self.order_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(GatewayError::MissingOption("order_id"))
    }

    /// An adapter-specific extra.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingOption`] if the extra is absent or empty.
    pub fn require(&self, key: &'static str) -> Result<&str, GatewayError> {
        self.extra
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .ok_or(GatewayError::MissingOption(key))
    }

    /// The network transaction id to chain onto, when one was supplied.
    #[must_use]
    pub fn network_transaction_id(&self) -> Option<&str> {
        self.stored_credential
            .as_ref()
            .and_then(|sc| sc.network_transaction_id.as_deref())
    }
}
