//! Minor-unit amounts and money formatting.
//!
//! Gateway operations take an [`Amount`]: a non-negative integer count of the
//! currency's minor units (cents for USD, yen for JPY, fils for KWD). All
//! constructors from signed, decimal, or textual input validate before any
//! request is built, so an adapter never transmits a negative or fractional
//! amount.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Currencies whose minor unit equals the major unit.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "BYR", "CLP", "CVE", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX",
    "VND", "VUV", "XAF", "XOF", "XPF",
];

/// Currencies with three decimal places.
const THREE_DECIMAL_CURRENCIES: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Returns the number of decimal places of an ISO 4217 currency code.
///
/// Unknown codes default to two.
#[must_use]
pub fn currency_exponent(currency: &str) -> u32 {
    let currency = currency.trim().to_ascii_uppercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&currency.as_str()) {
        0
    } else if THREE_DECIMAL_CURRENCIES.contains(&currency.as_str()) {
        3
    } else {
        2
    }
}

/// How an adapter renders amounts on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyFormat {
    /// Integer minor units, e.g. `"1000"`.
    Cents,
    /// Decimal major units with the currency's precision, e.g. `"10.00"`.
    Dollars,
}

/// A non-negative amount in the currency's minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// The amount authorized by the default `verify` implementation.
    pub const VERIFY: Self = Self(100);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor_units: u64) -> Self {
        Self(minor_units)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn minor_units(&self) -> u64 {
        self.0
    }

    /// Converts a major-unit decimal (e.g. `10.50` USD) into minor units.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidAmount`] if the value is negative, has
    /// more precision than the currency allows, or overflows.
    pub fn from_major(value: Decimal, currency: &str) -> Result<Self, GatewayError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(GatewayError::InvalidAmount(format!("{value} is negative")));
        }
        let factor = Decimal::from(10_u64.pow(currency_exponent(currency)));
        let scaled = value
            .checked_mul(factor)
            .ok_or_else(|| GatewayError::InvalidAmount(format!("{value} overflows")))?;
        if !scaled.fract().is_zero() {
            return Err(GatewayError::InvalidAmount(format!(
                "{value} has more precision than {currency} allows"
            )));
        }
        scaled
            .to_u64()
            .map(Self)
            .ok_or_else(|| GatewayError::InvalidAmount(format!("{value} overflows")))
    }

    /// Returns the amount in major units for the given currency.
    #[must_use]
    pub fn to_major(&self, currency: &str) -> Decimal {
        let factor = Decimal::from(10_u64.pow(currency_exponent(currency)));
        Decimal::from(self.0) / factor
    }

    /// Renders the amount in the requested wire format.
    #[must_use]
    pub fn format(&self, format: MoneyFormat, currency: &str) -> String {
        match format {
            MoneyFormat::Cents => self.0.to_string(),
            MoneyFormat::Dollars => {
                let precision = currency_exponent(currency) as usize;
                format!("{:.precision$}", self.to_major(currency))
            }
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

impl TryFrom<i64> for Amount {
    type Error = GatewayError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| GatewayError::InvalidAmount(format!("{value} is negative")))
    }
}

impl FromStr for Amount {
    type Err = GatewayError;

    /// Parses an integer count of minor units.
    ///
    /// Decimal notation is accepted only when the fractional part is zero
    /// (`"1000.00"`); `"10.5"`, `"-1"` and non-numeric input are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| GatewayError::InvalidAmount(format!("{s:?} is not a number")))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(GatewayError::InvalidAmount(format!("{s:?} is negative")));
        }
        if !value.fract().is_zero() {
            return Err(GatewayError::InvalidAmount(format!(
                "{s:?} is not a whole number of minor units"
            )));
        }
        value
            .to_u64()
            .map(Self)
            .ok_or_else(|| GatewayError::InvalidAmount(format!("{s:?} overflows")))
    }
}
