//! Canonical decline and error reasons.
//!
//! Processors report failures in their own vocabulary: numeric response codes,
//! short strings, nested JSON objects. Each adapter owns an [`ErrorCodeTable`]
//! translating that vocabulary onto the closed [`ErrorCode`] enumeration, so
//! callers can key business logic (retry on `processing_error`, never retry on
//! `card_declined`) off a single stable set of values.
//!
//! The string forms returned by [`ErrorCode::as_str`] are part of the public
//! contract and do not change between releases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A canonical, processor-independent failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The card number does not belong to a real account.
    IncorrectNumber,
    /// The card number is malformed.
    InvalidNumber,
    /// The expiry month or year is malformed.
    InvalidExpiryDate,
    /// The card verification value is malformed.
    InvalidCvc,
    /// The card has expired.
    ExpiredCard,
    /// The card verification value did not match.
    IncorrectCvc,
    /// The postal code did not match.
    IncorrectZip,
    /// The postal code is malformed.
    InvalidZip,
    /// The street address did not match.
    IncorrectAddress,
    /// The PIN did not match.
    IncorrectPin,
    /// The issuer declined the card.
    CardDeclined,
    /// The processor failed to handle the request.
    ProcessingError,
    /// The cardholder must contact the issuer.
    CallIssuer,
    /// The issuer asked for the card to be retained.
    PickupCard,
    /// The merchant account or credentials are misconfigured.
    ConfigError,
    /// A live card was used against a test account.
    TestModeLiveCard,
    /// The processor does not support the requested feature.
    UnsupportedFeature,
    /// The processor rejected the amount.
    InvalidAmount,
}

impl ErrorCode {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::IncorrectNumber,
        Self::InvalidNumber,
        Self::InvalidExpiryDate,
        Self::InvalidCvc,
        Self::ExpiredCard,
        Self::IncorrectCvc,
        Self::IncorrectZip,
        Self::InvalidZip,
        Self::IncorrectAddress,
        Self::IncorrectPin,
        Self::CardDeclined,
        Self::ProcessingError,
        Self::CallIssuer,
        Self::PickupCard,
        Self::ConfigError,
        Self::TestModeLiveCard,
        Self::UnsupportedFeature,
        Self::InvalidAmount,
    ];

    /// Returns the stable `snake_case` identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IncorrectNumber => "incorrect_number",
            Self::InvalidNumber => "invalid_number",
            Self::InvalidExpiryDate => "invalid_expiry_date",
            Self::InvalidCvc => "invalid_cvc",
            Self::ExpiredCard => "expired_card",
            Self::IncorrectCvc => "incorrect_cvc",
            Self::IncorrectZip => "incorrect_zip",
            Self::InvalidZip => "invalid_zip",
            Self::IncorrectAddress => "incorrect_address",
            Self::IncorrectPin => "incorrect_pin",
            Self::CardDeclined => "card_declined",
            Self::ProcessingError => "processing_error",
            Self::CallIssuer => "call_issuer",
            Self::PickupCard => "pickup_card",
            Self::ConfigError => "config_error",
            Self::TestModeLiveCard => "test_mode_live_card",
            Self::UnsupportedFeature => "unsupported_feature",
            Self::InvalidAmount => "invalid_amount",
        }
    }

    /// Whether a retry of the same request could reasonably succeed.
    ///
    /// Only transient processor failures qualify; declines and data errors
    /// will fail again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ProcessingError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown error code string.
#[derive(Debug, thiserror::Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_owned()))
    }
}

/// A static lookup from a processor's native codes to [`ErrorCode`].
///
/// Native codes with no reasonable canonical counterpart are left out of the
/// table; [`ErrorCodeTable::lookup`] then returns `None` and the response
/// carries no error code.
///
/// ```rust
/// use cardgate::{ErrorCode, ErrorCodeTable};
///
/// static CODES: ErrorCodeTable = ErrorCodeTable::new(&[
///     ("05", ErrorCode::CardDeclined),
///     ("54", ErrorCode::ExpiredCard),
/// ]);
///
/// assert_eq!(CODES.lookup("54"), Some(ErrorCode::ExpiredCard));
/// assert_eq!(CODES.lookup("99"), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ErrorCodeTable {
    entries: &'static [(&'static str, ErrorCode)],
}

impl ErrorCodeTable {
    /// Wraps a static slice of `(native, canonical)` pairs.
    #[must_use]
    pub const fn new(entries: &'static [(&'static str, ErrorCode)]) -> Self {
        Self { entries }
    }

    /// Looks up a native code. Leading and trailing whitespace is ignored.
    #[must_use]
    pub fn lookup(&self, native: &str) -> Option<ErrorCode> {
        let native = native.trim();
        self.entries
            .iter()
            .find(|(code, _)| *code == native)
            .map(|(_, canonical)| *canonical)
    }

    /// Returns the underlying entries.
    #[must_use]
    pub const fn entries(&self) -> &'static [(&'static str, ErrorCode)] {
        self.entries
    }
}
