//! Payment methods accepted by gateway operations.
//!
//! A caller either presents raw card data or an opaque token/reference that a
//! previous `store` (or purchase) returned. [`PaymentMethod`] makes that choice
//! explicit and adapters pattern-match on it.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Card network, detected from the card number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    /// Visa.
    Visa,
    /// Mastercard, including the 2-series range.
    Master,
    /// American Express.
    AmericanExpress,
    /// Discover.
    Discover,
    /// Diners Club.
    DinersClub,
    /// JCB.
    Jcb,
}

impl CardBrand {
    /// Returns the `snake_case` identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Master => "master",
            Self::AmericanExpress => "american_express",
            Self::Discover => "discover",
            Self::DinersClub => "diners_club",
            Self::Jcb => "jcb",
        }
    }
}

static BRAND_PATTERNS: LazyLock<Vec<(CardBrand, Regex)>> = LazyLock::new(|| {
    [
        (CardBrand::Visa, r"^4\d{12}(\d{3})?(\d{3})?$"),
        (
            CardBrand::Master,
            r"^(5[1-5]\d{4}|677189|222[1-9]\d{2}|22[3-9]\d{3}|2[3-6]\d{4}|27[01]\d{3}|2720\d{2})\d{10}$",
        ),
        (CardBrand::AmericanExpress, r"^3[47]\d{13}$"),
        (CardBrand::Discover, r"^(6011|65\d{2}|64[4-9]\d)\d{12,15}$"),
        (CardBrand::DinersClub, r"^3(0[0-5]|[68]\d)\d{11,16}$"),
        (CardBrand::Jcb, r"^35(28|29|[3-8]\d)\d{12}$"),
    ]
    .into_iter()
    .map(|(brand, pattern)| (brand, Regex::new(pattern).expect("valid brand pattern")))
    .collect()
});

/// Raw card data.
///
/// The `Debug` representation masks the number and hides the verification
/// value, so cards can be logged without leaking card data.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    /// Primary account number, digits only.
    pub number: String,
    /// Expiry month, 1 through 12.
    pub month: u8,
    /// Four-digit expiry year.
    pub year: u16,
    /// Cardholder first name.
    #[serde(default)]
    pub first_name: String,
    /// Cardholder last name.
    #[serde(default)]
    pub last_name: String,
    /// CVV/CVC, when collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_value: Option<String>,
    /// Explicit brand; detected from the number when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<CardBrand>,
}

impl CreditCard {
    /// Creates a card from its number and expiry. Spaces and dashes in the
    /// number are removed.
    #[must_use]
    pub fn new(number: &str, month: u8, year: u16) -> Self {
        Self {
            number: number.chars().filter(char::is_ascii_digit).collect(),
            month,
            year,
            first_name: String::new(),
            last_name: String::new(),
            verification_value: None,
            brand: None,
        }
    }

    /// Sets the cardholder name.
    #[must_use]
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Sets the card verification value.
    #[must_use]
    pub fn with_verification_value(mut self, value: impl Into<String>) -> Self {
        self.verification_value = Some(value.into());
        self
    }

    /// Overrides brand detection.
    #[must_use]
    pub const fn with_brand(mut self, brand: CardBrand) -> Self {
        self.brand = Some(brand);
        self
    }

    /// The explicit brand, or the one detected from the number.
    #[must_use]
    pub fn brand(&self) -> Option<CardBrand> {
        self.brand.or_else(|| {
            BRAND_PATTERNS
                .iter()
                .find(|(_, pattern)| pattern.is_match(&self.number))
                .map(|(brand, _)| *brand)
        })
    }

    /// Whether the number passes the Luhn checksum.
    #[must_use]
    pub fn is_luhn_valid(&self) -> bool {
        if self.number.len() < 12 {
            return false;
        }
        let mut sum = 0_u32;
        for (idx, ch) in self.number.chars().rev().enumerate() {
            let Some(mut digit) = ch.to_digit(10) else {
                return false;
            };
            if idx % 2 == 1 {
                digit *= 2;
                if digit > 9 {
                    digit -= 9;
                }
            }
            sum += digit;
        }
        sum % 10 == 0
    }

    /// The last four digits of the number.
    #[must_use]
    pub fn last_digits(&self) -> &str {
        let start = self
            .number
            .char_indices()
            .rev()
            .nth(3)
            .map_or(0, |(idx, _)| idx);
        &self.number[start..]
    }

    /// The number with all but the last four digits masked.
    #[must_use]
    pub fn masked_number(&self) -> String {
        format!("XXXX-XXXX-XXXX-{}", self.last_digits())
    }

    /// The full cardholder name.
    #[must_use]
    pub fn name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }

    /// Expiry as `MMYY`.
    #[must_use]
    pub fn expiry_mmyy(&self) -> String {
        format!("{:02}{:02}", self.month, self.year % 100)
    }

    /// Expiry as `YYMM`.
    #[must_use]
    pub fn expiry_yymm(&self) -> String {
        format!("{:02}{:02}", self.year % 100, self.month)
    }

    /// Expiry as `MM/YYYY`.
    #[must_use]
    pub fn expiry_long(&self) -> String {
        format!("{:02}/{:04}", self.month, self.year)
    }
}

impl fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCard")
            .field("number", &self.masked_number())
            .field("month", &self.month)
            .field("year", &self.year)
            .field("name", &self.name())
            .field(
                "verification_value",
                &self.verification_value.as_ref().map(|_| crate::scrub::FILTERED),
            )
            .field("brand", &self.brand())
            .finish()
    }
}

/// What the caller charges: raw card data or a stored reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Raw card data.
    Card(CreditCard),
    /// An opaque token previously returned by the gateway.
    Token(String),
}

impl PaymentMethod {
    /// Returns the card, if this is raw card data.
    #[must_use]
    pub const fn as_card(&self) -> Option<&CreditCard> {
        match self {
            Self::Card(card) => Some(card),
            Self::Token(_) => None,
        }
    }

    /// Returns the token, if this is a stored reference.
    #[must_use]
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Card(_) => None,
            Self::Token(token) => Some(token),
        }
    }
}

impl From<CreditCard> for PaymentMethod {
    fn from(card: CreditCard) -> Self {
        Self::Card(card)
    }
}

impl From<&str> for PaymentMethod {
    fn from(token: &str) -> Self {
        Self::Token(token.to_owned())
    }
}

impl From<String> for PaymentMethod {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_detection() {
        assert_eq!(CreditCard::new("4111111111111111", 9, 2030).brand(), Some(CardBrand::Visa));
        assert_eq!(CreditCard::new("5555 5555 5555 4444", 9, 2030).brand(), Some(CardBrand::Master));
        assert_eq!(CreditCard::new("2223000048400011", 9, 2030).brand(), Some(CardBrand::Master));
        assert_eq!(
            CreditCard::new("378282246310005", 9, 2030).brand(),
            Some(CardBrand::AmericanExpress)
        );
        assert_eq!(CreditCard::new("6011111111111117", 9, 2030).brand(), Some(CardBrand::Discover));
        assert_eq!(CreditCard::new("3530111333300000", 9, 2030).brand(), Some(CardBrand::Jcb));
        assert_eq!(CreditCard::new("1234", 9, 2030).brand(), None);
        assert_eq!(
            CreditCard::new("1234", 9, 2030).with_brand(CardBrand::Visa).brand(),
            Some(CardBrand::Visa)
        );
    }

    #[test]
    fn test_luhn() {
        assert!(CreditCard::new("4242424242424242", 1, 2030).is_luhn_valid());
        assert!(CreditCard::new("4000100011112224", 1, 2030).is_luhn_valid());
        assert!(!CreditCard::new("4242424242424241", 1, 2030).is_luhn_valid());
        assert!(!CreditCard::new("42", 1, 2030).is_luhn_valid());
    }

    #[test]
    fn test_expiry_formats() {
        let card = CreditCard::new("4242424242424242", 3, 2031);
        assert_eq!(card.expiry_mmyy(), "0331");
        assert_eq!(card.expiry_yymm(), "3103");
        assert_eq!(card.expiry_long(), "03/2031");
    }

    #[test]
    fn test_debug_hides_card_data() {
        let card = CreditCard::new("4242424242424242", 3, 2031)
            .with_name("Longbob", "Longsen")
            .with_verification_value("123");
        let debug = format!("{card:?}");
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("123\""));
        assert!(debug.contains("XXXX-XXXX-XXXX-4242"));
        assert!(debug.contains("[FILTERED]"));
        assert!(debug.contains("Longbob Longsen"));
    }

    #[test]
    fn test_last_digits_respect_char_boundaries() {
        let mut card = CreditCard::new("4242424242424242", 3, 2031);
        card.number = "42424242424242é1".to_owned();
        assert_eq!(card.last_digits(), "42é1");
        assert!(format!("{card:?}").contains("XXXX-XXXX-XXXX-42é1"));

        card.number = "42".to_owned();
        assert_eq!(card.last_digits(), "42");
    }

    #[test]
    fn test_payment_method_variants() {
        let card: PaymentMethod = CreditCard::new("4242424242424242", 3, 2031).into();
        assert!(card.as_card().is_some());
        assert!(card.as_token().is_none());

        let token: PaymentMethod = "cus_123|card_456".into();
        assert_eq!(token.as_token(), Some("cus_123|card_456"));
        assert!(token.as_card().is_none());
    }
}
