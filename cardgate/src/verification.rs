//! Address (AVS) and card-code (CVV) verification results.
//!
//! Processors report verification outcomes as single-letter codes drawn from
//! the card networks' shared vocabulary. Adapters translate their native
//! codes into these letters and the types below attach the standard
//! human-readable meaning.

use serde::{Deserialize, Serialize};

/// Outcome of comparing one address component with the issuer's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Match {
    /// The component matched.
    Yes,
    /// The component did not match.
    No,
    /// The issuer does not support the check.
    Unsupported,
}

/// Normalized address verification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvsResult {
    /// Network AVS code (uppercase letter).
    pub code: String,
    /// Standard meaning of the code, absent for unknown codes.
    pub message: Option<String>,
    /// Whether the street address matched, when the code says so.
    pub street_match: Option<Match>,
    /// Whether the postal code matched, when the code says so.
    pub postal_match: Option<Match>,
}

const AVS_MESSAGES: &[(char, &str)] = &[
    ('A', "Street address matches, but postal code does not match."),
    ('B', "Street address matches, but postal code not verified."),
    ('C', "Street address and postal code do not match."),
    ('D', "Street address and postal code match."),
    ('E', "AVS data is invalid or AVS is not allowed for this card type."),
    ('F', "Card member's name does not match, but billing postal code matches."),
    ('G', "Non-U.S. issuing bank does not support AVS."),
    ('H', "Card member's name does not match. Street address and postal code match."),
    ('I', "Address not verified."),
    ('J', "Card member's name, billing address, and postal code match. Shipping information verified and chargeback protection guaranteed through the Fraud Protection Program."),
    ('K', "Card member's name matches but billing address and billing postal code do not match."),
    ('L', "Card member's name and billing postal code match, but billing address does not match."),
    ('M', "Street address and postal code match."),
    ('N', "Street address and postal code do not match."),
    ('O', "Card member's name and billing address match, but billing postal code does not match."),
    ('P', "Postal code matches, but street address not verified."),
    ('Q', "Card member's name, billing address, and postal code match. Shipping information verified but chargeback protection not guaranteed."),
    ('R', "System unavailable."),
    ('S', "U.S.-issuing bank does not support AVS."),
    ('T', "Card member's name does not match, but street address matches."),
    ('U', "Address information unavailable."),
    ('V', "Card member's name, billing address, and billing postal code match."),
    ('W', "Street address does not match, but 9-digit postal code matches."),
    ('X', "Street address and 9-digit postal code match."),
    ('Y', "Street address and 5-digit postal code match."),
    ('Z', "Street address does not match, but 5-digit postal code matches."),
];

const POSTAL_YES: &str = "DHFJLMPQVWXYZ";
const POSTAL_NO: &str = "ACKNO";
const STREET_YES: &str = "ABDHJMOQTVXY";
const STREET_NO: &str = "CKLNWZ";
const UNSUPPORTED: &str = "GS";

fn classify_match(code: char, yes: &str, no: &str) -> Option<Match> {
    if yes.contains(code) {
        Some(Match::Yes)
    } else if no.contains(code) {
        Some(Match::No)
    } else if UNSUPPORTED.contains(code) {
        Some(Match::Unsupported)
    } else {
        None
    }
}

impl AvsResult {
    /// Builds a result from a network AVS code.
    ///
    /// Returns `None` for an empty code so adapters can pass processor fields
    /// through without pre-checking them.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_uppercase();
        let letter = code.chars().next()?;
        let message = AVS_MESSAGES
            .iter()
            .find(|(c, _)| *c == letter)
            .map(|(_, m)| (*m).to_owned());
        let (street_match, postal_match) = if code.len() == 1 {
            (
                classify_match(letter, STREET_YES, STREET_NO),
                classify_match(letter, POSTAL_YES, POSTAL_NO),
            )
        } else {
            (None, None)
        };
        Some(Self {
            code,
            message,
            street_match,
            postal_match,
        })
    }
}

/// Normalized card verification value result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvvResult {
    /// Network CVV code (uppercase letter).
    pub code: String,
    /// Standard meaning of the code, absent for unknown codes.
    pub message: Option<String>,
}

const CVV_MESSAGES: &[(&str, &str)] = &[
    ("D", "CVV check flagged transaction as suspicious"),
    ("I", "CVV failed data validation check"),
    ("M", "CVV matches"),
    ("N", "CVV does not match"),
    ("P", "CVV not processed"),
    ("S", "CVV should have been present"),
    ("U", "CVV request unable to be processed by issuer"),
    ("X", "Card does not support CVV"),
];

impl CvvResult {
    /// Builds a result from a network CVV code. Empty codes yield `None`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return None;
        }
        let message = CVV_MESSAGES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, m)| (*m).to_owned());
        Some(Self { code, message })
    }

    /// Whether the processor reported a match.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.code == "M"
    }
}
