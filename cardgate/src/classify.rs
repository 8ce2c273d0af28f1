//! Result classification.
//!
//! Every adapter owns a private classifier that maps its processor's native
//! status vocabulary onto a [`Classification`]. The shared contract:
//!
//! - **Total**: every reply classifies. Unknown statuses become failures with
//!   no error code and a message naming the anomaly ([`Classification::unknown`]).
//! - **Pure**: a classifier only reads the parsed [`Params`]; it performs no I/O.
//! - **Deterministic precedence**: when a reply carries several status signals,
//!   the adapter declares their order with a [`Precedence`] list. The first
//!   signal that reaches a verdict wins, independent of map iteration order.

use crate::error_code::ErrorCode;
use crate::params::Params;

/// Maximum number of characters of a raw reply quoted in diagnostic messages.
const RAW_EXCERPT_LIMIT: usize = 256;

/// The normalized verdict for a single processor reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Whether the processor approved the operation.
    pub success: bool,
    /// Human-readable status text.
    pub message: String,
    /// Canonical failure reason, when one applies.
    pub error_code: Option<ErrorCode>,
}

impl Classification {
    /// An approved operation.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_code: None,
        }
    }

    /// A failed operation with an optional canonical reason.
    #[must_use]
    pub fn failure(message: impl Into<String>, error_code: Option<ErrorCode>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code,
        }
    }

    /// A reply whose status value the adapter does not recognize.
    #[must_use]
    pub fn unknown(status: &str) -> Self {
        Self::failure(format!("Unrecognized response status: {status:?}"), None)
    }

    /// A reply that carries none of the adapter's status signals.
    #[must_use]
    pub fn no_status() -> Self {
        Self::failure("Unable to classify response: no status field present", None)
    }

    /// A reply body that is not valid JSON.
    #[must_use]
    pub fn invalid_json(gateway: &str, raw: &str) -> Self {
        Self::failure(
            format!(
                "Invalid JSON response received from {gateway}. Please contact {gateway} if you \
                 continue to receive this message. (The raw response returned by the API was {:?})",
                excerpt(raw)
            ),
            None,
        )
    }

    /// A reply body that could not be parsed in the adapter's wire format.
    #[must_use]
    pub fn unparsable(gateway: &str, raw: &str) -> Self {
        Self::failure(
            format!(
                "Unparsable response received from {gateway}. Please contact {gateway} if you \
                 continue to receive this message. (The raw response returned by the API was {:?})",
                excerpt(raw)
            ),
            None,
        )
    }
}

fn excerpt(raw: &str) -> &str {
    match raw.char_indices().nth(RAW_EXCERPT_LIMIT) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

/// A pure mapping from a parsed reply to a [`Classification`].
pub trait Classify {
    /// Classifies the reply. Must not panic on any input.
    fn classify(&self, params: &Params) -> Classification;
}

impl<F> Classify for F
where
    F: Fn(&Params) -> Classification,
{
    fn classify(&self, params: &Params) -> Classification {
        self(params)
    }
}

/// One named status signal inside a [`Precedence`] list.
///
/// The evaluator returns `None` when the signal is absent or undecided, which
/// passes control to the next signal.
#[derive(Debug, Clone, Copy)]
pub struct Signal {
    /// Short name, used in logs.
    pub name: &'static str,
    /// Evaluates the signal against the reply.
    pub evaluate: fn(&Params) -> Option<Classification>,
}

impl Signal {
    /// Creates a named signal.
    #[must_use]
    pub const fn new(name: &'static str, evaluate: fn(&Params) -> Option<Classification>) -> Self {
        Self { name, evaluate }
    }
}

/// An adapter-declared, ordered list of status signals.
///
/// ```rust
/// use cardgate::classify::{Classification, Classify, Precedence, Signal};
/// use cardgate::params::{Params, param_str};
///
/// fn risk(params: &Params) -> Option<Classification> {
///     (param_str(params, "risk")? == "high")
///         .then(|| Classification::failure("Held for review", None))
/// }
///
/// fn status(params: &Params) -> Option<Classification> {
///     match param_str(params, "status")? {
///         "ok" => Some(Classification::success("Approved")),
///         other => Some(Classification::unknown(other)),
///     }
/// }
///
/// static RULES: Precedence = Precedence::new(&[
///     Signal::new("risk", risk),
///     Signal::new("status", status),
/// ]);
///
/// let params: Params = serde_json::from_str(r#"{"status":"ok","risk":"high"}"#).unwrap();
/// assert!(!RULES.classify(&params).success);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Precedence {
    signals: &'static [Signal],
}

impl Precedence {
    /// Wraps an ordered slice of signals; earlier entries take precedence.
    #[must_use]
    pub const fn new(signals: &'static [Signal]) -> Self {
        Self { signals }
    }

    /// Returns the name of the signal that decides this reply, if any.
    #[must_use]
    pub fn deciding_signal(&self, params: &Params) -> Option<&'static str> {
        self.signals
            .iter()
            .find(|signal| (signal.evaluate)(params).is_some())
            .map(|signal| signal.name)
    }
}

impl Classify for Precedence {
    fn classify(&self, params: &Params) -> Classification {
        self.signals
            .iter()
            .find_map(|signal| (signal.evaluate)(params))
            .unwrap_or_else(Classification::no_status)
    }
}
