//! Transcript redaction.
//!
//! A transcript is the raw wire log of one or more gateway calls: connection
//! lines plus escaped request and response bodies, e.g.
//!
//! ```text
//! opening connection to secure.nmi.com:443...
//! <- "POST /api/transact.php HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\n\r\n"
//! <- "type=sale&ccnumber=4111111111111111&cvv=999"
//! -> "response=1&responsetext=SUCCESS"
//! ```
//!
//! Each adapter declares a [`Scrubber`]: an ordered list of [`ScrubRule`]s.
//! Every rule is a regular expression whose named capture group `value`
//! marks the sensitive span; the span is replaced by [`FILTERED`] and the
//! surrounding text is left byte-for-byte intact.
//!
//! Scrubbing never fails. Running it twice yields the same text as running
//! it once, because every rule also matches its own redacted output and
//! replaces it with the same marker.

use std::borrow::Cow;

use regex::Regex;

use crate::error::GatewayError;

/// Replacement marker for redacted values.
pub const FILTERED: &str = "[FILTERED]";

/// Name of the capture group every rule must define.
const VALUE_GROUP: &str = "value";

/// Capture group used when a JSON string sits inside an escaped transcript line.
const ESCAPED_VALUE_GROUP: &str = "escaped_value";

/// What may precede a form field name in a transcript, including the escaped
/// `\n` that ends the header block on the request line.
const FIELD_BOUNDARY: &str = r#"(?:^|\\n|[&?\s"'])"#;

/// Body of a JSON string whose quotes and backslashes were escaped again by
/// the transcript: `\"` closes it, `\\\"` and `\\\\` are escapes inside it.
const ESCAPED_JSON_BODY: &str = r#"(?:[^"\\]|\\[^"\\]|\\\\(?:\\["\\]|[^"\\]))+"#;

/// A single redaction rule.
#[derive(Debug, Clone)]
pub struct ScrubRule {
    regex: Regex,
}

impl ScrubRule {
    /// Redacts the value of a form-encoded field: `name=value`.
    ///
    /// The value ends at `&`, whitespace, a quote, or a backslash (the start
    /// of an escaped `\r\n` in a transcript line). Empty values are left
    /// empty.
    #[must_use]
    pub fn form_field(name: &str) -> Self {
        Self::literal(&format!(
            r#"{FIELD_BOUNDARY}{}=(?P<value>[^&\s"'\\]+)"#,
            regex::escape(name)
        ))
    }

    /// Redacts a JSON string member: `"name":"value"`.
    ///
    /// The member may appear raw or escaped (`\"name\":\"value\"`), as it
    /// does inside a transcript body. Escaped quotes within the value are
    /// redacted with it.
    #[must_use]
    pub fn json_string(name: &str) -> Self {
        let name = regex::escape(name);
        Self::literal(&format!(
            r#"\\"{name}\\"\s*:\s*\\"(?P<{ESCAPED_VALUE_GROUP}>{ESCAPED_JSON_BODY})\\"|"{name}"\s*:\s*"(?P<{VALUE_GROUP}>(?:[^"\\]|\\.)+)""#
        ))
    }

    /// Redacts a JSON number member: `"name":1234`.
    #[must_use]
    pub fn json_number(name: &str) -> Self {
        Self::literal(&format!(
            r#"\\?"{}\\?"\s*:\s*(?P<value>-?\d+(?:\.\d+)?)"#,
            regex::escape(name)
        ))
    }

    /// Redacts the text content of an XML element: `<name>value</name>`.
    #[must_use]
    pub fn xml_element(name: &str) -> Self {
        let name = regex::escape(name);
        Self::literal(&format!(r"<{name}(?:\s[^>]*)?>(?P<value>[^<]+)</{name}>"))
    }

    /// Redacts an XML attribute value: `name="value"`.
    #[must_use]
    pub fn xml_attribute(name: &str) -> Self {
        Self::literal(&format!(
            r#"\s{}\s*=\s*\\?"(?P<value>[^"\\]+)\\?""#,
            regex::escape(name)
        ))
    }

    /// Redacts an HTTP header value, matching the header name case-insensitively.
    ///
    /// The value ends at the line break, which inside a transcript body is
    /// the escaped `\r\n` sequence.
    #[must_use]
    pub fn header(name: &str) -> Self {
        Self::literal(&format!(
            r#"(?:^|\\n|[\s"])(?i:{}):[ \t]*(?P<value>[^\r\n"\\]+)"#,
            regex::escape(name)
        ))
    }

    /// Compiles a caller-supplied pattern.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the pattern does not compile or
    /// has no capture group named `value`.
    pub fn custom(pattern: &str) -> Result<Self, GatewayError> {
        let regex = Regex::new(pattern)
            .map_err(|e| GatewayError::config(format!("invalid scrub pattern: {e}")))?;
        if !regex
            .capture_names()
            .any(|name| name == Some(VALUE_GROUP))
        {
            return Err(GatewayError::config(format!(
                "scrub pattern {pattern:?} has no `value` capture group"
            )));
        }
        Ok(Self { regex })
    }

    fn literal(pattern: &str) -> Self {
        Self {
            regex: Regex::new(pattern).expect("escaped scrub pattern"),
        }
    }

    /// The compiled pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        // `json_string` names its group by context; only one takes part per match.
        let mut out = String::new();
        let mut last = 0;
        let mut matched = false;
        for caps in self.regex.captures_iter(text) {
            let Some(value) = caps
                .name(VALUE_GROUP)
                .or_else(|| caps.name(ESCAPED_VALUE_GROUP))
            else {
                continue;
            };
            out.push_str(&text[last..value.start()]);
            out.push_str(FILTERED);
            last = value.end();
            matched = true;
        }
        if !matched {
            return Cow::Borrowed(text);
        }
        out.push_str(&text[last..]);
        Cow::Owned(out)
    }
}

/// An ordered set of redaction rules.
///
/// ```rust
/// use cardgate::{ScrubRule, Scrubber};
///
/// let scrubber = Scrubber::new(vec![ScrubRule::form_field("cardnumber")]);
/// assert_eq!(
///     scrubber.scrub("cardnumber=4000100011112224&city=Ottawa"),
///     "cardnumber=[FILTERED]&city=Ottawa"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scrubber {
    rules: Vec<ScrubRule>,
}

impl Scrubber {
    /// Creates a scrubber applying `rules` in order.
    #[must_use]
    pub const fn new(rules: Vec<ScrubRule>) -> Self {
        Self { rules }
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: ScrubRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Whether no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The configured rules, in application order.
    #[must_use]
    pub fn rules(&self) -> &[ScrubRule] {
        &self.rules
    }

    /// Redacts every configured value in `transcript`.
    #[must_use]
    pub fn scrub(&self, transcript: &str) -> String {
        let mut text = transcript.to_owned();
        for rule in &self.rules {
            let scrubbed = match rule.apply(&text) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(scrubbed) => scrubbed,
            };
            text = scrubbed;
        }
        text
    }

    /// Redacts a transcript given as raw bytes.
    ///
    /// Invalid UTF-8 sequences are replaced by U+FFFD before the rules run.
    #[must_use]
    pub fn scrub_bytes(&self, transcript: &[u8]) -> String {
        self.scrub(&String::from_utf8_lossy(transcript))
    }
}
