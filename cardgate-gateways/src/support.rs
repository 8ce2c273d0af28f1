//! Helpers shared by the adapters.

use cardgate::{Classification, ErrorCode, Response};
use cardgate_http::form::form_encode;

/// Ordered form fields for a request body.
#[derive(Debug, Default)]
pub(crate) struct FormFields(Vec<(&'static str, String)>);

impl FormFields {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: &'static str, value: impl Into<String>) -> &mut Self {
        self.0.push((key, value.into()));
        self
    }

    /// Pushes the field only when the value is present and non-empty.
    pub(crate) fn push_opt(&mut self, key: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.0.push((key, value.to_owned()));
        }
        self
    }

    pub(crate) fn encode(&self) -> String {
        form_encode(self.0.iter().map(|(k, v)| (*k, v.as_str())))
    }
}

/// Splits a composite authorization `first<sep>second`.
///
/// Returns `None` when the separator is missing or either part is empty.
pub(crate) fn split_authorization(authorization: &str, separator: char) -> Option<(&str, &str)> {
    let (first, second) = authorization.split_once(separator)?;
    let (first, second) = (first.trim(), second.trim());
    (!first.is_empty() && !second.is_empty()).then_some((first, second))
}

/// The failure returned, without a network call, for an authorization the
/// adapter could not have issued.
pub(crate) fn malformed_authorization(gateway: &str, authorization: &str) -> Response {
    Response::from_classification(Classification::failure(
        format!("{gateway} cannot act on authorization {authorization:?}: unrecognized format"),
        Some(ErrorCode::ProcessingError),
    ))
    .build()
}

/// Operations whose approval must hand back an authorization.
const AUTHORIZING_OPERATIONS: [&str; 3] = ["purchase", "authorize", "store"];

/// Demotes an approval that carries no authorization to a failure.
///
/// Later operations need the authorization to find the transaction, so an
/// approved purchase, authorize or store without one cannot be used.
pub(crate) fn require_authorization(
    gateway: &str,
    operation: &str,
    classification: Classification,
    authorization: Option<&str>,
) -> Classification {
    if classification.success
        && authorization.is_none_or(str::is_empty)
        && AUTHORIZING_OPERATIONS.contains(&operation)
    {
        return Classification::failure(
            format!("{gateway} approved the {operation} but returned no authorization"),
            None,
        );
    }
    classification
}

/// Logs the outcome of an operation.
#[cfg(feature = "telemetry")]
pub(crate) fn log_outcome(gateway: &str, operation: &str, response: &Response) {
    tracing::debug!(
        gateway,
        operation,
        success = response.is_success(),
        error_code = response.error_code().map(ErrorCode::as_str),
        test = response.is_test(),
        "gateway operation completed"
    );
}

/// Logs the outcome of an operation. Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
pub(crate) const fn log_outcome(_gateway: &str, _operation: &str, _response: &Response) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_skip_empty_optionals() {
        let mut fields = FormFields::new();
        fields
            .push("type", "sale")
            .push_opt("orderid", None)
            .push_opt("email", Some(""))
            .push_opt("city", Some("Ottawa"));
        assert_eq!(fields.encode(), "type=sale&city=Ottawa");
    }

    #[test]
    fn test_split_authorization() {
        assert_eq!(
            split_authorization("7500213#creditcard", '#'),
            Some(("7500213", "creditcard"))
        );
        assert_eq!(split_authorization("58-0_3;1026.1", ';'), Some(("58-0_3", "1026.1")));
        assert_eq!(split_authorization("7500213", '#'), None);
        assert_eq!(split_authorization("#creditcard", '#'), None);
        assert_eq!(split_authorization("", ';'), None);
    }

    #[test]
    fn test_approval_without_authorization_fails() {
        let approved = Classification::success("SUCCESS");

        let demoted = require_authorization("NMI", "purchase", approved.clone(), None);
        assert!(!demoted.success);
        assert_eq!(demoted.error_code, None);
        assert_eq!(demoted.message, "NMI approved the purchase but returned no authorization");
        assert!(!require_authorization("NMI", "authorize", approved.clone(), Some("")).success);

        assert_eq!(
            require_authorization("NMI", "purchase", approved.clone(), Some("7500213#creditcard")),
            approved
        );
        assert_eq!(require_authorization("NMI", "unstore", approved.clone(), None), approved);

        let declined = Classification::failure("DECLINE", Some(ErrorCode::CardDeclined));
        assert_eq!(require_authorization("NMI", "purchase", declined.clone(), None), declined);
    }

    #[test]
    fn test_malformed_authorization_is_processing_error() {
        let response = malformed_authorization("Moneris", "garbage");
        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some(ErrorCode::ProcessingError));
        assert!(response.message().contains("garbage"));
    }
}
