//! The uniform gateway response.
//!
//! Every [`Gateway`](crate::Gateway) operation that reaches the processor
//! produces exactly one [`Response`]. It is built once via
//! [`Response::builder`] and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::error_code::ErrorCode;
use crate::params::Params;
use crate::verification::{AvsResult, CvvResult};

/// Normalized result of a single gateway operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    success: bool,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorization: Option<String>,
    #[serde(default)]
    params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avs_result: Option<AvsResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cvv_result: Option<CvvResult>,
    #[serde(default)]
    test: bool,
    #[serde(default)]
    fraud_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    network_transaction_id: Option<String>,
}

impl Response {
    /// Starts building a response with the given outcome and message.
    #[must_use]
    pub fn builder(success: bool, message: impl Into<String>) -> ResponseBuilder {
        ResponseBuilder {
            inner: Self {
                success,
                message: message.into(),
                authorization: None,
                params: Params::new(),
                error_code: None,
                avs_result: None,
                cvv_result: None,
                test: false,
                fraud_review: false,
                network_transaction_id: None,
            },
        }
    }

    /// Starts building a response from a classifier verdict.
    #[must_use]
    pub fn from_classification(classification: Classification) -> ResponseBuilder {
        let Classification {
            success,
            message,
            error_code,
        } = classification;
        let mut builder = Self::builder(success, message);
        builder.inner.error_code = error_code;
        builder
    }

    /// Whether the processor approved the operation.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Human-readable status text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Opaque reference for follow-up operations.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// The full gateway-native parsed reply.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Canonical failure reason, when classifiable.
    #[must_use]
    pub const fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    /// Address verification outcome, when the processor reported one.
    #[must_use]
    pub const fn avs_result(&self) -> Option<&AvsResult> {
        self.avs_result.as_ref()
    }

    /// Card-code verification outcome, when the processor reported one.
    #[must_use]
    pub const fn cvv_result(&self) -> Option<&CvvResult> {
        self.cvv_result.as_ref()
    }

    /// Whether the call ran against a sandbox environment.
    #[must_use]
    pub const fn is_test(&self) -> bool {
        self.test
    }

    /// Whether the processor held the transaction for manual review.
    #[must_use]
    pub const fn is_fraud_review(&self) -> bool {
        self.fraud_review
    }

    /// Network transaction id for stored-credential chains.
    #[must_use]
    pub fn network_transaction_id(&self) -> Option<&str> {
        self.network_transaction_id.as_deref()
    }
}

/// Builder for [`Response`]. Consumed by [`ResponseBuilder::build`].
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    inner: Response,
}

impl ResponseBuilder {
    /// Sets the authorization reference.
    #[must_use]
    pub fn authorization(mut self, authorization: impl Into<String>) -> Self {
        self.inner.authorization = Some(authorization.into());
        self
    }

    /// Sets the authorization reference when present and non-empty.
    #[must_use]
    pub fn maybe_authorization(mut self, authorization: Option<String>) -> Self {
        self.inner.authorization = authorization.filter(|a| !a.is_empty());
        self
    }

    /// Sets the parsed reply.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.inner.params = params;
        self
    }

    /// Sets the canonical error code.
    #[must_use]
    pub const fn error_code(mut self, error_code: Option<ErrorCode>) -> Self {
        self.inner.error_code = error_code;
        self
    }

    /// Sets the AVS result.
    #[must_use]
    pub fn avs_result(mut self, avs_result: Option<AvsResult>) -> Self {
        self.inner.avs_result = avs_result;
        self
    }

    /// Sets the CVV result.
    #[must_use]
    pub fn cvv_result(mut self, cvv_result: Option<CvvResult>) -> Self {
        self.inner.cvv_result = cvv_result;
        self
    }

    /// Marks the response as produced by a sandbox environment.
    #[must_use]
    pub const fn test(mut self, test: bool) -> Self {
        self.inner.test = test;
        self
    }

    /// Marks the transaction as held for review.
    #[must_use]
    pub const fn fraud_review(mut self, fraud_review: bool) -> Self {
        self.inner.fraud_review = fraud_review;
        self
    }

    /// Sets the network transaction id.
    #[must_use]
    pub fn network_transaction_id(mut self, id: Option<String>) -> Self {
        self.inner.network_transaction_id = id.filter(|id| !id.is_empty());
        self
    }

    /// Finishes the response.
    #[must_use]
    pub fn build(self) -> Response {
        self.inner
    }
}

/// Responses of a composite operation, such as `verify` (authorize then void).
///
/// The first response is the primary one: its outcome is the outcome of the
/// whole chain. Follow-up steps are recorded either as checked steps, which
/// fail the chain when they fail, or as ignored steps, whose outcome is kept
/// for inspection only.
#[derive(Debug, Clone)]
pub struct MultiResponse {
    primary: Response,
    steps: Vec<(Response, bool)>,
}

impl MultiResponse {
    /// Starts a chain with its primary response.
    #[must_use]
    pub const fn new(primary: Response) -> Self {
        Self {
            primary,
            steps: Vec::new(),
        }
    }

    /// Records a follow-up step whose failure fails the chain.
    pub fn process(&mut self, response: Response) -> &mut Self {
        self.steps.push((response, true));
        self
    }

    /// Records a follow-up step whose outcome does not affect the chain.
    pub fn process_ignoring_result(&mut self, response: Response) -> &mut Self {
        self.steps.push((response, false));
        self
    }

    /// Whether the chain as a whole succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.primary.is_success()
            && self
                .steps
                .iter()
                .all(|(response, checked)| !checked || response.is_success())
    }

    /// The primary response.
    #[must_use]
    pub const fn primary(&self) -> &Response {
        &self.primary
    }

    /// All responses in the order they were recorded, primary first.
    pub fn responses(&self) -> impl Iterator<Item = &Response> {
        std::iter::once(&self.primary).chain(self.steps.iter().map(|(r, _)| r))
    }

    /// Collapses the chain into a single response.
    ///
    /// Returns the primary response when the chain succeeded, otherwise the
    /// first failing checked step.
    #[must_use]
    pub fn into_response(self) -> Response {
        if !self.primary.is_success() {
            return self.primary;
        }
        let failed = self
            .steps
            .into_iter()
            .find(|(response, checked)| *checked && !response.is_success());
        match failed {
            Some((response, _)) => response,
            None => self.primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::params_from_pairs;

    fn approved(auth: &str) -> Response {
        Response::builder(true, "Approved")
            .authorization(auth)
            .params(params_from_pairs([("response", "1")]))
            .build()
    }

    fn declined(message: &str) -> Response {
        Response::builder(false, message)
            .error_code(Some(ErrorCode::CardDeclined))
            .build()
    }

    #[test]
    fn test_builder_sets_every_field() {
        let response = Response::builder(true, "Approved")
            .authorization("123#card")
            .params(params_from_pairs([("transactionid", "123")]))
            .avs_result(AvsResult::from_code("Y"))
            .cvv_result(CvvResult::from_code("M"))
            .test(true)
            .fraud_review(true)
            .network_transaction_id(Some("NTID-1".into()))
            .build();
        assert!(response.is_success());
        assert_eq!(response.authorization(), Some("123#card"));
        assert_eq!(response.params().len(), 1);
        assert_eq!(response.avs_result().unwrap().code, "Y");
        assert!(response.cvv_result().unwrap().is_match());
        assert!(response.is_test());
        assert!(response.is_fraud_review());
        assert_eq!(response.network_transaction_id(), Some("NTID-1"));
    }

    #[test]
    fn test_empty_optional_strings_are_absent() {
        let response = Response::builder(false, "Declined")
            .maybe_authorization(Some(String::new()))
            .network_transaction_id(Some(String::new()))
            .build();
        assert!(response.authorization().is_none());
        assert!(response.network_transaction_id().is_none());
    }

    #[test]
    fn test_from_classification_carries_error_code() {
        let response = Response::from_classification(Classification::failure(
            "Expired card",
            Some(ErrorCode::ExpiredCard),
        ))
        .build();
        assert!(!response.is_success());
        assert_eq!(response.message(), "Expired card");
        assert_eq!(response.error_code(), Some(ErrorCode::ExpiredCard));
    }

    #[test]
    fn test_serde_roundtrip_preserves_response() {
        let response = approved("ch_1");
        let json = serde_json::to_string(&response).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(response, back);
    }

    #[test]
    fn test_multi_response_ignored_step_does_not_fail_chain() {
        let mut multi = MultiResponse::new(approved("auth-1"));
        multi.process_ignoring_result(declined("Void failed"));
        assert!(multi.is_success());
        assert_eq!(multi.responses().count(), 2);
        let response = multi.into_response();
        assert!(response.is_success());
        assert_eq!(response.authorization(), Some("auth-1"));
    }

    #[test]
    fn test_multi_response_checked_step_fails_chain() {
        let mut multi = MultiResponse::new(approved("auth-1"));
        multi.process(declined("Capture failed"));
        assert!(!multi.is_success());
        let response = multi.into_response();
        assert_eq!(response.message(), "Capture failed");
    }

    #[test]
    fn test_multi_response_failed_primary_wins() {
        let mut multi = MultiResponse::new(declined("Do not honor"));
        multi.process(declined("later"));
        assert_eq!(multi.primary().message(), "Do not honor");
        assert_eq!(multi.into_response().message(), "Do not honor");
    }
}
