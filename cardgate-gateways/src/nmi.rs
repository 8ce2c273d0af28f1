//! NMI (Network Merchants) adapter.
//!
//! Every operation is a form-encoded `POST` to `/api/transact.php`, and the
//! reply is form-encoded too:
//!
//! ```text
//! response=1&responsetext=SUCCESS&authcode=123456&transactionid=7500213&avsresponse=Y&cvvresponse=M&response_code=100
//! ```
//!
//! `response` is `1` (approved), `2` (declined) or `3` (error);
//! `response_code` carries the detailed reason. Authorizations are
//! `transactionid#payment_type`. Cards are stored in the customer vault.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cardgate::classify::Signal;
use cardgate::config::GatewayConfigEntry;
use cardgate::options::{Initiator, ReasonType};
use cardgate::params::param_str;
use cardgate::{
    Amount, AvsResult, CardBrand, Classification, Classify, CvvResult, ErrorCode, ErrorCodeTable,
    FILTERED, Gateway, GatewayError, GatewayInfo, MoneyFormat, Options, Params, PaymentMethod,
    Precedence, Response, ScrubRule, Scrubber,
};
use cardgate_http::form::form_decode;
use cardgate_http::transport::endpoint;
use cardgate_http::{HttpRequest, Transport};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::support::{
    FormFields, log_outcome, malformed_authorization, require_authorization, split_authorization,
};

const DISPLAY_NAME: &str = "NMI";
const BASE_URL: &str = "https://secure.networkmerchants.com";
const TRANSACT_PATH: &str = "/api/transact.php";
const CARD_PAYMENT: &str = "creditcard";

static INFO: GatewayInfo = GatewayInfo {
    display_name: DISPLAY_NAME,
    homepage_url: "https://www.nmi.com/",
    supported_countries: &["US", "CA"],
    supported_brands: &[
        CardBrand::Visa,
        CardBrand::Master,
        CardBrand::AmericanExpress,
        CardBrand::Discover,
    ],
    default_currency: "USD",
    money_format: MoneyFormat::Dollars,
};

static RESPONSE_CODES: ErrorCodeTable = ErrorCodeTable::new(&[
    ("200", ErrorCode::CardDeclined),
    ("201", ErrorCode::CardDeclined),
    ("202", ErrorCode::CardDeclined),
    ("203", ErrorCode::CardDeclined),
    ("204", ErrorCode::UnsupportedFeature),
    ("220", ErrorCode::IncorrectNumber),
    ("221", ErrorCode::IncorrectNumber),
    ("222", ErrorCode::InvalidNumber),
    ("223", ErrorCode::ExpiredCard),
    ("224", ErrorCode::InvalidExpiryDate),
    ("225", ErrorCode::IncorrectCvc),
    ("226", ErrorCode::IncorrectPin),
    ("240", ErrorCode::CallIssuer),
    ("250", ErrorCode::PickupCard),
    ("251", ErrorCode::PickupCard),
    ("252", ErrorCode::PickupCard),
    ("253", ErrorCode::PickupCard),
    ("260", ErrorCode::CardDeclined),
    ("261", ErrorCode::CardDeclined),
    ("300", ErrorCode::ProcessingError),
    ("400", ErrorCode::ProcessingError),
    ("410", ErrorCode::ConfigError),
    ("411", ErrorCode::ConfigError),
    ("420", ErrorCode::ProcessingError),
    ("421", ErrorCode::ProcessingError),
    ("430", ErrorCode::ProcessingError),
    ("440", ErrorCode::ProcessingError),
    ("441", ErrorCode::ProcessingError),
    ("460", ErrorCode::UnsupportedFeature),
    ("461", ErrorCode::UnsupportedFeature),
]);

fn reply_message(params: &Params) -> String {
    param_str(params, "responsetext")
        .or_else(|| param_str(params, "error"))
        .unwrap_or_default()
        .trim()
        .to_owned()
}

fn response_signal(params: &Params) -> Option<Classification> {
    let code = param_str(params, "response_code").unwrap_or_default();
    Some(match param_str(params, "response")?.trim() {
        "1" => Classification::success("Succeeded"),
        "2" => Classification::failure(
            reply_message(params),
            RESPONSE_CODES.lookup(code).or(Some(ErrorCode::CardDeclined)),
        ),
        "3" => Classification::failure(
            reply_message(params),
            RESPONSE_CODES.lookup(code).or(Some(ErrorCode::ProcessingError)),
        ),
        other => Classification::unknown(other),
    })
}

fn response_code_signal(params: &Params) -> Option<Classification> {
    let code = param_str(params, "response_code")?.trim();
    Some(if code == "100" {
        Classification::success("Succeeded")
    } else {
        Classification::failure(reply_message(params), RESPONSE_CODES.lookup(code))
    })
}

static CLASSIFIER: Precedence = Precedence::new(&[
    Signal::new("response", response_signal),
    Signal::new("response_code", response_code_signal),
]);

/// Credentials and environment for [`Nmi`].
#[derive(Clone)]
pub struct NmiConfig {
    security_key: String,
    test: bool,
}

impl NmiConfig {
    /// Creates a live configuration.
    #[must_use]
    pub fn new(security_key: impl Into<String>) -> Self {
        Self {
            security_key: security_key.into(),
            test: false,
        }
    }

    /// Marks the account as a sandbox account.
    #[must_use]
    pub const fn with_test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }

    /// Whether the account is a sandbox account.
    #[must_use]
    pub const fn is_test(&self) -> bool {
        self.test
    }
}

impl fmt::Debug for NmiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NmiConfig")
            .field("security_key", &FILTERED)
            .field("test", &self.test)
            .finish()
    }
}

impl TryFrom<&GatewayConfigEntry> for NmiConfig {
    type Error = GatewayError;

    fn try_from(entry: &GatewayConfigEntry) -> Result<Self, Self::Error> {
        let security_key = entry.credentials.require("security_key")?;
        Ok(Self::new(security_key).with_test(entry.test))
    }
}

/// NMI gateway adapter.
#[derive(Debug)]
pub struct Nmi {
    config: NmiConfig,
    transport: Arc<dyn Transport>,
    scrubber: Scrubber,
}

impl Nmi {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the security key is empty.
    pub fn new(config: NmiConfig, transport: Arc<dyn Transport>) -> Result<Self, GatewayError> {
        if config.security_key.trim().is_empty() {
            return Err(GatewayError::config("NMI requires a security_key"));
        }
        Ok(Self {
            config,
            transport,
            scrubber: Scrubber::new(vec![
                ScrubRule::form_field("security_key"),
                ScrubRule::form_field("password"),
                ScrubRule::form_field("ccnumber"),
                ScrubRule::form_field("cvv"),
                ScrubRule::form_field("checkaccount"),
            ]),
        })
    }

    /// The adapter configuration.
    #[must_use]
    pub const fn config(&self) -> &NmiConfig {
        &self.config
    }

    fn fields(&self) -> FormFields {
        let mut fields = FormFields::new();
        fields.push("security_key", self.config.security_key.as_str());
        fields
    }

    fn transaction_fields(
        &self,
        kind: &'static str,
        amount: Amount,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> FormFields {
        let currency = options.currency_or(INFO.default_currency);
        let mut fields = self.fields();
        fields
            .push("type", kind)
            .push("amount", amount.format(INFO.money_format, currency))
            .push("currency", currency);
        add_payment_method(&mut fields, payment_method);
        add_invoice(&mut fields, options);
        add_address(&mut fields, options);
        add_stored_credential(&mut fields, options);
        fields
    }

    /// Builds a [`Response`] from a raw reply body.
    fn parse(&self, operation: &'static str, body: &str) -> Response {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed.starts_with('<') {
            return Response::from_classification(Classification::unparsable(DISPLAY_NAME, body))
                .test(self.config.test)
                .build();
        }

        let params = form_decode(trimmed);
        let authorization = if operation == "store" {
            param_str(&params, "customer_vault_id").map(str::to_owned)
        } else {
            param_str(&params, "transactionid")
                .filter(|id| !id.is_empty())
                .map(|id| format!("{id}#{CARD_PAYMENT}"))
        };
        let classification = require_authorization(
            DISPLAY_NAME,
            operation,
            CLASSIFIER.classify(&params),
            authorization.as_deref(),
        );
        let avs_result = param_str(&params, "avsresponse").and_then(AvsResult::from_code);
        let cvv_result = param_str(&params, "cvvresponse").and_then(CvvResult::from_code);

        Response::from_classification(classification)
            .maybe_authorization(authorization)
            .avs_result(avs_result)
            .cvv_result(cvv_result)
            .test(self.config.test)
            .params(params)
            .build()
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "cardgate.nmi.commit", skip_all, fields(operation = operation), err)
    )]
    async fn commit(
        &self,
        operation: &'static str,
        fields: FormFields,
    ) -> Result<Response, GatewayError> {
        let url = endpoint(BASE_URL, TRANSACT_PATH)?;
        let request = HttpRequest::post(url).form(fields.encode());
        let reply = self.transport.send(request).await?;
        let response = self.parse(operation, &reply.text());
        log_outcome(DISPLAY_NAME, operation, &response);
        Ok(response)
    }
}

fn add_payment_method(fields: &mut FormFields, payment_method: &PaymentMethod) {
    match payment_method {
        PaymentMethod::Card(card) => {
            fields
                .push("payment", CARD_PAYMENT)
                .push("ccnumber", card.number.as_str())
                .push("ccexp", card.expiry_mmyy())
                .push_opt("cvv", card.verification_value.as_deref())
                .push_opt("first_name", Some(card.first_name.as_str()))
                .push_opt("last_name", Some(card.last_name.as_str()));
        }
        PaymentMethod::Token(token) => {
            fields.push("customer_vault_id", token.as_str());
        }
    }
}

fn add_invoice(fields: &mut FormFields, options: &Options) {
    fields
        .push_opt("orderid", options.order_id.as_deref())
        .push_opt("order_description", options.description.as_deref())
        .push_opt("ipaddress", options.ip.as_deref())
        .push_opt("email", options.email.as_deref())
        .push_opt("descriptor", options.soft_descriptor.as_deref());
}

fn add_address(fields: &mut FormFields, options: &Options) {
    let Some(address) = &options.billing_address else {
        return;
    };
    fields
        .push_opt("company", address.company.as_deref())
        .push_opt("address1", address.address1.as_deref())
        .push_opt("address2", address.address2.as_deref())
        .push_opt("city", address.city.as_deref())
        .push_opt("state", address.state.as_deref())
        .push_opt("zip", address.zip.as_deref())
        .push_opt("country", address.country.as_deref())
        .push_opt("phone", address.phone.as_deref());
}

fn add_stored_credential(fields: &mut FormFields, options: &Options) {
    let Some(stored) = &options.stored_credential else {
        return;
    };
    fields.push(
        "initiated_by",
        match stored.initiator {
            Initiator::Cardholder => "customer",
            Initiator::Merchant => "merchant",
        },
    );
    fields.push(
        "stored_credential_indicator",
        if stored.initial_transaction {
            "stored"
        } else {
            "used"
        },
    );
    match stored.reason_type {
        ReasonType::Recurring => {
            fields.push("billing_method", "recurring");
        }
        ReasonType::Installment => {
            fields.push("billing_method", "installment");
        }
        ReasonType::Unscheduled => {}
    }
    if !stored.initial_transaction {
        fields.push_opt(
            "initial_transaction_id",
            stored.network_transaction_id.as_deref(),
        );
    }
}

/// Splits `transactionid#payment_type`; a bare transaction id is a card transaction.
fn parse_authorization(authorization: &str) -> Option<(&str, &str)> {
    let authorization = authorization.trim();
    if authorization.contains('#') {
        return split_authorization(authorization, '#');
    }
    (!authorization.is_empty()).then_some((authorization, CARD_PAYMENT))
}

#[async_trait]
impl Gateway for Nmi {
    fn info(&self) -> &GatewayInfo {
        &INFO
    }

    async fn purchase(
        &self,
        amount: Amount,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let fields = self.transaction_fields("sale", amount, payment_method, options);
        self.commit("purchase", fields).await
    }

    async fn authorize(
        &self,
        amount: Amount,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let fields = self.transaction_fields("auth", amount, payment_method, options);
        self.commit("authorize", fields).await
    }

    async fn capture(
        &self,
        amount: Amount,
        authorization: &str,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let Some((transaction_id, payment_type)) = parse_authorization(authorization) else {
            return Ok(malformed_authorization(DISPLAY_NAME, authorization));
        };
        let currency = options.currency_or(INFO.default_currency);
        let mut fields = self.fields();
        fields
            .push("type", "capture")
            .push("transactionid", transaction_id)
            .push("payment", payment_type)
            .push("amount", amount.format(INFO.money_format, currency))
            .push_opt("orderid", options.order_id.as_deref());
        self.commit("capture", fields).await
    }

    async fn refund(
        &self,
        amount: Amount,
        authorization: &str,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let Some((transaction_id, payment_type)) = parse_authorization(authorization) else {
            return Ok(malformed_authorization(DISPLAY_NAME, authorization));
        };
        let currency = options.currency_or(INFO.default_currency);
        let mut fields = self.fields();
        fields
            .push("type", "refund")
            .push("transactionid", transaction_id)
            .push("payment", payment_type)
            .push("amount", amount.format(INFO.money_format, currency));
        self.commit("refund", fields).await
    }

    async fn void(
        &self,
        authorization: &str,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let Some((transaction_id, payment_type)) = parse_authorization(authorization) else {
            return Ok(malformed_authorization(DISPLAY_NAME, authorization));
        };
        let mut fields = self.fields();
        fields
            .push("type", "void")
            .push("transactionid", transaction_id)
            .push("payment", payment_type)
            .push_opt("void_reason", options.extra.get("void_reason").map(String::as_str));
        self.commit("void", fields).await
    }

    async fn store(
        &self,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        if payment_method.as_card().is_none() {
            return Err(GatewayError::InvalidPaymentMethod(
                "NMI can only store card data".to_owned(),
            ));
        }
        let mut fields = self.fields();
        fields.push("customer_vault", "add_customer");
        add_payment_method(&mut fields, payment_method);
        add_invoice(&mut fields, options);
        add_address(&mut fields, options);
        self.commit("store", fields).await
    }

    async fn unstore(&self, token: &str, _options: &Options) -> Result<Response, GatewayError> {
        let mut fields = self.fields();
        fields
            .push("customer_vault", "delete_customer")
            .push("customer_vault_id", token);
        self.commit("unstore", fields).await
    }

    fn scrubber(&self) -> &Scrubber {
        &self.scrubber
    }
}
