//! Moneris eSELECTplus adapter (Canada).
//!
//! Requests are XML documents posted to the `MpgRequest` servlet:
//!
//! ```text
//! <?xml version="1.0"?>
//! <request>
//!   <store_id>store1</store_id>
//!   <api_token>yesguy</api_token>
//!   <purchase><order_id>1026</order_id><amount>1.00</amount><pan>...</pan>...</purchase>
//! </request>
//! ```
//!
//! The reply is a `<response><receipt>...</receipt></response>` document.
//! Authorizations are `TransID;ReceiptId`; stored cards are vault data keys.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cardgate::classify::Signal;
use cardgate::config::GatewayConfigEntry;
use cardgate::options::{Initiator, ReasonType};
use cardgate::params::{param_str, params_from_value};
use cardgate::{
    Amount, AvsResult, CardBrand, Classification, Classify, CreditCard, CvvResult, ErrorCode,
    ErrorCodeTable, FILTERED, Gateway, GatewayError, GatewayInfo, MoneyFormat, Options, Params,
    PaymentMethod, Precedence, Response, ScrubRule, Scrubber,
};
use cardgate_http::transport::endpoint;
use cardgate_http::{HttpRequest, Transport};
use http::HeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::support::{
    log_outcome, malformed_authorization, require_authorization, split_authorization,
};

const DISPLAY_NAME: &str = "Moneris";
const TEST_URL: &str = "https://esqa.moneris.com";
const LIVE_URL: &str = "https://www3.moneris.com";
const REQUEST_PATH: &str = "/gateway2/servlet/MpgRequest";
const XML_DECLARATION: &str = r#"<?xml version="1.0"?>"#;

/// SSL-enabled merchant, the e-commerce indicator for card-not-present.
const CRYPT_TYPE: u8 = 7;

static INFO: GatewayInfo = GatewayInfo {
    display_name: DISPLAY_NAME,
    homepage_url: "https://www.moneris.com/",
    supported_countries: &["CA"],
    supported_brands: &[
        CardBrand::Visa,
        CardBrand::Master,
        CardBrand::AmericanExpress,
        CardBrand::DinersClub,
        CardBrand::Discover,
    ],
    default_currency: "CAD",
    money_format: MoneyFormat::Dollars,
};

static RESPONSE_CODES: ErrorCodeTable = ErrorCodeTable::new(&[
    ("050", ErrorCode::CardDeclined),
    ("051", ErrorCode::ExpiredCard),
    ("052", ErrorCode::IncorrectPin),
    ("057", ErrorCode::PickupCard),
    ("059", ErrorCode::CardDeclined),
    ("073", ErrorCode::InvalidNumber),
    ("074", ErrorCode::CardDeclined),
    ("076", ErrorCode::ProcessingError),
    ("475", ErrorCode::InvalidExpiryDate),
    ("476", ErrorCode::CardDeclined),
    ("477", ErrorCode::IncorrectNumber),
    ("479", ErrorCode::PickupCard),
    ("481", ErrorCode::CardDeclined),
    ("482", ErrorCode::ExpiredCard),
    ("483", ErrorCode::CallIssuer),
    ("486", ErrorCode::IncorrectCvc),
    ("487", ErrorCode::IncorrectCvc),
    ("489", ErrorCode::IncorrectCvc),
    ("490", ErrorCode::IncorrectCvc),
]);

fn reply_message(params: &Params) -> String {
    param_str(params, "Message")
        .unwrap_or_default()
        .trim()
        .to_owned()
}

fn timed_out_signal(params: &Params) -> Option<Classification> {
    (param_str(params, "TimedOut")? == "true").then(|| {
        let message = reply_message(params);
        Classification::failure(
            if message.is_empty() {
                "Timed out".to_owned()
            } else {
                message
            },
            Some(ErrorCode::ProcessingError),
        )
    })
}

fn response_code_signal(params: &Params) -> Option<Classification> {
    let code = param_str(params, "ResponseCode")?.trim();
    Some(match code.parse::<u16>() {
        Ok(value) if value < 50 => Classification::success(reply_message(params)),
        Ok(_) => Classification::failure(
            reply_message(params),
            RESPONSE_CODES.lookup(code).or(Some(ErrorCode::CardDeclined)),
        ),
        Err(_) => Classification::unknown(code),
    })
}

fn res_success_signal(params: &Params) -> Option<Classification> {
    Some(match param_str(params, "ResSuccess")? {
        "true" => Classification::success(reply_message(params)),
        "false" => {
            Classification::failure(reply_message(params), Some(ErrorCode::ProcessingError))
        }
        other => Classification::unknown(other),
    })
}

/// A null `ResponseCode` with a message is how the gateway rejects a request.
fn message_signal(params: &Params) -> Option<Classification> {
    param_str(params, "Message")?;
    Some(Classification::failure(
        reply_message(params),
        Some(ErrorCode::ProcessingError),
    ))
}

static CLASSIFIER: Precedence = Precedence::new(&[
    Signal::new("TimedOut", timed_out_signal),
    Signal::new("ResponseCode", response_code_signal),
    Signal::new("ResSuccess", res_success_signal),
    Signal::new("Message", message_signal),
]);

#[derive(Debug, Serialize)]
struct MpgRequest<'a> {
    store_id: &'a str,
    api_token: &'a str,
    #[serde(rename = "$value")]
    transaction: Transaction<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Transaction<'a> {
    Purchase(CardTransaction<'a>),
    Preauth(CardTransaction<'a>),
    ResPurchaseCc(VaultTransaction<'a>),
    ResPreauthCc(VaultTransaction<'a>),
    Completion(FollowOn<'a>),
    Refund(FollowOn<'a>),
    #[serde(rename = "purchasecorrection")]
    PurchaseCorrection(FollowOn<'a>),
    ResAddCc(AddCard<'a>),
    ResDelete(DeleteCard<'a>),
}

#[derive(Debug, Serialize)]
struct CardTransaction<'a> {
    order_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cust_id: Option<&'a str>,
    amount: String,
    pan: &'a str,
    expdate: String,
    crypt_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    dynamic_descriptor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cvd_info: Option<CvdInfo<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avs_info: Option<AvsInfo<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cof_info: Option<CofInfo<'a>>,
}

#[derive(Debug, Serialize)]
struct VaultTransaction<'a> {
    data_key: &'a str,
    order_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cust_id: Option<&'a str>,
    amount: String,
    crypt_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    dynamic_descriptor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cof_info: Option<CofInfo<'a>>,
}

#[derive(Debug, Serialize)]
struct FollowOn<'a> {
    order_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comp_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<String>,
    txn_number: &'a str,
    crypt_type: u8,
}

#[derive(Debug, Serialize)]
struct AddCard<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    cust_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    pan: &'a str,
    expdate: String,
    crypt_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    avs_info: Option<AvsInfo<'a>>,
}

#[derive(Debug, Serialize)]
struct DeleteCard<'a> {
    data_key: &'a str,
}

#[derive(Debug, Serialize)]
struct CvdInfo<'a> {
    cvd_indicator: u8,
    cvd_value: &'a str,
}

#[derive(Debug, Serialize)]
struct AvsInfo<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    avs_street_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avs_street_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avs_zipcode: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CofInfo<'a> {
    payment_indicator: &'static str,
    payment_information: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    issuer_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct MpgReply {
    receipt: Receipt,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Receipt {
    receipt_id: Option<String>,
    reference_num: Option<String>,
    response_code: Option<String>,
    #[serde(rename = "ISO")]
    iso: Option<String>,
    auth_code: Option<String>,
    trans_time: Option<String>,
    trans_date: Option<String>,
    trans_type: Option<String>,
    complete: Option<String>,
    message: Option<String>,
    trans_amount: Option<String>,
    card_type: Option<String>,
    #[serde(rename = "TransID")]
    trans_id: Option<String>,
    timed_out: Option<String>,
    avs_result_code: Option<String>,
    cvd_result_code: Option<String>,
    issuer_id: Option<String>,
    data_key: Option<String>,
    res_success: Option<String>,
}

impl Receipt {
    /// The receipt as [`Params`], without the gateway's `null` placeholders.
    fn into_params(self) -> Params {
        serde_json::to_value(self)
            .ok()
            .and_then(params_from_value)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| {
                let text = value.as_str()?.trim();
                (!text.is_empty() && text != "null").then(|| (key, Value::String(text.to_owned())))
            })
            .collect()
    }
}

/// Credentials and environment for [`Moneris`].
#[derive(Clone)]
pub struct MonerisConfig {
    store_id: String,
    api_token: String,
    test: bool,
    application_id: Option<String>,
}

impl MonerisConfig {
    /// Creates a production configuration.
    #[must_use]
    pub fn new(store_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            api_token: api_token.into(),
            test: false,
            application_id: None,
        }
    }

    /// Targets the QA environment.
    #[must_use]
    pub const fn with_test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }

    /// Identifies the integrating application on every request.
    #[must_use]
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    /// Stops sending an application id.
    #[must_use]
    pub fn without_application_id(mut self) -> Self {
        self.application_id = None;
        self
    }

    /// The store id.
    #[must_use]
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// The application id sent with each request, if any.
    #[must_use]
    pub fn application_id(&self) -> Option<&str> {
        self.application_id.as_deref()
    }

    /// Whether the QA environment is targeted.
    #[must_use]
    pub const fn is_test(&self) -> bool {
        self.test
    }

    const fn base_url(&self) -> &'static str {
        if self.test { TEST_URL } else { LIVE_URL }
    }
}

impl fmt::Debug for MonerisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonerisConfig")
            .field("store_id", &self.store_id)
            .field("api_token", &FILTERED)
            .field("test", &self.test)
            .field("application_id", &self.application_id)
            .finish()
    }
}

impl TryFrom<&GatewayConfigEntry> for MonerisConfig {
    type Error = GatewayError;

    fn try_from(entry: &GatewayConfigEntry) -> Result<Self, Self::Error> {
        let mut config = Self::new(
            entry.credentials.require("store_id")?,
            entry.credentials.require("api_token")?,
        )
        .with_test(entry.test);
        if let Some(application_id) = &entry.application_id {
            config = config.with_application_id(application_id.as_str());
        }
        Ok(config)
    }
}

/// Moneris gateway adapter.
#[derive(Debug)]
pub struct Moneris {
    config: MonerisConfig,
    transport: Arc<dyn Transport>,
    scrubber: Scrubber,
}

impl Moneris {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the store id or API token is empty,
    /// or the application id is not a valid header value.
    pub fn new(config: MonerisConfig, transport: Arc<dyn Transport>) -> Result<Self, GatewayError> {
        if config.store_id.trim().is_empty() || config.api_token.trim().is_empty() {
            return Err(GatewayError::config(
                "Moneris requires a store_id and an api_token",
            ));
        }
        if let Some(application_id) = &config.application_id {
            HeaderValue::from_str(application_id).map_err(|_| {
                GatewayError::config(format!("invalid Moneris application id: {application_id:?}"))
            })?;
        }
        Ok(Self {
            config,
            transport,
            scrubber: Scrubber::new(vec![
                ScrubRule::xml_element("pan"),
                ScrubRule::xml_element("cvd_value"),
                ScrubRule::xml_element("api_token"),
            ]),
        })
    }

    /// The adapter configuration.
    #[must_use]
    pub const fn config(&self) -> &MonerisConfig {
        &self.config
    }

    fn card_transaction<'a>(
        amount: Amount,
        card: &'a CreditCard,
        options: &'a Options,
    ) -> Result<CardTransaction<'a>, GatewayError> {
        Ok(CardTransaction {
            order_id: options.require_order_id()?,
            cust_id: options.customer.as_deref(),
            amount: format_amount(amount, options),
            pan: &card.number,
            expdate: card.expiry_yymm(),
            crypt_type: CRYPT_TYPE,
            dynamic_descriptor: options.soft_descriptor.as_deref(),
            cvd_info: card
                .verification_value
                .as_deref()
                .filter(|cvd| !cvd.is_empty())
                .map(|cvd_value| CvdInfo {
                    cvd_indicator: 1,
                    cvd_value,
                }),
            avs_info: avs_info(options),
            cof_info: cof_info(options),
        })
    }

    fn vault_transaction<'a>(
        amount: Amount,
        data_key: &'a str,
        options: &'a Options,
    ) -> Result<VaultTransaction<'a>, GatewayError> {
        Ok(VaultTransaction {
            data_key,
            order_id: options.require_order_id()?,
            cust_id: options.customer.as_deref(),
            amount: format_amount(amount, options),
            crypt_type: CRYPT_TYPE,
            dynamic_descriptor: options.soft_descriptor.as_deref(),
            cof_info: cof_info(options),
        })
    }

    fn parse(&self, operation: &'static str, body: &str) -> Response {
        let Ok(reply) = quick_xml::de::from_str::<MpgReply>(body) else {
            return Response::from_classification(Classification::unparsable(DISPLAY_NAME, body))
                .test(self.config.test)
                .build();
        };

        let params = reply.receipt.into_params();
        let authorization = if matches!(operation, "store" | "unstore") {
            param_str(&params, "DataKey").map(str::to_owned)
        } else {
            param_str(&params, "TransID")
                .zip(param_str(&params, "ReceiptId"))
                .map(|(trans_id, receipt_id)| format!("{trans_id};{receipt_id}"))
        };
        let classification = require_authorization(
            DISPLAY_NAME,
            operation,
            CLASSIFIER.classify(&params),
            authorization.as_deref(),
        );
        let avs_result = param_str(&params, "AvsResultCode").and_then(AvsResult::from_code);
        let cvv_result = param_str(&params, "CvdResultCode")
            .and_then(|code| code.get(1..2))
            .and_then(CvvResult::from_code);
        let network_transaction_id = param_str(&params, "IssuerId").map(str::to_owned);

        Response::from_classification(classification)
            .maybe_authorization(authorization)
            .avs_result(avs_result)
            .cvv_result(cvv_result)
            .network_transaction_id(network_transaction_id)
            .test(self.config.test)
            .params(params)
            .build()
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "cardgate.moneris.commit", skip_all, fields(operation = operation), err)
    )]
    async fn commit(
        &self,
        operation: &'static str,
        transaction: Transaction<'_>,
    ) -> Result<Response, GatewayError> {
        let document = MpgRequest {
            store_id: &self.config.store_id,
            api_token: &self.config.api_token,
            transaction,
        };
        let xml = quick_xml::se::to_string_with_root("request", &document)
            .map_err(|err| GatewayError::Encoding(err.to_string()))?;

        let url = endpoint(self.config.base_url(), REQUEST_PATH)?;
        let mut request = HttpRequest::post(url).xml(format!("{XML_DECLARATION}{xml}"));
        if let Some(application_id) = self.config.application_id() {
            request = request.header("user-agent", application_id)?;
        }
        let reply = self.transport.send(request).await?;
        let response = self.parse(operation, &reply.text());
        log_outcome(DISPLAY_NAME, operation, &response);
        Ok(response)
    }
}

fn format_amount(amount: Amount, options: &Options) -> String {
    amount.format(INFO.money_format, options.currency_or(INFO.default_currency))
}

/// Splits `123 Main Street` into the street number and name.
fn split_street(address1: &str) -> (Option<&str>, &str) {
    let address1 = address1.trim();
    match address1.split_once(' ') {
        Some((number, name)) if number.chars().all(|c| c.is_ascii_digit()) => {
            (Some(number), name.trim())
        }
        _ => (None, address1),
    }
}

fn avs_info(options: &Options) -> Option<AvsInfo<'_>> {
    let address = options.billing_address.as_ref()?;
    let (avs_street_number, street_name) = address
        .address1
        .as_deref()
        .map_or((None, ""), split_street);
    let info = AvsInfo {
        avs_street_number,
        avs_street_name: Some(street_name).filter(|name| !name.is_empty()),
        avs_zipcode: address.zip.as_deref(),
    };
    (info.avs_street_number.is_some()
        || info.avs_street_name.is_some()
        || info.avs_zipcode.is_some())
    .then_some(info)
}

fn cof_info(options: &Options) -> Option<CofInfo<'_>> {
    let stored = options.stored_credential.as_ref()?;
    let payment_indicator = match (stored.reason_type, stored.initiator) {
        (ReasonType::Recurring | ReasonType::Installment, _) => "R",
        (ReasonType::Unscheduled, Initiator::Cardholder) => "C",
        (ReasonType::Unscheduled, Initiator::Merchant) => "U",
    };
    Some(CofInfo {
        payment_indicator,
        payment_information: if stored.initial_transaction { "0" } else { "2" },
        issuer_id: if stored.initial_transaction {
            None
        } else {
            stored.network_transaction_id.as_deref()
        },
    })
}

#[async_trait]
impl Gateway for Moneris {
    fn info(&self) -> &GatewayInfo {
        &INFO
    }

    async fn purchase(
        &self,
        amount: Amount,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let transaction = match payment_method {
            PaymentMethod::Card(card) => {
                Transaction::Purchase(Self::card_transaction(amount, card, options)?)
            }
            PaymentMethod::Token(data_key) => {
                Transaction::ResPurchaseCc(Self::vault_transaction(amount, data_key, options)?)
            }
        };
        self.commit("purchase", transaction).await
    }

    async fn authorize(
        &self,
        amount: Amount,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let transaction = match payment_method {
            PaymentMethod::Card(card) => {
                Transaction::Preauth(Self::card_transaction(amount, card, options)?)
            }
            PaymentMethod::Token(data_key) => {
                Transaction::ResPreauthCc(Self::vault_transaction(amount, data_key, options)?)
            }
        };
        self.commit("authorize", transaction).await
    }

    async fn capture(
        &self,
        amount: Amount,
        authorization: &str,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let Some((txn_number, order_id)) = split_authorization(authorization, ';') else {
            return Ok(malformed_authorization(DISPLAY_NAME, authorization));
        };
        let transaction = Transaction::Completion(FollowOn {
            order_id,
            comp_amount: Some(format_amount(amount, options)),
            amount: None,
            txn_number,
            crypt_type: CRYPT_TYPE,
        });
        self.commit("capture", transaction).await
    }

    async fn refund(
        &self,
        amount: Amount,
        authorization: &str,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let Some((txn_number, order_id)) = split_authorization(authorization, ';') else {
            return Ok(malformed_authorization(DISPLAY_NAME, authorization));
        };
        let transaction = Transaction::Refund(FollowOn {
            order_id,
            comp_amount: None,
            amount: Some(format_amount(amount, options)),
            txn_number,
            crypt_type: CRYPT_TYPE,
        });
        self.commit("refund", transaction).await
    }

    /// Releases a preauthorization with a zero-amount completion, or corrects
    /// a same-day purchase when the `purchasecorrection` option is set.
    async fn void(
        &self,
        authorization: &str,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let Some((txn_number, order_id)) = split_authorization(authorization, ';') else {
            return Ok(malformed_authorization(DISPLAY_NAME, authorization));
        };
        let transaction = if options.extra.contains_key("purchasecorrection") {
            Transaction::PurchaseCorrection(FollowOn {
                order_id,
                comp_amount: None,
                amount: None,
                txn_number,
                crypt_type: CRYPT_TYPE,
            })
        } else {
            Transaction::Completion(FollowOn {
                order_id,
                comp_amount: Some(format_amount(Amount::from_minor(0), options)),
                amount: None,
                txn_number,
                crypt_type: CRYPT_TYPE,
            })
        };
        self.commit("void", transaction).await
    }

    async fn store(
        &self,
        payment_method: &PaymentMethod,
        options: &Options,
    ) -> Result<Response, GatewayError> {
        let Some(card) = payment_method.as_card() else {
            return Err(GatewayError::InvalidPaymentMethod(
                "Moneris can only store card data".to_owned(),
            ));
        };
        let transaction = Transaction::ResAddCc(AddCard {
            cust_id: options.customer.as_deref(),
            email: options.email.as_deref(),
            pan: &card.number,
            expdate: card.expiry_yymm(),
            crypt_type: CRYPT_TYPE,
            avs_info: avs_info(options),
        });
        self.commit("store", transaction).await
    }

    async fn unstore(&self, token: &str, _options: &Options) -> Result<Response, GatewayError> {
        let data_key = token.trim();
        if data_key.is_empty() {
            return Ok(malformed_authorization(DISPLAY_NAME, token));
        }
        self.commit("unstore", Transaction::ResDelete(DeleteCard { data_key }))
            .await
    }

    fn scrubber(&self) -> &Scrubber {
        &self.scrubber
    }
}
