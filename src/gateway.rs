//! The payment gateway boundary.
//!
//! The crate never talks HTTP itself; callers supply a [`GatewayClient`]
//! implementation and the presenter drives it. A call either yields a
//! [`Receipt`] (which may still encode a business decline) or fails with a
//! [`TransportError`]. The two are kept distinct: a decline is a terminal
//! answer, a transport failure is retryable.

use crate::card::CardDetails;
use crate::error::TransportError;
use crate::secure3d::ChallengeOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The gateway operation a submission maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Immediate charge.
    Payment,
    /// Authorization hold, captured later.
    PreAuth,
    /// Card registration for later token payments.
    RegisterCard,
}

impl TransactionKind {
    /// Short name used in fingerprints and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::PreAuth => "preauth",
            Self::RegisterCard => "register",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Cardholder address as sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAddress {
    /// Postcode for the AVS check.
    pub post_code: String,
    /// Country name as selected on the form.
    pub country: String,
}

/// A transaction request as handed to the gateway client.
///
/// Built by the presenter from its configuration plus the submitted card
/// details (or stored token). The device-signal map is treated as opaque
/// and merged into the body as-is.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Merchant account identifier.
    pub merchant_id: String,
    /// Transaction amount, as a decimal string.
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Caller-supplied idempotency reference.
    pub your_consumer_reference: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cv2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    card_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_last_four: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    card_address: Option<RequestAddress>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    client_details: HashMap<String, String>,
}

impl TransactionRequest {
    /// Starts a request with the caller identifiers.
    pub fn new(
        merchant_id: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            amount: amount.into(),
            currency: currency.into(),
            your_consumer_reference: reference.into(),
            card_number: None,
            cv2: None,
            expiry_date: None,
            start_date: None,
            issue_number: None,
            card_token: None,
            token_end_date: None,
            token_last_four: None,
            card_address: None,
            client_details: HashMap::new(),
        }
    }

    /// Attaches freshly entered card details.
    pub fn with_card(mut self, card: &CardDetails) -> Self {
        self.card_number = Some(card.number().to_string());
        self.cv2 = Some(card.security_code().to_string());
        self.expiry_date = Some(card.expiry_date().to_string());
        self.start_date = card.start_date().map(str::to_string);
        self.issue_number = card.issue_number().map(str::to_string);
        self.card_address = card.address().map(|address| RequestAddress {
            post_code: address.postcode.clone(),
            country: address.country.display_name().to_string(),
        });
        self
    }

    /// Attaches a stored card token instead of raw card details.
    pub fn with_token(
        mut self,
        token: impl Into<String>,
        end_date: impl Into<String>,
        last_four: impl Into<String>,
        security_code: impl Into<String>,
    ) -> Self {
        self.card_token = Some(token.into());
        self.token_end_date = Some(end_date.into());
        self.token_last_four = Some(last_four.into());
        self.cv2 = Some(security_code.into());
        self
    }

    /// Merges the opaque device-signal map into the request body.
    pub fn with_device_signals(mut self, signals: HashMap<String, String>) -> Self {
        self.client_details.extend(signals);
        self
    }

    /// True when the request carries a stored token rather than a typed
    /// number.
    pub fn uses_token(&self) -> bool {
        self.card_token.is_some()
    }
}

impl fmt::Debug for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRequest")
            .field("merchant_id", &self.merchant_id)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("your_consumer_reference", &self.your_consumer_reference)
            .field(
                "card_number",
                &self.card_number.as_deref().map(crate::mask::mask_number),
            )
            .field("cv2", &self.cv2.as_deref().map(|_| "***"))
            .field("card_token", &self.card_token.as_deref().map(|_| "<token>"))
            .finish_non_exhaustive()
    }
}

/// A gateway response to a transaction call.
///
/// Read-only once returned: the presenter only inspects it and hands it
/// on. A receipt with `success: false` may either be a plain decline or,
/// when `three_d_secure_required` is set, an instruction to run the 3-D
/// Secure challenge described by the acquirer-redirect parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Gateway-issued receipt identifier; correlates the challenge round
    /// trip.
    pub receipt_id: String,
    /// Whether the transaction was approved.
    pub success: bool,
    /// The gateway wants a 3-D Secure challenge before deciding.
    #[serde(default)]
    pub three_d_secure_required: bool,
    /// Decline or error reason code.
    #[serde(default)]
    pub result: Option<String>,
    /// Human-readable gateway message.
    #[serde(default)]
    pub message: Option<String>,
    /// Issuer ACS page to load for the challenge.
    #[serde(default)]
    pub acs_url: Option<String>,
    /// Opaque merchant data posted to the ACS page.
    #[serde(default)]
    pub md: Option<String>,
    /// Payer authentication request posted to the ACS page.
    #[serde(default)]
    pub pa_req: Option<String>,
}

impl Receipt {
    /// An approved receipt, as mocks and tests build them.
    pub fn approved(receipt_id: impl Into<String>) -> Self {
        Self {
            receipt_id: receipt_id.into(),
            success: true,
            three_d_secure_required: false,
            result: Some("Success".to_string()),
            message: None,
            acs_url: None,
            md: None,
            pa_req: None,
        }
    }

    /// A declined receipt with a reason code.
    pub fn declined(receipt_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            receipt_id: receipt_id.into(),
            success: false,
            three_d_secure_required: false,
            result: Some(result.into()),
            message: None,
            acs_url: None,
            md: None,
            pa_req: None,
        }
    }

    /// A receipt demanding a 3-D Secure challenge.
    pub fn challenge(
        receipt_id: impl Into<String>,
        acs_url: impl Into<String>,
        md: impl Into<String>,
        pa_req: impl Into<String>,
    ) -> Self {
        Self {
            receipt_id: receipt_id.into(),
            success: false,
            three_d_secure_required: true,
            result: Some("Requires 3D Secure".to_string()),
            message: None,
            acs_url: Some(acs_url.into()),
            md: Some(md.into()),
            pa_req: Some(pa_req.into()),
        }
    }

    /// The acquirer-redirect parameters needed to present the challenge,
    /// if the receipt asked for one and carries them all.
    pub fn challenge_request(&self) -> Option<ChallengeRequest> {
        if !self.three_d_secure_required {
            return None;
        }
        Some(ChallengeRequest {
            receipt_id: self.receipt_id.clone(),
            acs_url: self.acs_url.clone()?,
            md: self.md.clone()?,
            pa_req: self.pa_req.clone()?,
        })
    }
}

/// Everything the redirect-capturing surface needs to run a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    /// Receipt the challenge belongs to.
    pub receipt_id: String,
    /// Issuer ACS page URL.
    pub acs_url: String,
    /// Opaque merchant data to POST.
    pub md: String,
    /// Payer authentication request to POST.
    pub pa_req: String,
}

/// Asynchronous client for the remote payment gateway.
///
/// Implementations own signing, transport and deserialization; the crate
/// only sees receipts and transport failures.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Submits an immediate payment.
    async fn payment(&self, request: TransactionRequest) -> Result<Receipt, TransportError>;

    /// Submits an authorization hold.
    async fn pre_auth(&self, request: TransactionRequest) -> Result<Receipt, TransportError>;

    /// Voids a previous authorization hold.
    async fn void_pre_auth(&self, receipt_id: &str) -> Result<Receipt, TransportError>;

    /// Registers a card for future token payments.
    async fn register_card(&self, request: TransactionRequest) -> Result<Receipt, TransportError>;

    /// Completes a transaction with the outcome of its 3-D Secure
    /// challenge.
    async fn authorize_three_d_secure(
        &self,
        receipt_id: &str,
        outcome: &ChallengeOutcome,
    ) -> Result<Receipt, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardDetails;

    #[test]
    fn test_receipt_wire_format() {
        let json = r#"{
            "receiptId": "1312",
            "success": false,
            "threeDSecureRequired": true,
            "result": "Requires 3D Secure",
            "acsUrl": "https://acs.example/challenge",
            "md": "md-token",
            "paReq": "pa-req-blob"
        }"#;

        let receipt: Receipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.receipt_id, "1312");
        assert!(!receipt.success);
        assert!(receipt.three_d_secure_required);

        let challenge = receipt.challenge_request().unwrap();
        assert_eq!(challenge.acs_url, "https://acs.example/challenge");
        assert_eq!(challenge.receipt_id, "1312");
    }

    #[test]
    fn test_receipt_defaults_optional_fields() {
        let json = r#"{"receiptId": "1", "success": true}"#;
        let receipt: Receipt = serde_json::from_str(json).unwrap();
        assert!(receipt.success);
        assert!(!receipt.three_d_secure_required);
        assert_eq!(receipt.challenge_request(), None);
    }

    #[test]
    fn test_challenge_request_needs_all_parameters() {
        let mut receipt = Receipt::challenge("1", "https://acs", "md", "pareq");
        receipt.md = None;
        assert_eq!(receipt.challenge_request(), None);
    }

    #[test]
    fn test_request_serialization_skips_absent_fields() {
        let request = TransactionRequest::new("100915867", "1.99", "GBP", "order-1");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["merchantId"], "100915867");
        assert_eq!(json["yourConsumerReference"], "order-1");
        assert!(json.get("cardNumber").is_none());
        assert!(json.get("cardToken").is_none());
        assert!(json.get("clientDetails").is_none());
    }

    #[test]
    fn test_request_with_card() {
        let card = CardDetails::new("4976000000003436", "12/25", "452");
        let request =
            TransactionRequest::new("100915867", "1.99", "GBP", "order-1").with_card(&card);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["cardNumber"], "4976000000003436");
        assert_eq!(json["cv2"], "452");
        assert_eq!(json["expiryDate"], "12/25");
        assert!(!request.uses_token());
    }

    #[test]
    fn test_request_with_token() {
        let request = TransactionRequest::new("100915867", "1.99", "GBP", "order-1")
            .with_token("tok_83b2", "12/25", "3436", "452");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["cardToken"], "tok_83b2");
        assert_eq!(json["tokenLastFour"], "3436");
        assert!(request.uses_token());
    }

    #[test]
    fn test_device_signals_merged() {
        let mut signals = HashMap::new();
        signals.insert("deviceId".to_string(), "ab12".to_string());

        let request = TransactionRequest::new("100915867", "1.99", "GBP", "order-1")
            .with_device_signals(signals);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["clientDetails"]["deviceId"], "ab12");
    }

    #[test]
    fn test_request_debug_is_masked() {
        let card = CardDetails::new("4976000000003436", "12/25", "452");
        let request =
            TransactionRequest::new("100915867", "1.99", "GBP", "order-1").with_card(&card);
        let debug = format!("{:?}", request);
        assert!(!debug.contains("4976000000003436"));
        assert!(!debug.contains("452"));
    }
}
