use crate::config::{DEFAULT_IFRAME_URL, GatewayConfig};
use crate::domain::amount::{self, Amount, Description, OrderId};
use crate::domain::credentials::MerchantCredentials;
use crate::domain::fields::{self, FieldMap};
use crate::domain::operation::Operation;
use crate::domain::signature::transaction_signature;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Card data for tokenization. Only ever sent, never stored.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    /// Card number without spaces or dashes.
    pub pan: String,
    /// `mmyy`.
    pub expiry_date: String,
    pub cvv: String,
    pub cardholder_name: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("pan", &"***")
            .field("expiry_date", &self.expiry_date)
            .field("cvv", &"***")
            .field("cardholder_name", &self.cardholder_name)
            .finish()
    }
}

/// Gateway-issued reference to a stored card.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardToken {
    pub user_id: String,
    pub user_token: String,
}

impl CardToken {
    pub fn new(user_id: impl Into<String>, user_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_token: user_token.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    pub card: CardToken,
    /// In currency units; converted to minor units when the request is built.
    pub amount: Decimal,
    pub order: String,
    pub description: String,
    pub scoring: u32,
    pub merchant_data: String,
    pub merchant_descriptor: String,
}

impl Charge {
    pub fn new(card: CardToken, amount: Decimal, order: impl Into<String>) -> Self {
        Self {
            card,
            amount,
            order: order.into(),
            description: String::new(),
            scoring: 0,
            merchant_data: String::new(),
            merchant_descriptor: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_scoring(mut self, scoring: u32) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_merchant_data(mut self, merchant_data: impl Into<String>) -> Self {
        self.merchant_data = merchant_data.into();
        self
    }

    pub fn with_merchant_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.merchant_descriptor = descriptor.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Refund {
    pub card: CardToken,
    pub amount: Decimal,
    /// Must be the order of the original charge.
    pub order: String,
    /// Authorization code returned by the original charge.
    pub auth_code: String,
    pub merchant_descriptor: String,
}

impl Refund {
    pub fn new(
        card: CardToken,
        amount: Decimal,
        order: impl Into<String>,
        auth_code: impl Into<String>,
    ) -> Self {
        Self {
            card,
            amount,
            order: order.into(),
            auth_code: auth_code.into(),
            merchant_descriptor: String::new(),
        }
    }

    pub fn with_merchant_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.merchant_descriptor = descriptor.into();
        self
    }
}

/// One remote operation together with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationCall {
    AddUser(CardDetails),
    InfoUser(CardToken),
    RemoveUser(CardToken),
    ExecutePurchase(Charge),
    ExecuteRefund(Refund),
}

impl OperationCall {
    pub fn operation(&self) -> Operation {
        match self {
            OperationCall::AddUser(_) => Operation::AddUser,
            OperationCall::InfoUser(_) => Operation::InfoUser,
            OperationCall::RemoveUser(_) => Operation::RemoveUser,
            OperationCall::ExecutePurchase(_) => Operation::ExecutePurchase,
            OperationCall::ExecuteRefund(_) => Operation::ExecuteRefund,
        }
    }

    /// The merchant order the call refers to, for charges and refunds.
    pub fn order(&self) -> Option<&str> {
        match self {
            OperationCall::ExecutePurchase(charge) => Some(charge.order.as_str()),
            OperationCall::ExecuteRefund(refund) => Some(refund.order.as_str()),
            _ => None,
        }
    }
}

/// A field mapping ready for the transport, signature included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedRequest {
    #[serde(rename = "method", serialize_with = "serialize_operation")]
    pub operation: Operation,
    pub fields: FieldMap,
}

fn serialize_operation<S>(operation: &Operation, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(operation.remote_method())
}

impl SignedRequest {
    pub fn remote_method(&self) -> &'static str {
        self.operation.remote_method()
    }

    pub fn signature(&self) -> Option<&str> {
        self.fields.get(fields::SIGNATURE)
    }
}

/// Builds signed field mappings from merchant credentials and the caller IP.
///
/// Holds no mutable state, so one builder can serve any number of concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    credentials: MerchantCredentials,
    ip: String,
    owner: String,
    pub(crate) iframe_url: String,
}

impl RequestBuilder {
    /// # Arguments
    ///
    /// * `credentials` - Merchant identity and secret.
    /// * `ip` - IP address of the end customer on whose behalf requests are made.
    pub fn new(credentials: MerchantCredentials, ip: impl Into<String>) -> Self {
        Self {
            credentials,
            ip: ip.into(),
            owner: String::new(),
            iframe_url: DEFAULT_IFRAME_URL.to_string(),
        }
    }

    pub fn from_config(config: &GatewayConfig, ip: impl Into<String>) -> Self {
        Self {
            credentials: config.credentials(),
            ip: ip.into(),
            owner: config.merchant_owner.clone(),
            iframe_url: config.iframe_url.clone(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn credentials(&self) -> &MerchantCredentials {
        &self.credentials
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Builds the request for any operation.
    pub fn build(&self, call: &OperationCall) -> Result<SignedRequest> {
        match call {
            OperationCall::AddUser(card) => self.add_user(card),
            OperationCall::InfoUser(token) => self.info_user(token),
            OperationCall::RemoveUser(token) => self.remove_user(token),
            OperationCall::ExecutePurchase(charge) => self.execute_purchase(charge),
            OperationCall::ExecuteRefund(refund) => self.execute_refund(refund),
        }
    }

    pub fn add_user(&self, card: &CardDetails) -> Result<SignedRequest> {
        let mut data = FieldMap::new();
        data.insert(fields::PAN, card.pan.as_str());
        data.insert(fields::EXPIRY_DATE, card.expiry_date.as_str());
        data.insert(fields::CVV, card.cvv.as_str());
        data.insert(fields::CARDHOLDER_NAME, card.cardholder_name.as_str());
        self.sign(Operation::AddUser, data)
    }

    pub fn info_user(&self, token: &CardToken) -> Result<SignedRequest> {
        self.sign(Operation::InfoUser, token_fields(token))
    }

    pub fn remove_user(&self, token: &CardToken) -> Result<SignedRequest> {
        self.sign(Operation::RemoveUser, token_fields(token))
    }

    pub fn execute_purchase(&self, charge: &Charge) -> Result<SignedRequest> {
        let amount = Amount::new(charge.amount)?;
        let order = OrderId::new(charge.order.as_str())?;
        let description = Description::new(charge.description.as_str())?;

        let mut data = token_fields(&charge.card);
        data.insert(fields::AMOUNT, amount.to_minor_units());
        data.insert(fields::ORDER, order.as_str());
        data.insert(fields::CURRENCY, amount::CURRENCY);
        data.insert(fields::PRODUCT_DESCRIPTION, description.as_str());
        data.insert(fields::OWNER, self.owner.as_str());
        data.insert(fields::SCORING, charge.scoring.to_string());
        data.insert(fields::MERCHANT_DATA, charge.merchant_data.as_str());
        data.insert(fields::MERCHANT_DESCRIPTOR, charge.merchant_descriptor.as_str());
        self.sign(Operation::ExecutePurchase, data)
    }

    pub fn execute_refund(&self, refund: &Refund) -> Result<SignedRequest> {
        let amount = Amount::new(refund.amount)?;
        let order = OrderId::new(refund.order.as_str())?;

        let mut data = token_fields(&refund.card);
        data.insert(fields::AMOUNT, amount.to_minor_units());
        data.insert(fields::ORDER, order.as_str());
        data.insert(fields::CURRENCY, amount::CURRENCY);
        data.insert(fields::AUTH_CODE, refund.auth_code.as_str());
        data.insert(fields::MERCHANT_DESCRIPTOR, refund.merchant_descriptor.as_str());
        self.sign(Operation::ExecuteRefund, data)
    }

    /// Adds the merchant envelope and the signature to `data`.
    fn sign(&self, operation: Operation, mut data: FieldMap) -> Result<SignedRequest> {
        data.insert(fields::MERCHANT_CODE, self.credentials.merchant_code.as_str());
        data.insert(fields::TERMINAL, self.credentials.terminal.as_str());
        data.insert(fields::ORIGINAL_IP, self.ip.as_str());

        let signature = transaction_signature(
            &data,
            operation.signed_fields(),
            &self.credentials.merchant_password,
        )?;
        data.insert(fields::SIGNATURE, signature);

        debug!(%operation, fields = data.len(), "signed request");
        Ok(SignedRequest {
            operation,
            fields: data,
        })
    }
}

fn token_fields(token: &CardToken) -> FieldMap {
    let mut data = FieldMap::new();
    data.insert(fields::USER_ID, token.user_id.as_str());
    data.insert(fields::USER_TOKEN, token.user_token.as_str());
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaytpvError;
    use rust_decimal_macros::dec;

    fn builder() -> RequestBuilder {
        RequestBuilder::new(MerchantCredentials::new("1", "pw", "4"), "62.83.129.18")
    }

    fn token() -> CardToken {
        CardToken::new("10", "tok")
    }

    #[test]
    fn test_call_order() {
        let charge = Charge::new(token(), dec!(1), "ORD7");
        assert_eq!(OperationCall::ExecutePurchase(charge).order(), Some("ORD7"));
        let refund = Refund::new(token(), dec!(1), "ORD8", "A1");
        assert_eq!(OperationCall::ExecuteRefund(refund).order(), Some("ORD8"));
        assert_eq!(OperationCall::InfoUser(token()).order(), None);
    }

    #[test]
    fn test_add_user_request() {
        let card = CardDetails {
            pan: "2".to_string(),
            expiry_date: "0530".to_string(),
            cvv: "3".to_string(),
            cardholder_name: "Test".to_string(),
        };
        let request = builder().add_user(&card).unwrap();

        assert_eq!(request.remote_method(), "add_user");
        let keys: Vec<&str> = request.fields.keys().collect();
        assert_eq!(
            keys,
            vec![
                fields::PAN,
                fields::EXPIRY_DATE,
                fields::CVV,
                fields::CARDHOLDER_NAME,
                fields::MERCHANT_CODE,
                fields::TERMINAL,
                fields::ORIGINAL_IP,
                fields::SIGNATURE,
            ]
        );
        // sha1("1" + "2" + "3" + "4" + "pw")
        assert_eq!(
            request.signature(),
            Some("706cbe7cb53eb9a1d596121976fe9481615538c3")
        );
        assert_eq!(request.fields.get(fields::ORIGINAL_IP), Some("62.83.129.18"));
    }

    #[test]
    fn test_info_and_remove_share_signature() {
        let info = builder().info_user(&token()).unwrap();
        let remove = builder().remove_user(&token()).unwrap();
        // sha1("1" + "10" + "tok" + "4" + "pw")
        assert_eq!(
            info.signature(),
            Some("0abae6dc92750456527f4b81b3af7d29daf24fa1")
        );
        assert_eq!(info.signature(), remove.signature());
        assert_eq!(remove.remote_method(), "remove_user");
    }

    #[test]
    fn test_purchase_request() {
        let charge = Charge::new(token(), dec!(33), "ORD1").with_description("Wine");
        let request = builder().with_owner("Shop").execute_purchase(&charge).unwrap();

        assert_eq!(request.remote_method(), "execute_purchase");
        assert_eq!(request.fields.get(fields::AMOUNT), Some("3300"));
        assert_eq!(request.fields.get(fields::CURRENCY), Some("EUR"));
        assert_eq!(request.fields.get(fields::OWNER), Some("Shop"));
        assert_eq!(request.fields.get(fields::SCORING), Some("0"));
        assert_eq!(request.fields.get(fields::PRODUCT_DESCRIPTION), Some("Wine"));
        // sha1("1" + "10" + "tok" + "4" + "3300" + "ORD1" + "pw")
        assert_eq!(
            request.signature(),
            Some("d40d4842569282b3fd988bfc8c3f878aeff9ff72")
        );
    }

    #[test]
    fn test_refund_request() {
        let refund = Refund::new(token(), dec!(33), "ORD1", "AUTH42");
        let request = builder().execute_refund(&refund).unwrap();

        assert_eq!(request.remote_method(), "execute_refund");
        assert_eq!(request.fields.get(fields::AUTH_CODE), Some("AUTH42"));
        assert_eq!(request.fields.get(fields::AMOUNT), Some("3300"));
        // sha1("1" + "10" + "tok" + "4" + "AUTH42" + "ORD1" + "pw")
        assert_eq!(
            request.signature(),
            Some("51e0366054c8c98dbf25da87d2df3dc7efe4d798")
        );
    }

    #[test]
    fn test_purchase_validation() {
        let b = builder();
        for amount in [dec!(0), dec!(-5)] {
            let charge = Charge::new(token(), amount, "ORD1");
            assert!(matches!(
                b.execute_purchase(&charge),
                Err(PaytpvError::ValidationError(_))
            ));
        }

        let long_order = Charge::new(token(), dec!(1), "o".repeat(21));
        assert!(b.execute_purchase(&long_order).is_err());
        let max_order = Charge::new(token(), dec!(1), "o".repeat(20));
        assert!(b.execute_purchase(&max_order).is_ok());

        let long_description =
            Charge::new(token(), dec!(1), "ORD1").with_description("d".repeat(41));
        assert!(b.execute_purchase(&long_description).is_err());
        let max_description =
            Charge::new(token(), dec!(1), "ORD1").with_description("d".repeat(40));
        assert!(b.execute_purchase(&max_description).is_ok());
    }

    #[test]
    fn test_refund_validation() {
        let b = builder();
        assert!(b
            .execute_refund(&Refund::new(token(), dec!(0), "ORD1", "A"))
            .is_err());
        assert!(b
            .execute_refund(&Refund::new(token(), dec!(1), "o".repeat(21), "A"))
            .is_err());
    }

    #[test]
    fn test_build_dispatches_by_call() {
        let b = builder();
        let call = OperationCall::InfoUser(token());
        assert_eq!(call.operation(), Operation::InfoUser);
        assert_eq!(b.build(&call).unwrap(), b.info_user(&token()).unwrap());
    }

    #[test]
    fn test_signed_request_serializes_method_name() {
        let request = builder().info_user(&token()).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "info_user");
        assert_eq!(json["fields"][fields::USER_ID], "10");
    }

    #[test]
    fn test_card_details_debug_hides_pan() {
        let card = CardDetails {
            pan: "4539232076648253".to_string(),
            expiry_date: "0530".to_string(),
            cvv: "123".to_string(),
            cardholder_name: "Test".to_string(),
        };
        assert!(!format!("{card:?}").contains("4539232076648253"));
    }
}
