use crate::application::builder::CardToken;
use crate::domain::credentials::MerchantCredentials;
use crate::domain::fields::{self, FieldMap, OperationReply};
use crate::domain::operation::Operation;
use crate::domain::ports::{AsyncTransport, Transport};
use crate::domain::signature::transaction_signature;
use crate::error::{PaytpvError, Result};
use async_trait::async_trait;
use ring::digest::{SHA256, digest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Error codes answered by [`InMemoryGateway`].
pub mod codes {
    pub const CARD_NUMBER: i64 = 108;
    pub const EXPIRY_DATE: i64 = 109;
    pub const USER_NOT_FOUND: i64 = 1001;
    pub const UNKNOWN_MERCHANT: i64 = 1003;
    pub const SIGNATURE_MISMATCH: i64 = 1004;
    pub const CHARGE_NOT_FOUND: i64 = 1006;
    pub const REFUND_EXCEEDS_CHARGE: i64 = 1007;
    pub const DUPLICATE_ORDER: i64 = 1008;
    pub const INVALID_AMOUNT: i64 = 1009;
}

/// A request as it reached the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub fields: FieldMap,
}

struct StoredCard {
    pan: String,
    expiry_date: String,
}

struct StoredCharge {
    card: CardToken,
    amount: u64,
    refunded: u64,
    auth_code: String,
}

#[derive(Default)]
struct GatewayState {
    next_user_id: u64,
    next_auth_code: u64,
    cards: HashMap<CardToken, StoredCard>,
    charges: HashMap<String, StoredCharge>,
    requests: Vec<RecordedRequest>,
}

/// An in-process stand-in for the gateway's SOAP service.
///
/// Authenticates every request the way the real service does (merchant code,
/// terminal and signature over the operation's signed fields), keeps card
/// tokens and charges in memory, and records every request it receives.
/// Implements both [`Transport`] and [`AsyncTransport`]; clones share state.
#[derive(Clone)]
pub struct InMemoryGateway {
    credentials: MerchantCredentials,
    state: Arc<Mutex<GatewayState>>,
}

impl InMemoryGateway {
    /// Creates a gateway that accepts requests signed with `credentials`.
    pub fn new(credentials: MerchantCredentials) -> Self {
        Self {
            credentials,
            state: Arc::new(Mutex::new(GatewayState::default())),
        }
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }

    pub fn card_count(&self) -> usize {
        self.lock().map(|state| state.cards.len()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, GatewayState>> {
        self.state
            .lock()
            .map_err(|_| PaytpvError::transport("in-memory gateway state is poisoned"))
    }

    fn handle(&self, method: &str, request: &FieldMap) -> Result<OperationReply> {
        let mut state = self.lock()?;
        state.requests.push(RecordedRequest {
            method: method.to_string(),
            fields: request.clone(),
        });

        let operation = Operation::from_remote_method(method)
            .ok_or_else(|| PaytpvError::transport(format!("unknown remote method: {method}")))?;
        if let Err(code) = self.authenticate(operation, request) {
            return Ok(failure(code));
        }

        let reply = match operation {
            Operation::AddUser => state.add_user(request),
            Operation::InfoUser => state.info_user(request),
            Operation::RemoveUser => state.remove_user(request),
            Operation::ExecutePurchase => state.execute_purchase(request),
            Operation::ExecuteRefund => state.execute_refund(request),
        };
        Ok(reply.unwrap_or_else(failure))
    }

    fn authenticate(&self, operation: Operation, request: &FieldMap) -> std::result::Result<(), i64> {
        if value(request, fields::MERCHANT_CODE) != self.credentials.merchant_code
            || value(request, fields::TERMINAL) != self.credentials.terminal
        {
            return Err(codes::UNKNOWN_MERCHANT);
        }
        let expected = transaction_signature(
            request,
            operation.signed_fields(),
            &self.credentials.merchant_password,
        )
        .map_err(|_| codes::SIGNATURE_MISMATCH)?;
        if request.get(fields::SIGNATURE) != Some(expected.as_str()) {
            return Err(codes::SIGNATURE_MISMATCH);
        }
        Ok(())
    }
}

type Outcome = std::result::Result<OperationReply, i64>;

impl GatewayState {
    fn add_user(&mut self, request: &FieldMap) -> Outcome {
        let expiry_date = value(request, fields::EXPIRY_DATE);
        if !valid_expiry(expiry_date) {
            return Err(codes::EXPIRY_DATE);
        }
        let pan = value(request, fields::PAN);
        if !(12..=19).contains(&pan.len()) || !pan.bytes().all(|b| b.is_ascii_digit()) {
            return Err(codes::CARD_NUMBER);
        }

        self.next_user_id += 1;
        let user_id = self.next_user_id.to_string();
        let user_token = hex::encode(md5::compute(format!("{user_id}:{pan}").as_bytes()).0);
        self.cards.insert(
            CardToken::new(user_id.as_str(), user_token.as_str()),
            StoredCard {
                pan: pan.to_string(),
                expiry_date: expiry_date.to_string(),
            },
        );

        Ok(success([
            (fields::USER_ID, user_id.as_str()),
            (fields::USER_TOKEN, user_token.as_str()),
        ]))
    }

    fn info_user(&self, request: &FieldMap) -> Outcome {
        let card = self
            .cards
            .get(&token_of(request))
            .ok_or(codes::USER_NOT_FOUND)?;

        let pan = &card.pan;
        let masked = format!("{}-XX-XXXX-{}", &pan[..6], &pan[pan.len() - 4..]);
        let expiry = format!("20{}/{}", &card.expiry_date[2..], &card.expiry_date[..2]);
        let hash = hex::encode(digest(&SHA256, pan.as_bytes()));
        Ok(success([
            (fields::PAN, masked.as_str()),
            (fields::CARD_BRAND, brand(pan)),
            (fields::CARD_TYPE, "CREDIT"),
            (fields::CARD_COUNTRY_ISO3, "ESP"),
            (fields::EXPIRY, expiry.as_str()),
            (fields::CARD_HASH, hash.as_str()),
        ]))
    }

    fn remove_user(&mut self, request: &FieldMap) -> Outcome {
        self.cards
            .remove(&token_of(request))
            .ok_or(codes::USER_NOT_FOUND)?;
        Ok(success([(fields::RESPONSE, "1")]))
    }

    fn execute_purchase(&mut self, request: &FieldMap) -> Outcome {
        let card = token_of(request);
        if !self.cards.contains_key(&card) {
            return Err(codes::USER_NOT_FOUND);
        }
        let amount = minor_units(request)?;
        let order = value(request, fields::ORDER);
        if self.charges.contains_key(order) {
            return Err(codes::DUPLICATE_ORDER);
        }

        self.next_auth_code += 1;
        let auth_code = format!("{:06}", self.next_auth_code);
        self.charges.insert(
            order.to_string(),
            StoredCharge {
                card,
                amount,
                refunded: 0,
                auth_code: auth_code.clone(),
            },
        );

        Ok(success([
            (fields::AMOUNT, value(request, fields::AMOUNT)),
            (fields::ORDER, order),
            (fields::CURRENCY, value(request, fields::CURRENCY)),
            (fields::AUTH_CODE, auth_code.as_str()),
            (fields::RESPONSE, "1"),
        ]))
    }

    fn execute_refund(&mut self, request: &FieldMap) -> Outcome {
        let amount = minor_units(request)?;
        let order = value(request, fields::ORDER);
        let card = token_of(request);
        let charge = self
            .charges
            .get_mut(order)
            .filter(|c| c.card == card && c.auth_code == value(request, fields::AUTH_CODE))
            .ok_or(codes::CHARGE_NOT_FOUND)?;
        let refunded = charge
            .refunded
            .checked_add(amount)
            .filter(|total| *total <= charge.amount)
            .ok_or(codes::REFUND_EXCEEDS_CHARGE)?;
        charge.refunded = refunded;

        Ok(success([
            (fields::AMOUNT, value(request, fields::AMOUNT)),
            (fields::ORDER, order),
            (fields::CURRENCY, value(request, fields::CURRENCY)),
            (fields::RESPONSE, "1"),
        ]))
    }
}

impl Transport for InMemoryGateway {
    fn send(&self, method: &str, request: &FieldMap) -> Result<OperationReply> {
        self.handle(method, request)
    }
}

#[async_trait]
impl AsyncTransport for InMemoryGateway {
    async fn send(&self, method: &str, request: &FieldMap) -> Result<OperationReply> {
        // Give other in-flight calls a chance to run, as a network hop would.
        tokio::task::yield_now().await;
        self.handle(method, request)
    }
}

fn value<'a>(request: &'a FieldMap, key: &str) -> &'a str {
    request.get(key).unwrap_or_default()
}

fn token_of(request: &FieldMap) -> CardToken {
    CardToken::new(value(request, fields::USER_ID), value(request, fields::USER_TOKEN))
}

fn minor_units(request: &FieldMap) -> std::result::Result<u64, i64> {
    match value(request, fields::AMOUNT).parse::<u64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(codes::INVALID_AMOUNT),
    }
}

fn valid_expiry(mmyy: &str) -> bool {
    mmyy.len() == 4
        && mmyy.bytes().all(|b| b.is_ascii_digit())
        && matches!(mmyy[..2].parse::<u8>(), Ok(1..=12))
}

fn brand(pan: &str) -> &'static str {
    match pan.as_bytes().first() {
        Some(b'4') => "VISA",
        Some(b'5') => "MASTERCARD",
        Some(b'3') => "AMEX",
        Some(b'6') => "DISCOVER",
        _ => "UNKNOWN",
    }
}

fn success<const N: usize>(pairs: [(&str, &str); N]) -> OperationReply {
    let mut reply: OperationReply = pairs.into_iter().collect();
    reply.insert(fields::ERROR_ID, "0");
    reply
}

fn failure(code: i64) -> OperationReply {
    [(fields::ERROR_ID, code.to_string())].into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::builder::{CardDetails, Charge, Refund, RequestBuilder};
    use rust_decimal::Decimal;

    fn credentials() -> MerchantCredentials {
        MerchantCredentials::new("1", "pw", "4")
    }

    fn card() -> CardDetails {
        CardDetails {
            pan: "4539232076648253".to_string(),
            expiry_date: "0530".to_string(),
            cvv: "123".to_string(),
            cardholder_name: "Test".to_string(),
        }
    }

    #[test]
    fn test_add_and_info_user() {
        let gateway = InMemoryGateway::new(credentials());
        let builder = RequestBuilder::new(credentials(), "1.2.3.4");

        let add = builder.add_user(&card()).unwrap();
        let reply = Transport::send(&gateway, add.remote_method(), &add.fields).unwrap();
        assert_eq!(reply.error_code().unwrap(), 0);
        let token = CardToken::new(reply.user_id().unwrap(), reply.user_token().unwrap());

        let info = builder.info_user(&token).unwrap();
        let reply = Transport::send(&gateway, info.remote_method(), &info.fields).unwrap();
        assert_eq!(reply.get(fields::PAN), Some("453923-XX-XXXX-8253"));
        assert_eq!(reply.get(fields::CARD_BRAND), Some("VISA"));
        assert_eq!(reply.get(fields::EXPIRY), Some("2030/05"));
        assert_eq!(gateway.requests().len(), 2);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let gateway = InMemoryGateway::new(credentials());
        let impostor = RequestBuilder::new(MerchantCredentials::new("1", "wrong", "4"), "1.2.3.4");

        let add = impostor.add_user(&card()).unwrap();
        let reply = Transport::send(&gateway, add.remote_method(), &add.fields).unwrap();
        assert_eq!(reply.error_code().unwrap(), codes::SIGNATURE_MISMATCH);
        assert_eq!(gateway.card_count(), 0);
    }

    #[test]
    fn test_bad_expiry_date() {
        let gateway = InMemoryGateway::new(credentials());
        let builder = RequestBuilder::new(credentials(), "1");
        let bad = CardDetails {
            pan: "1".to_string(),
            expiry_date: "1".to_string(),
            cvv: "1".to_string(),
            cardholder_name: "1".to_string(),
        };

        let add = builder.add_user(&bad).unwrap();
        let reply = Transport::send(&gateway, add.remote_method(), &add.fields).unwrap();
        assert_eq!(reply.error_code().unwrap(), codes::EXPIRY_DATE);
    }

    #[test]
    fn test_refund_total_near_u64_max() {
        let gateway = InMemoryGateway::new(credentials());
        let builder = RequestBuilder::new(credentials(), "1.2.3.4");
        let send = |request: crate::application::builder::SignedRequest| {
            Transport::send(&gateway, request.remote_method(), &request.fields).unwrap()
        };

        let reply = send(builder.add_user(&card()).unwrap());
        let token = CardToken::new(reply.user_id().unwrap(), reply.user_token().unwrap());

        let everything = Decimal::from_i128_with_scale(u64::MAX as i128, 2);
        let charge = Charge::new(token.clone(), everything, "BIG");
        let reply = send(builder.execute_purchase(&charge).unwrap());
        assert_eq!(reply.amount(), Some("18446744073709551615"));
        let auth_code = reply.auth_code().unwrap().to_string();

        let cent = Refund::new(token.clone(), Decimal::new(1, 2), "BIG", auth_code.as_str());
        assert_eq!(send(builder.execute_refund(&cent).unwrap()).error_code().unwrap(), 0);

        let rest = Refund::new(token, everything, "BIG", auth_code.as_str());
        let reply = send(builder.execute_refund(&rest).unwrap());
        assert_eq!(reply.error_code().unwrap(), codes::REFUND_EXCEEDS_CHARGE);

        // The state lock is still usable afterwards.
        assert_eq!(gateway.card_count(), 1);
        assert_eq!(gateway.requests().len(), 4);
    }

    #[test]
    fn test_unknown_method_is_transport_error() {
        let gateway = InMemoryGateway::new(credentials());
        let result = Transport::send(&gateway, "execute_preauthorization", &FieldMap::new());
        assert!(matches!(result, Err(PaytpvError::TransportError(_))));
    }

    #[test]
    fn test_valid_expiry() {
        assert!(valid_expiry("0530"));
        assert!(valid_expiry("1299"));
        assert!(!valid_expiry("1330"));
        assert!(!valid_expiry("0030"));
        assert!(!valid_expiry("530"));
    }
}
