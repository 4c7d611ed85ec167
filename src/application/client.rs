use super::builder::{CardDetails, CardToken, Charge, OperationCall, Refund, RequestBuilder, SignedRequest};
use super::iframe::IframeRequest;
use crate::config::GatewayConfig;
use crate::domain::fields::OperationReply;
use crate::domain::operation::Operation;
use crate::domain::ports::{AsyncTransport, Transport};
use crate::error::{PaytpvError, Result};
use tracing::{instrument, warn};

/// Checks the reply's error indicator. Shared by both call paths.
fn interpret_reply(operation: Operation, reply: OperationReply) -> Result<OperationReply> {
    let code = reply.error_code()?;
    if code != 0 {
        warn!(%operation, code, "gateway rejected operation");
        return Err(PaytpvError::GatewayError { code });
    }
    Ok(reply)
}

/// Blocking client for the gateway.
///
/// Each call builds its own request from immutable credentials, so a shared
/// reference can be used from many threads at once.
pub struct GatewayClient<T> {
    builder: RequestBuilder,
    transport: T,
}

impl<T: Transport> GatewayClient<T> {
    /// Creates a new `GatewayClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Merchant settings.
    /// * `ip` - IP address of the end customer.
    /// * `transport` - Blocking SOAP transport bound to the gateway's WSDL.
    pub fn new(config: &GatewayConfig, ip: impl Into<String>, transport: T) -> Self {
        Self::with_builder(RequestBuilder::from_config(config, ip), transport)
    }

    pub fn with_builder(builder: RequestBuilder, transport: T) -> Self {
        Self { builder, transport }
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds, sends and checks one operation.
    ///
    /// Validation failures return before the transport is touched. A non-zero
    /// `DS_ERROR_ID` becomes [`PaytpvError::GatewayError`].
    #[instrument(skip_all, fields(operation = %call.operation(), order = call.order()))]
    pub fn execute(&self, call: &OperationCall) -> Result<OperationReply> {
        let request = self.builder.build(call)?;
        self.dispatch(request)
    }

    fn dispatch(&self, request: SignedRequest) -> Result<OperationReply> {
        let reply = self
            .transport
            .send(request.remote_method(), &request.fields)?;
        interpret_reply(request.operation, reply)
    }

    /// Tokenizes a card. The reply carries `DS_IDUSER` and `DS_TOKEN_USER`.
    pub fn add_user(&self, card: &CardDetails) -> Result<OperationReply> {
        self.execute(&OperationCall::AddUser(card.clone()))
    }

    pub fn info_user(&self, token: &CardToken) -> Result<OperationReply> {
        self.execute(&OperationCall::InfoUser(token.clone()))
    }

    pub fn remove_user(&self, token: &CardToken) -> Result<OperationReply> {
        self.execute(&OperationCall::RemoveUser(token.clone()))
    }

    pub fn execute_purchase(&self, charge: &Charge) -> Result<OperationReply> {
        self.execute(&OperationCall::ExecutePurchase(charge.clone()))
    }

    pub fn execute_refund(&self, refund: &Refund) -> Result<OperationReply> {
        self.execute(&OperationCall::ExecuteRefund(refund.clone()))
    }

    /// Builds the hosted payment page fragment. No network access.
    pub fn secure_iframe(&self, request: &IframeRequest) -> Result<String> {
        self.builder.secure_iframe(request)
    }
}

/// Non-blocking client for the gateway.
///
/// Calls do not serialize on the client: any number may be in flight against
/// the same transport. Dropping a pending call only stops waiting for it; the
/// remote side effect may still happen.
pub struct AsyncGatewayClient<T> {
    builder: RequestBuilder,
    transport: T,
}

impl<T: AsyncTransport> AsyncGatewayClient<T> {
    pub fn new(config: &GatewayConfig, ip: impl Into<String>, transport: T) -> Self {
        Self::with_builder(RequestBuilder::from_config(config, ip), transport)
    }

    pub fn with_builder(builder: RequestBuilder, transport: T) -> Self {
        Self { builder, transport }
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[instrument(skip_all, fields(operation = %call.operation(), order = call.order()))]
    pub async fn execute(&self, call: &OperationCall) -> Result<OperationReply> {
        let request = self.builder.build(call)?;
        let reply = self
            .transport
            .send(request.remote_method(), &request.fields)
            .await?;
        interpret_reply(request.operation, reply)
    }

    pub async fn add_user(&self, card: &CardDetails) -> Result<OperationReply> {
        self.execute(&OperationCall::AddUser(card.clone())).await
    }

    pub async fn info_user(&self, token: &CardToken) -> Result<OperationReply> {
        self.execute(&OperationCall::InfoUser(token.clone())).await
    }

    pub async fn remove_user(&self, token: &CardToken) -> Result<OperationReply> {
        self.execute(&OperationCall::RemoveUser(token.clone())).await
    }

    pub async fn execute_purchase(&self, charge: &Charge) -> Result<OperationReply> {
        self.execute(&OperationCall::ExecutePurchase(charge.clone()))
            .await
    }

    pub async fn execute_refund(&self, refund: &Refund) -> Result<OperationReply> {
        self.execute(&OperationCall::ExecuteRefund(refund.clone()))
            .await
    }

    pub fn secure_iframe(&self, request: &IframeRequest) -> Result<String> {
        self.builder.secure_iframe(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fields::{ERROR_ID, FieldMap, USER_ID};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Replies with a fixed mapping and remembers what it was asked.
    struct CannedTransport {
        reply: OperationReply,
        calls: Mutex<Vec<String>>,
    }

    impl CannedTransport {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                reply: pairs.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for CannedTransport {
        fn send(&self, method: &str, _fields: &FieldMap) -> Result<OperationReply> {
            self.calls.lock().unwrap().push(method.to_string());
            Ok(self.reply.clone())
        }
    }

    #[async_trait]
    impl AsyncTransport for CannedTransport {
        async fn send(&self, method: &str, fields: &FieldMap) -> Result<OperationReply> {
            Transport::send(self, method, fields)
        }
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn config() -> GatewayConfig {
        GatewayConfig::new("1", "pw", "4")
    }

    #[test]
    fn test_zero_error_code_returns_reply_unchanged() {
        let transport = CannedTransport::new(&[(ERROR_ID, "0"), (USER_ID, "10")]);
        let client = GatewayClient::new(&config(), "1.2.3.4", transport);

        let reply = client.info_user(&CardToken::new("10", "tok")).unwrap();
        assert_eq!(reply.user_id(), Some("10"));
        assert_eq!(client.transport().calls(), vec!["info_user"]);
    }

    #[test]
    fn test_non_zero_error_code_raises_gateway_error() {
        let transport = CannedTransport::new(&[(ERROR_ID, "1001")]);
        let client = GatewayClient::new(&config(), "1.2.3.4", transport);

        let err = client
            .remove_user(&CardToken::new("0", "0"))
            .unwrap_err();
        assert_eq!(err.code(), Some(1001));
    }

    #[test]
    fn test_validation_error_never_reaches_transport() {
        let transport = CannedTransport::new(&[(ERROR_ID, "0")]);
        let client = GatewayClient::new(&config(), "1.2.3.4", transport);

        let charge = Charge::new(CardToken::new("10", "tok"), dec!(0), "ORD1");
        assert!(matches!(
            client.execute_purchase(&charge),
            Err(PaytpvError::ValidationError(_))
        ));
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_async_path_shares_error_contract() {
        let ok = AsyncGatewayClient::new(
            &config(),
            "1.2.3.4",
            CannedTransport::new(&[(ERROR_ID, "0")]),
        );
        assert!(ok.info_user(&CardToken::new("10", "tok")).await.is_ok());

        let failing = AsyncGatewayClient::new(
            &config(),
            "1.2.3.4",
            CannedTransport::new(&[(ERROR_ID, "130")]),
        );
        let err = failing
            .execute_purchase(&Charge::new(CardToken::new("10", "tok"), dec!(5), "ORD2"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaytpvError::GatewayError { code: 130 }));
    }

    #[test]
    fn test_missing_error_code_is_invalid_reply() {
        let client = GatewayClient::new(&config(), "1.2.3.4", CannedTransport::new(&[]));
        assert!(matches!(
            client.info_user(&CardToken::new("10", "tok")),
            Err(PaytpvError::InvalidReply(_))
        ));
    }

    #[test]
    fn test_rejection_is_logged_with_order() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let client = GatewayClient::new(
            &config(),
            "1.2.3.4",
            CannedTransport::new(&[(ERROR_ID, "130")]),
        );
        tracing::subscriber::with_default(subscriber, || {
            let charge = Charge::new(CardToken::new("10", "tok"), dec!(5), "ORD-LOG");
            assert!(client.execute_purchase(&charge).is_err());
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("gateway rejected operation"));
        assert!(output.contains("operation=execute_purchase"));
        assert!(output.contains("ORD-LOG"));
    }
}
