use super::fields::{FieldMap, OperationReply};
use crate::error::Result;
use async_trait::async_trait;

/// Blocking round trip to the gateway's SOAP service.
///
/// `method` is the remote operation name (e.g. `execute_purchase`). The
/// implementation owns connectivity, WSDL handling and timeouts, and reports
/// its own failures as [`crate::error::PaytpvError::TransportError`].
pub trait Transport: Send + Sync {
    fn send(&self, method: &str, fields: &FieldMap) -> Result<OperationReply>;
}

/// Non-blocking counterpart of [`Transport`].
///
/// Implementations must accept many in-flight calls at once.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn send(&self, method: &str, fields: &FieldMap) -> Result<OperationReply>;
}

pub type TransportBox = Box<dyn Transport>;
pub type AsyncTransportBox = Box<dyn AsyncTransport>;

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, method: &str, fields: &FieldMap) -> Result<OperationReply> {
        (**self).send(method, fields)
    }
}

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for Box<T> {
    async fn send(&self, method: &str, fields: &FieldMap) -> Result<OperationReply> {
        (**self).send(method, fields).await
    }
}
