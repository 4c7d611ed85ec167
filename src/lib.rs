//! Client library for the PayTPV (PAYCOMET) BankStore SOAP gateway.
//!
//! The crate builds and signs the flat field mappings the gateway expects,
//! hands them to a caller-supplied transport and maps non-zero gateway codes to
//! [`error::PaytpvError::GatewayError`]. It also builds the hosted payment page
//! iframe for 3-D Secure charges.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

pub use application::builder::{CardDetails, CardToken, Charge, OperationCall, Refund, RequestBuilder, SignedRequest};
pub use application::client::{AsyncGatewayClient, GatewayClient};
pub use application::iframe::IframeRequest;
pub use config::GatewayConfig;
pub use domain::fields::{CardInfo, FieldMap, OperationReply};
pub use domain::operation::Operation;
pub use domain::ports::{AsyncTransport, Transport};
pub use error::{PaytpvError, Result};
