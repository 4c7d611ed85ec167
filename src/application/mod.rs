//! Application layer: request assembly and dispatch.
//!
//! [`builder::RequestBuilder`] turns operation arguments into signed field
//! mappings without any I/O. [`client::GatewayClient`] and
//! [`client::AsyncGatewayClient`] send those mappings through a transport and
//! turn non-zero gateway codes into errors.

pub mod builder;
pub mod client;
pub mod iframe;
