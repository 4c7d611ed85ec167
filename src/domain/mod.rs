//! Gateway vocabulary: credentials, amounts, field mappings, the operation
//! table, signatures and the transport ports.

pub mod amount;
pub mod credentials;
pub mod fields;
pub mod operation;
pub mod ports;
pub mod signature;
