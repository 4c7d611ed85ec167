//! Request signatures.
//!
//! The gateway authenticates each request by recomputing a digest over a fixed,
//! operation-specific list of field values followed by the merchant secret.
//! Both variants here are pure functions of their inputs.

use crate::domain::credentials::Secret;
use crate::domain::fields::FieldMap;
use crate::error::{PaytpvError, Result};
use ring::digest::{SHA1_FOR_LEGACY_USE_ONLY, digest};

/// Concatenates the values of `order` as found in `fields`.
///
/// Every field must be present: a missing value would yield a signature that no
/// server accepts.
pub fn concat_fields(fields: &FieldMap, order: &[&str]) -> Result<String> {
    order.iter().try_fold(String::new(), |mut acc, name| {
        let value = fields
            .get(name)
            .ok_or_else(|| PaytpvError::MissingField((*name).to_string()))?;
        acc.push_str(value);
        Ok(acc)
    })
}

/// SHA-1 over the concatenated values followed by the raw secret, hex-encoded.
///
/// Used by every SOAP operation.
pub fn transaction_signature(fields: &FieldMap, order: &[&str], secret: &Secret) -> Result<String> {
    let mut payload = concat_fields(fields, order)?;
    payload.push_str(secret.expose());
    Ok(hex::encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, payload.as_bytes())))
}

/// MD5 over the concatenated values followed by MD5(secret), hex-encoded.
///
/// Only the hosted payment page uses this form.
pub fn redirect_signature(fields: &FieldMap, order: &[&str], secret: &Secret) -> Result<String> {
    let mut payload = concat_fields(fields, order)?;
    payload.push_str(&md5_hex(secret.expose()));
    Ok(md5_hex(&payload))
}

fn md5_hex(input: &str) -> String {
    hex::encode(md5::compute(input.as_bytes()).0)
}
