//! Field names and the two flat mappings exchanged with the gateway.
//!
//! Outbound requests are a [`FieldMap`] whose insertion order is preserved.
//! Replies are an [`OperationReply`] keyed by field name.

use crate::error::{PaytpvError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MERCHANT_CODE: &str = "DS_MERCHANT_MERCHANTCODE";
pub const TERMINAL: &str = "DS_MERCHANT_TERMINAL";
pub const ORIGINAL_IP: &str = "DS_ORIGINAL_IP";
pub const SIGNATURE: &str = "DS_MERCHANT_MERCHANTSIGNATURE";

pub const PAN: &str = "DS_MERCHANT_PAN";
pub const EXPIRY_DATE: &str = "DS_MERCHANT_EXPIRYDATE";
pub const CVV: &str = "DS_MERCHANT_CVV2";
pub const CARDHOLDER_NAME: &str = "DS_MERCHANT_CARDHOLDERNAME";

pub const USER_ID: &str = "DS_IDUSER";
pub const USER_TOKEN: &str = "DS_TOKEN_USER";

pub const AMOUNT: &str = "DS_MERCHANT_AMOUNT";
pub const ORDER: &str = "DS_MERCHANT_ORDER";
pub const CURRENCY: &str = "DS_MERCHANT_CURRENCY";
pub const PRODUCT_DESCRIPTION: &str = "DS_MERCHANT_PRODUCTDESCRIPTION";
pub const OWNER: &str = "DS_MERCHANT_OWNER";
pub const SCORING: &str = "DS_MERCHANT_SCORING";
pub const MERCHANT_DATA: &str = "DS_MERCHANT_DATA";
pub const MERCHANT_DESCRIPTOR: &str = "DS_MERCHANT_MERCHANTDESCRIPTOR";
pub const AUTH_CODE: &str = "DS_MERCHANT_AUTHCODE";

pub const ERROR_ID: &str = "DS_ERROR_ID";
pub const RESPONSE: &str = "DS_RESPONSE";
pub const EXPIRY: &str = "DS_EXPIRYDATE";
pub const CARD_BRAND: &str = "DS_CARD_BRAND";
pub const CARD_TYPE: &str = "DS_CARD_TYPE";
pub const CARD_COUNTRY_ISO3: &str = "DS_CARD_I_COUNTRY_ISO3";
pub const CARD_HASH: &str = "DS_CARD_HASH";
pub const CARD_CATEGORY: &str = "DS_CARD_CATEGORY";

/// Values that are masked when a [`FieldMap`] is debug-printed.
const SENSITIVE: [&str; 2] = [PAN, CVV];

/// An ordered mapping from field name to string value.
///
/// Inserting an existing key replaces its value in place. Equality compares
/// entries in order.
#[derive(Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FieldMap(IndexMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for FieldMap {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().eq(other.0.iter())
    }
}

impl Eq for FieldMap {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Debug for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            if SENSITIVE.contains(&k) {
                map.entry(&k, &"***");
            } else {
                map.entry(&k, &v);
            }
        }
        map.finish()
    }
}

/// The flat mapping returned by a remote operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationReply(BTreeMap<String, String>);

impl OperationReply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Parses `DS_ERROR_ID`. Zero means success.
    pub fn error_code(&self) -> Result<i64> {
        let raw = self
            .get(ERROR_ID)
            .ok_or_else(|| PaytpvError::InvalidReply(format!("{ERROR_ID} is missing")))?;
        raw.trim().parse::<i64>().map_err(|_| {
            PaytpvError::InvalidReply(format!("{ERROR_ID} is not an integer: {raw}"))
        })
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID)
    }

    pub fn user_token(&self) -> Option<&str> {
        self.get(USER_TOKEN)
    }

    pub fn auth_code(&self) -> Option<&str> {
        self.get(AUTH_CODE)
    }

    /// Amount echoed by the gateway, in minor units.
    pub fn amount(&self) -> Option<&str> {
        self.get(AMOUNT)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OperationReply {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Card metadata returned by the fetch-card-info operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardInfo {
    /// Masked card number, e.g. `453923-XX-XXXX-8253`.
    pub pan: String,
    pub brand: Option<String>,
    pub card_type: Option<String>,
    pub country_iso3: Option<String>,
    /// `YYYY/MM`.
    pub expiry_date: Option<String>,
    pub hash: Option<String>,
    pub category: Option<String>,
}

impl CardInfo {
    pub fn from_reply(reply: &OperationReply) -> Result<Self> {
        let owned = |key: &str| reply.get(key).map(str::to_owned);
        let pan = owned(PAN)
            .ok_or_else(|| PaytpvError::InvalidReply(format!("{PAN} is missing")))?;
        Ok(Self {
            pan,
            brand: owned(CARD_BRAND),
            card_type: owned(CARD_TYPE),
            country_iso3: owned(CARD_COUNTRY_ISO3),
            expiry_date: owned(EXPIRY),
            hash: owned(CARD_HASH),
            category: owned(CARD_CATEGORY),
        })
    }
}
