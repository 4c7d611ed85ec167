use serde::Deserialize;
use std::fmt;

/// A string that must never reach logs or debug output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Gateway-assigned identity of the merchant.
///
/// Loaded once when a client is constructed and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantCredentials {
    pub merchant_code: String,
    pub merchant_password: Secret,
    pub terminal: String,
}

impl MerchantCredentials {
    pub fn new(
        merchant_code: impl Into<String>,
        merchant_password: impl Into<Secret>,
        terminal: impl Into<String>,
    ) -> Self {
        Self {
            merchant_code: merchant_code.into(),
            merchant_password: merchant_password.into(),
            terminal: terminal.into(),
        }
    }
}
