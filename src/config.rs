use crate::domain::credentials::{MerchantCredentials, Secret};
use crate::error::{PaytpvError, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_GATEWAY_URL: &str = "https://secure.paytpv.com/gateway/xml-bankstore";
pub const DEFAULT_WSDL_URL: &str = "https://secure.paytpv.com/gateway/xml-bankstore?wsdl";
pub const DEFAULT_IFRAME_URL: &str = "https://secure.paytpv.com/gateway/bnkgateway.php";

/// Merchant settings handed to a client at construction.
///
/// Nothing in the crate reads process-wide state after this is built.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub merchant_code: String,
    pub merchant_password: Secret,
    pub merchant_terminal: String,
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default = "default_wsdl_url")]
    pub wsdl_url: String,
    #[serde(default = "default_iframe_url")]
    pub iframe_url: String,
    /// Sent as `DS_MERCHANT_OWNER` on charges.
    #[serde(default)]
    pub merchant_owner: String,
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_wsdl_url() -> String {
    DEFAULT_WSDL_URL.to_string()
}

fn default_iframe_url() -> String {
    DEFAULT_IFRAME_URL.to_string()
}

impl GatewayConfig {
    pub fn new(
        merchant_code: impl Into<String>,
        merchant_password: impl Into<Secret>,
        merchant_terminal: impl Into<String>,
    ) -> Self {
        Self {
            merchant_code: merchant_code.into(),
            merchant_password: merchant_password.into(),
            merchant_terminal: merchant_terminal.into(),
            gateway_url: default_gateway_url(),
            wsdl_url: default_wsdl_url(),
            iframe_url: default_iframe_url(),
            merchant_owner: String::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reads `MERCHANTCODE`, `MERCHANTPASSWORD` and `MERCHANTTERMINAL`, plus the
    /// optional `PAYTPVURL`, `PAYTPVWSDL`, `PAYTPVIFRAMEURL` and `PAYTPVOWNER`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| PaytpvError::ConfigError(format!("{key} is not set")))
        };
        let config = Self {
            merchant_code: required("MERCHANTCODE")?,
            merchant_password: Secret::new(required("MERCHANTPASSWORD")?),
            merchant_terminal: required("MERCHANTTERMINAL")?,
            gateway_url: lookup("PAYTPVURL").unwrap_or_else(default_gateway_url),
            wsdl_url: lookup("PAYTPVWSDL").unwrap_or_else(default_wsdl_url),
            iframe_url: lookup("PAYTPVIFRAMEURL").unwrap_or_else(default_iframe_url),
            merchant_owner: lookup("PAYTPVOWNER").unwrap_or_default(),
        };
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.merchant_code.trim().is_empty() {
            return Err(PaytpvError::ConfigError("merchant code is empty".to_string()));
        }
        if self.merchant_password.is_empty() {
            return Err(PaytpvError::ConfigError(
                "merchant password is empty".to_string(),
            ));
        }
        if self.merchant_terminal.trim().is_empty() {
            return Err(PaytpvError::ConfigError(
                "merchant terminal is empty".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn credentials(&self) -> MerchantCredentials {
        MerchantCredentials::new(
            self.merchant_code.clone(),
            self.merchant_password.clone(),
            self.merchant_terminal.clone(),
        )
    }
}
