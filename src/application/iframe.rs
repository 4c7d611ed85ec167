//! Hosted payment page (operation 109, charge to an existing card token).

use super::builder::{CardToken, RequestBuilder};
use crate::domain::amount::{self, Amount, OrderId};
use crate::domain::fields::FieldMap;
use crate::domain::signature::redirect_signature;
use crate::error::Result;
use rust_decimal::Decimal;

/// Operation code of a charge to a stored card on the hosted page.
pub const OPERATION_CODE: &str = "109";

const MERCHANT_CODE: &str = "MERCHANT_MERCHANTCODE";
const TERMINAL: &str = "MERCHANT_TERMINAL";
const OPERATION: &str = "OPERATION";
const LANGUAGE: &str = "LANGUAGE";
const SIGNATURE: &str = "MERCHANT_MERCHANTSIGNATURE";
const ORDER: &str = "MERCHANT_ORDER";
const AMOUNT: &str = "MERCHANT_AMOUNT";
const CURRENCY: &str = "MERCHANT_CURRENCY";
const USER_ID: &str = "IDUSER";
const USER_TOKEN: &str = "TOKEN_USER";
const SECURE_3D: &str = "3DSECURE";
const URL_OK: &str = "URLOK";
const URL_KO: &str = "URLKO";

const SIGNED_FIELDS: [&str; 8] = [
    MERCHANT_CODE,
    USER_ID,
    USER_TOKEN,
    TERMINAL,
    OPERATION,
    ORDER,
    AMOUNT,
    CURRENCY,
];

#[derive(Debug, Clone, PartialEq)]
pub struct IframeRequest {
    pub card: CardToken,
    pub amount: Decimal,
    pub order: String,
    /// Page language, e.g. `ES`.
    pub language: String,
    /// Where the customer lands after a successful payment.
    pub url_ok: String,
    /// Where the customer lands after a failed payment.
    pub url_ko: String,
}

impl RequestBuilder {
    /// URL of the hosted payment page for `request`. 3-D Secure is always on.
    pub fn secure_iframe_url(&self, request: &IframeRequest) -> Result<String> {
        let amount = Amount::new(request.amount)?;
        let order = OrderId::new(request.order.as_str())?;
        let cents = amount.to_minor_units();
        let credentials = self.credentials();

        let mut signed = FieldMap::new();
        signed.insert(USER_ID, request.card.user_id.as_str());
        signed.insert(USER_TOKEN, request.card.user_token.as_str());
        signed.insert(OPERATION, OPERATION_CODE);
        signed.insert(ORDER, order.as_str());
        signed.insert(AMOUNT, cents.as_str());
        signed.insert(CURRENCY, amount::CURRENCY);
        signed.insert(MERCHANT_CODE, credentials.merchant_code.as_str());
        signed.insert(TERMINAL, credentials.terminal.as_str());
        let signature = redirect_signature(&signed, &SIGNED_FIELDS, &credentials.merchant_password)?;

        let params: [(&str, &str); 13] = [
            (MERCHANT_CODE, credentials.merchant_code.as_str()),
            (TERMINAL, credentials.terminal.as_str()),
            (OPERATION, OPERATION_CODE),
            (LANGUAGE, request.language.as_str()),
            (SIGNATURE, signature.as_str()),
            (ORDER, order.as_str()),
            (AMOUNT, cents.as_str()),
            (CURRENCY, amount::CURRENCY),
            (USER_ID, request.card.user_id.as_str()),
            (USER_TOKEN, request.card.user_token.as_str()),
            (SECURE_3D, "1"),
            (URL_OK, request.url_ok.as_str()),
            (URL_KO, request.url_ko.as_str()),
        ];
        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}?{query}", self.iframe_url))
    }

    /// HTML fragment embedding the hosted payment page.
    pub fn secure_iframe(&self, request: &IframeRequest) -> Result<String> {
        let url = self.secure_iframe_url(request)?;
        Ok(format!(
            concat!(
                r#"<iframe id="secure_iframe" title="Secure payment" allowtransparency="true" "#,
                r#"frameborder="0" style="background: #FFFFFF; width:100%; height:600px" "#,
                r#"src="{}"></iframe>"#
            ),
            url.replace('&', "&amp;")
        ))
    }
}
