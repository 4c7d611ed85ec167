use crate::error::{PaytpvError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

/// Maximum length of a merchant order identifier, in characters.
pub const MAX_ORDER_LEN: usize = 20;
/// Maximum length of a product description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 40;
/// The only currency the gateway account is configured for.
pub const CURRENCY: &str = "EUR";

/// A strictly positive monetary amount in currency units (euros).
///
/// Amounts are rounded half-up to cents before they leave the process, so an
/// amount that rounds to zero cents is rejected as well.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount {
    value: Decimal,
    cents: Decimal,
}

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(PaytpvError::validation(format!(
                "Amount must be positive: {value}"
            )));
        }
        let cents = value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| PaytpvError::validation(format!("Amount is too large: {value}")))?
            .trunc()
            .normalize();
        if cents <= Decimal::ZERO {
            return Err(PaytpvError::validation(format!(
                "Amount must be at least one cent: {value}"
            )));
        }
        Ok(Self { value, cents })
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// The amount in minor units as a plain digit string, e.g. `33` becomes `"3300"`.
    pub fn to_minor_units(&self) -> String {
        self.cents.to_string()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaytpvError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value
    }
}

/// Merchant-side identifier of a payment, unique per charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(PaytpvError::validation("Order must not be empty"));
        }
        if value.chars().count() > MAX_ORDER_LEN {
            return Err(PaytpvError::validation(format!(
                "Order is longer than {MAX_ORDER_LEN} characters: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text product description shown to the cardholder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Description(String);

impl Description {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(PaytpvError::validation(format!(
                "Description is longer than {MAX_DESCRIPTION_LEN} characters: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
