#![allow(dead_code)]

use paytpv::domain::credentials::MerchantCredentials;
use paytpv::infrastructure::in_memory::InMemoryGateway;
use paytpv::{CardDetails, GatewayConfig};
use rand::Rng;

pub const T1: &str = "4539232076648253";
pub const T2: &str = "5445288852200883";
pub const T3: &str = "6011454638812167";

pub const NAME: &str = "Test Shop";
pub const CVV: &str = "123";
pub const EXPIRY: &str = "0530";
pub const IP: &str = "62.83.129.18";

pub fn config() -> GatewayConfig {
    GatewayConfig::new("1", "pw", "4")
}

pub fn credentials() -> MerchantCredentials {
    config().credentials()
}

pub fn gateway() -> InMemoryGateway {
    InMemoryGateway::new(credentials())
}

pub fn card(pan: &str) -> CardDetails {
    CardDetails {
        pan: pan.to_string(),
        expiry_date: EXPIRY.to_string(),
        cvv: CVV.to_string(),
        cardholder_name: NAME.to_string(),
    }
}

/// A fresh order id, short enough for the gateway.
pub fn random_order() -> String {
    let n: u64 = rand::thread_rng().gen_range(0..10_000_000_000);
    format!("ORD{n:010}")
}
