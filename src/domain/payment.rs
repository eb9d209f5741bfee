use super::card::CompleteCard;
use super::money::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Codes recorded on an order when a payment attempt fails before or
/// instead of reaching the gateway. Gateway declines carry the gateway's own
/// code.
pub mod codes {
    pub const ALREADY_PAID: &str = "already-paid";
    pub const MISSING_FIELDS: &str = "missing-fields";
    pub const INCORRECT_NUMBER: &str = "incorrect-number";
    pub const NO_PRODUCTS: &str = "no-products";
    pub const PRODUCT_NOT_FOUND: &str = "product-does-not-exist";
    pub const GATEWAY_UNREACHABLE: &str = "gateway-unreachable";
    pub const CARD_DECLINED: &str = "card-declined";
}

/// Outcome of the latest payment attempt on an order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: String,
    pub success: bool,
    pub amount_charged: Money,
    /// The failure row explaining an unsuccessful attempt.
    pub error: Option<Uuid>,
}

/// Why a payment attempt failed. Lives only as long as the transaction that
/// references it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PaymentFailure {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

impl PaymentFailure {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Body sent to the payment gateway.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ChargeRequest {
    pub credit_card: CompleteCard,
    pub amount_charged: Money,
}

/// Transaction as reported by the gateway on approval.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct GatewayTransaction {
    pub id: String,
    pub success: bool,
    pub amount_charged: Money,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ChargeOutcome {
    Approved(GatewayTransaction),
    Declined { code: String, name: String },
    /// Transport failure, timeout or an unintelligible gateway response.
    Unreachable(String),
}
