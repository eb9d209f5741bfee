use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, stable identifier of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one acquisition of an order's payment lock. The job queued
/// under a lock carries its token, so a job whose lock was reclaimed cannot
/// release the lock of its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockToken(pub Uuid);

impl LockToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LockToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A line requested by a client at order creation, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: u64,
    pub quantity: i64,
}

/// A validated line of an order. Immutable once the order exists.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct OrderLine {
    pub product_id: u64,
    pub quantity: u32,
}

impl OrderLine {
    pub fn try_from_item(item: LineItem) -> Result<Self> {
        u32::try_from(item.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .map(|quantity| Self {
                product_id: item.product_id,
                quantity,
            })
            .ok_or(OrderError::InvalidQuantity(item.quantity))
    }
}

/// Length every postal code must have, e.g. `G7H 1Z4`.
pub const POSTAL_CODE_LEN: usize = 7;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct ShippingInfo {
    pub country: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
}

impl ShippingInfo {
    pub fn validate(&self) -> Result<()> {
        if self.postal_code.chars().count() != POSTAL_CODE_LEN {
            return Err(OrderError::InvalidFields(format!(
                "postal code must be {} characters, got '{}'",
                POSTAL_CODE_LEN, self.postal_code
            )));
        }
        Ok(())
    }
}

/// The stored trace of a successfully charged card. Never holds the full
/// number or the CVV.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct CreditCard {
    pub name: String,
    pub first_digits: String,
    pub last_digits: String,
    pub expiration_month: u32,
    pub expiration_year: u32,
}

impl CreditCard {
    pub fn truncated(name: &str, number: &str, expiration_month: u32, expiration_year: u32) -> Self {
        let digits: Vec<char> = number.chars().filter(|c| c.is_ascii_digit()).collect();
        let first_digits = digits.iter().take(4).collect();
        let last_digits = digits[digits.len().saturating_sub(4)..].iter().collect();
        Self {
            name: name.to_string(),
            first_digits,
            last_digits,
            expiration_month,
            expiration_year,
        }
    }
}

/// An order and its exclusively owned parts.
///
/// `pending` is the payment lock: it is set by a successful payment
/// submission and cleared when the payment job records its outcome.
/// `paid` is terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: OrderId,
    pub lines: Vec<OrderLine>,
    pub shipping_info: Option<ShippingInfo>,
    pub email: Option<String>,
    pub paid: bool,
    pub pending: bool,
    /// When the current lock was taken.
    #[serde(default)]
    pub pending_since: Option<DateTime<Utc>>,
    /// Token of the current lock.
    #[serde(default)]
    pub lock_token: Option<LockToken>,
    pub credit_card: Option<CreditCard>,
    /// Identifier of the order's current transaction, if any.
    pub transaction: Option<String>,
}

impl Order {
    pub fn new(id: OrderId, lines: Vec<OrderLine>) -> Self {
        Self {
            id,
            lines,
            shipping_info: None,
            email: None,
            paid: false,
            pending: false,
            pending_since: None,
            lock_token: None,
            credit_card: None,
            transaction: None,
        }
    }

    pub fn has_customer_info(&self) -> bool {
        self.email.is_some() && self.shipping_info.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping(postal_code: &str) -> ShippingInfo {
        ShippingInfo {
            country: "Canada".into(),
            address: "201, rue Président-Kennedy".into(),
            postal_code: postal_code.into(),
            city: "Chicoutimi".into(),
            province: "QC".into(),
        }
    }

    #[test]
    fn test_line_quantity_must_be_positive() {
        let line = OrderLine::try_from_item(LineItem { product_id: 1, quantity: 2 }).unwrap();
        assert_eq!(line.quantity, 2);

        assert!(matches!(
            OrderLine::try_from_item(LineItem { product_id: 1, quantity: 0 }),
            Err(OrderError::InvalidQuantity(0))
        ));
        assert!(matches!(
            OrderLine::try_from_item(LineItem { product_id: 1, quantity: -4 }),
            Err(OrderError::InvalidQuantity(-4))
        ));
    }

    #[test]
    fn test_postal_code_length() {
        assert!(shipping("G7X 3Y7").validate().is_ok());
        assert!(matches!(
            shipping("G7X3Y7").validate(),
            Err(OrderError::InvalidFields(_))
        ));
    }

    #[test]
    fn test_card_keeps_only_edges() {
        let card = CreditCard::truncated("John Doe", "4242 4242 4242 4242", 9, 2030);
        assert_eq!(card.first_digits, "4242");
        assert_eq!(card.last_digits, "4242");

        let card = CreditCard::truncated("John Doe", "4000 0000 0000 0002", 9, 2030);
        assert_eq!(card.first_digits, "4000");
        assert_eq!(card.last_digits, "0002");
    }

    #[test]
    fn test_new_order_is_unlocked_and_unpaid() {
        let order = Order::new(OrderId(1), vec![]);
        assert!(!order.paid);
        assert!(!order.pending);
        assert!(order.lock_token.is_none());
        assert!(!order.has_customer_info());
    }
}
