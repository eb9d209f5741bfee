use super::money::Money;
use super::order::{CreditCard, OrderId, ShippingInfo};
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// The fully assembled, client-facing representation of an order.
///
/// Absent parts render as `{}` rather than `null`, and the payment lock is
/// never exposed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderView {
    pub id: OrderId,
    pub email: Option<String>,
    pub paid: bool,
    pub products: Vec<ProductLine>,
    pub total_price: Money,
    pub shipping_price: Money,
    #[serde(serialize_with = "empty_when_none", deserialize_with = "none_when_empty")]
    pub shipping_info: Option<ShippingInfo>,
    #[serde(serialize_with = "empty_when_none", deserialize_with = "none_when_empty")]
    pub credit_card: Option<CreditCard>,
    #[serde(serialize_with = "empty_when_none", deserialize_with = "none_when_empty")]
    pub transaction: Option<TransactionView>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct ProductLine {
    pub id: u64,
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionView {
    pub id: String,
    pub success: bool,
    pub amount_charged: Money,
    #[serde(serialize_with = "empty_when_none", deserialize_with = "none_when_empty")]
    pub error: Option<FailureView>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct FailureView {
    pub code: String,
    pub name: String,
}

impl OrderView {
    /// A view is terminal once its transaction succeeded; it never changes
    /// afterwards.
    pub fn is_terminal(&self) -> bool {
        self.transaction.as_ref().is_some_and(|t| t.success)
    }
}

fn empty_when_none<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

fn none_when_empty<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: DeserializeOwned,
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) if map.is_empty() => Ok(None),
        _ => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
