use super::money::Money;
use serde::{Deserialize, Serialize};

/// A catalog entry as seen by the ordering workflow.
///
/// Only `price`, `weight` and `in_stock` matter to the workflow; the
/// descriptive fields are carried along so a loaded catalog round-trips.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub height: u64,
    /// Weight in grams.
    pub weight: u64,
    pub price: Money,
    #[serde(default)]
    pub in_stock: bool,
}

impl Product {
    /// Removes the NUL padding some catalog feeds leave in text fields.
    pub fn sanitize(mut self) -> Self {
        for field in [
            &mut self.name,
            &mut self.r#type,
            &mut self.description,
            &mut self.image,
        ] {
            *field = field.trim_matches('\0').to_string();
        }
        self
    }
}
