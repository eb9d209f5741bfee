use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw card data as submitted by a client.
///
/// Every field is optional at this stage: presence is checked by the payment
/// job so that an incomplete card becomes a recorded `missing-fields` failure
/// rather than a rejected request. The number and CVV are consumed by the
/// gateway call and never stored on the order; only a queued `PaymentJob`
/// carries them.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPayload {
    pub name: Option<String>,
    pub number: Option<String>,
    pub expiration_month: Option<u32>,
    pub expiration_year: Option<u32>,
    pub cvv: Option<String>,
}

/// Card data with every field the gateway requires.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteCard {
    pub name: String,
    pub number: String,
    pub expiration_month: u32,
    pub expiration_year: u32,
    pub cvv: String,
}

impl CardPayload {
    pub fn complete(&self) -> Option<CompleteCard> {
        Some(CompleteCard {
            name: self.name.clone()?,
            number: self.number.clone()?,
            expiration_month: self.expiration_month?,
            expiration_year: self.expiration_year?,
            cvv: self.cvv.clone()?,
        })
    }
}

fn mask(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(|c| c.is_ascii_digit()).collect();
    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("****{}", tail)
}

impl fmt::Debug for CardPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardPayload")
            .field("name", &self.name)
            .field("number", &self.number.as_deref().map(mask))
            .field("expiration_month", &self.expiration_month)
            .field("expiration_year", &self.expiration_year)
            .field("cvv", &self.cvv.as_ref().map(|_| "***"))
            .finish()
    }
}

impl fmt::Debug for CompleteCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompleteCard")
            .field("name", &self.name)
            .field("number", &mask(&self.number))
            .field("expiration_month", &self.expiration_month)
            .field("expiration_year", &self.expiration_year)
            .field("cvv", &"***")
            .finish()
    }
}
