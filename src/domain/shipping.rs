use super::money::Money;

/// Heaviest total weight (exclusive) billed at the light tier.
pub const LIGHT_LIMIT: u64 = 500;
/// Heaviest total weight (exclusive) billed at the medium tier.
pub const MEDIUM_LIMIT: u64 = 2000;

/// Shipping fee for a parcel of the given total weight.
pub fn shipping_price(total_weight: u64) -> Money {
    if total_weight < LIGHT_LIMIT {
        Money::from_units(5)
    } else if total_weight < MEDIUM_LIMIT {
        Money::from_units(10)
    } else {
        Money::from_units(25)
    }
}
