//! # Costing Rules
//!
//! Pure cost math for the inventory ledger.
//!
//! ## Two Stock Models
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PHONES (serialized)                 ACCESSORIES (counted)              │
//! │                                                                         │
//! │  one row per unit                    one row per item type              │
//! │  cost = purchase + imei + repair     avg = Σ(qty·price) / Σ(qty)        │
//! │  recomputed before every persist     recomputed from FULL history       │
//! │                                      after every restock                │
//! │                                                                         │
//! │  The average is never updated incrementally: an incremental update      │
//! │  cannot recover from a deleted or corrected history row, a full         │
//! │  recompute always can.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::AccessoryPurchase;
use crate::validation::validate_amount;
use crate::ACCESSORY_CODE_WIDTH;

// =============================================================================
// Phone Cost
// =============================================================================

/// Computes a phone's composite cost price.
///
/// `cost = purchase + imei_registration + repair`
///
/// Each component must be non-negative. Callers recompute this before
/// every persist so a stale stored value can never survive an edit to
/// any component.
///
/// ## Example
/// ```rust
/// use savdo_core::costing::phone_cost_price;
/// use savdo_core::money::Money;
///
/// let cost = phone_cost_price(
///     Money::from_minor(200_00),
///     Money::from_minor(10_00),
///     Money::from_minor(15_00),
/// ).unwrap();
/// assert_eq!(cost.minor(), 225_00);
/// ```
pub fn phone_cost_price(purchase: Money, imei_cost: Money, repair: Money) -> CoreResult<Money> {
    validate_amount("purchase_price", purchase.minor())?;
    validate_amount("imei_cost", imei_cost.minor())?;
    validate_amount("repair_cost", repair.minor())?;

    Ok(purchase + imei_cost + repair)
}

// =============================================================================
// Accessory Moving Average
// =============================================================================

/// Computes the moving-average purchase price over a full restock history.
///
/// `avg = Σ(quantity × unit_price) / Σ(quantity)`, quantized to the
/// minor unit with round-half-up. Empty history yields zero.
pub fn moving_average(history: &[AccessoryPurchase]) -> Money {
    let total_qty: i64 = history.iter().map(|p| p.quantity).sum();
    if total_qty <= 0 {
        return Money::zero();
    }

    let total_value: Money = history.iter().map(|p| p.batch_value()).sum();
    total_value.div_round_half_up(total_qty)
}

// =============================================================================
// Accessory Codes
// =============================================================================

/// Produces the next accessory code after the given highest existing one.
///
/// Codes are numeric, zero-padded to 4 digits, sequential per shop.
/// `None` (empty shop) starts the sequence at "0001".
pub fn next_accessory_code(highest: Option<&str>) -> String {
    let next = highest
        .and_then(|c| c.trim().parse::<u32>().ok())
        .map_or(1, |n| n + 1);
    format!("{:0width$}", next, width = ACCESSORY_CODE_WIDTH)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn purchase(quantity: i64, unit_price_minor: i64) -> AccessoryPurchase {
        AccessoryPurchase {
            id: "ap".into(),
            accessory_id: "a1".into(),
            quantity,
            unit_price_minor,
            recorded_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_phone_cost_price_sums_components() {
        let cost = phone_cost_price(
            Money::from_minor(200_00),
            Money::from_minor(10_00),
            Money::from_minor(15_00),
        )
        .unwrap();
        assert_eq!(cost.minor(), 225_00);
    }

    #[test]
    fn test_phone_cost_price_zero_components_allowed() {
        let cost =
            phone_cost_price(Money::from_minor(100_00), Money::zero(), Money::zero()).unwrap();
        assert_eq!(cost.minor(), 100_00);
    }

    #[test]
    fn test_phone_cost_price_rejects_negative() {
        assert!(phone_cost_price(
            Money::from_minor(-1),
            Money::zero(),
            Money::zero()
        )
        .is_err());
        assert!(phone_cost_price(
            Money::from_minor(100),
            Money::zero(),
            Money::from_minor(-5)
        )
        .is_err());
    }

    #[test]
    fn test_moving_average_two_batches() {
        // 5 @ 1000.00 + 5 @ 2000.00 → 1500.00
        let history = vec![purchase(5, 1000_00), purchase(5, 2000_00)];
        assert_eq!(moving_average(&history).minor(), 1500_00);
    }

    #[test]
    fn test_moving_average_single_batch_is_unit_price() {
        let history = vec![purchase(7, 1234_56)];
        assert_eq!(moving_average(&history).minor(), 1234_56);
    }

    #[test]
    fn test_moving_average_empty_history_is_zero() {
        assert_eq!(moving_average(&[]), Money::zero());
    }

    #[test]
    fn test_moving_average_rounds_half_up() {
        // 2 units, total 10.01 → 5.005 → 5.01
        let history = vec![purchase(1, 5_00), purchase(1, 5_01)];
        assert_eq!(moving_average(&history).minor(), 5_01);

        // 3 units, total 10.00 → 3.333.. → 3.33
        let history = vec![purchase(1, 2_00), purchase(1, 4_00), purchase(1, 4_00)];
        assert_eq!(moving_average(&history).minor(), 3_33);
    }

    #[test]
    fn test_next_accessory_code() {
        assert_eq!(next_accessory_code(None), "0001");
        assert_eq!(next_accessory_code(Some("0001")), "0002");
        assert_eq!(next_accessory_code(Some("0099")), "0100");
        assert_eq!(next_accessory_code(Some("9999")), "10000");
    }
}
