//! # Cash Flow Derivation
//!
//! Turns business events into signed cash-flow entries.
//!
//! ## One Event, One Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Event                      Entry (signed, event currency)             │
//! │  ─────────────────────      ──────────────────────────────             │
//! │  phone sale                 + cash received          (USD)             │
//! │  accessory sale             + cash received          (som)             │
//! │  exchange, customer pays    + price difference       (USD)             │
//! │  exchange, shop pays        - price difference       (USD)             │
//! │  phone return               - refund                 (USD)             │
//! │  daily-seller payout        - payout                 (USD)             │
//! │  expense                    - amount                 (som)             │
//! │  supplier payment (cash)    - amount                 (USD)             │
//! │  supplier payment (safe)    (none - internal move)                     │
//! │  any zero-cash event        (none)                                     │
//! │                                                                         │
//! │  The SIGN is the direction. Reports sum signs; they never re-derive    │
//! │  direction from the kind.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{CashFlowKind, CashFlowTransaction, Currency, PaymentSource};

// =============================================================================
// Planned Entry
// =============================================================================

/// A cash-flow entry derived from an event but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedCashFlow {
    pub shop_id: String,
    pub kind: CashFlowKind,
    pub currency: Currency,
    /// Signed: positive in, negative out.
    pub amount_minor: i64,
    /// Realized margin for sale-type entries.
    pub profit_minor: Option<i64>,
    pub origin_id: String,
    pub occurred_on: NaiveDate,
    pub description: Option<String>,
}

// =============================================================================
// Events
// =============================================================================

/// A mutating business event the cash-flow ledger derives from.
///
/// Amounts are gross and non-negative; the derivation applies the sign.
#[derive(Debug, Clone)]
pub enum CashFlowEvent<'a> {
    PhoneSale {
        shop_id: &'a str,
        origin_id: &'a str,
        cash_received: Money,
        profit: Money,
        occurred_on: NaiveDate,
        description: Option<&'a str>,
    },
    AccessorySale {
        shop_id: &'a str,
        origin_id: &'a str,
        cash_received: Money,
        profit: Money,
        occurred_on: NaiveDate,
        description: Option<&'a str>,
    },
    Exchange {
        shop_id: &'a str,
        origin_id: &'a str,
        /// Absolute price difference between the two units.
        difference: Money,
        /// true: customer tops up (cash in); false: shop pays out.
        customer_pays: bool,
        occurred_on: NaiveDate,
        description: Option<&'a str>,
    },
    PhoneReturn {
        shop_id: &'a str,
        origin_id: &'a str,
        refund: Money,
        occurred_on: NaiveDate,
        description: Option<&'a str>,
    },
    DailySellerPayment {
        shop_id: &'a str,
        origin_id: &'a str,
        payout: Money,
        occurred_on: NaiveDate,
        description: Option<&'a str>,
    },
    Expense {
        shop_id: &'a str,
        origin_id: &'a str,
        amount: Money,
        occurred_on: NaiveDate,
        description: Option<&'a str>,
    },
    SupplierPayment {
        shop_id: &'a str,
        origin_id: &'a str,
        amount: Money,
        source: PaymentSource,
        occurred_on: NaiveDate,
        description: Option<&'a str>,
    },
}

/// Derives the cash-flow entry for an event.
///
/// Returns `None` when the event moves no cash (zero amounts, safe-source
/// supplier payments). Callers treat `None` on update as "delete the
/// existing entry".
pub fn derive_transaction(event: &CashFlowEvent<'_>) -> Option<PlannedCashFlow> {
    let planned = match *event {
        CashFlowEvent::PhoneSale {
            shop_id,
            origin_id,
            cash_received,
            profit,
            occurred_on,
            description,
        } => PlannedCashFlow {
            shop_id: shop_id.to_string(),
            kind: CashFlowKind::PhoneSale,
            currency: Currency::Usd,
            amount_minor: cash_received.minor(),
            profit_minor: Some(profit.minor()),
            origin_id: origin_id.to_string(),
            occurred_on,
            description: description.map(str::to_string),
        },
        CashFlowEvent::AccessorySale {
            shop_id,
            origin_id,
            cash_received,
            profit,
            occurred_on,
            description,
        } => PlannedCashFlow {
            shop_id: shop_id.to_string(),
            kind: CashFlowKind::AccessorySale,
            currency: Currency::Som,
            amount_minor: cash_received.minor(),
            profit_minor: Some(profit.minor()),
            origin_id: origin_id.to_string(),
            occurred_on,
            description: description.map(str::to_string),
        },
        CashFlowEvent::Exchange {
            shop_id,
            origin_id,
            difference,
            customer_pays,
            occurred_on,
            description,
        } => PlannedCashFlow {
            shop_id: shop_id.to_string(),
            kind: CashFlowKind::Exchange,
            currency: Currency::Usd,
            amount_minor: if customer_pays {
                difference.minor()
            } else {
                -difference.minor()
            },
            profit_minor: None,
            origin_id: origin_id.to_string(),
            occurred_on,
            description: description.map(str::to_string),
        },
        CashFlowEvent::PhoneReturn {
            shop_id,
            origin_id,
            refund,
            occurred_on,
            description,
        } => PlannedCashFlow {
            shop_id: shop_id.to_string(),
            kind: CashFlowKind::PhoneReturn,
            currency: Currency::Usd,
            amount_minor: -refund.minor(),
            profit_minor: None,
            origin_id: origin_id.to_string(),
            occurred_on,
            description: description.map(str::to_string),
        },
        CashFlowEvent::DailySellerPayment {
            shop_id,
            origin_id,
            payout,
            occurred_on,
            description,
        } => PlannedCashFlow {
            shop_id: shop_id.to_string(),
            kind: CashFlowKind::DailySellerPayment,
            currency: Currency::Usd,
            amount_minor: -payout.minor(),
            profit_minor: None,
            origin_id: origin_id.to_string(),
            occurred_on,
            description: description.map(str::to_string),
        },
        CashFlowEvent::Expense {
            shop_id,
            origin_id,
            amount,
            occurred_on,
            description,
        } => PlannedCashFlow {
            shop_id: shop_id.to_string(),
            kind: CashFlowKind::Expense,
            currency: Currency::Som,
            amount_minor: -amount.minor(),
            profit_minor: None,
            origin_id: origin_id.to_string(),
            occurred_on,
            description: description.map(str::to_string),
        },
        CashFlowEvent::SupplierPayment {
            shop_id,
            origin_id,
            amount,
            source,
            occurred_on,
            description,
        } => {
            // Safe-source payments move money between internal pockets
            if source == PaymentSource::Safe {
                return None;
            }
            PlannedCashFlow {
                shop_id: shop_id.to_string(),
                kind: CashFlowKind::SupplierPayment,
                currency: Currency::Usd,
                amount_minor: -amount.minor(),
                profit_minor: None,
                origin_id: origin_id.to_string(),
                occurred_on,
                description: description.map(str::to_string),
            }
        }
    };

    if planned.amount_minor == 0 {
        return None;
    }

    Some(planned)
}

// =============================================================================
// Summaries
// =============================================================================

/// Income/expense totals for one currency. All fields non-negative;
/// `net` carries the sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    pub income_minor: i64,
    pub expense_minor: i64,
}

impl CurrencyTotals {
    pub fn net(&self) -> Money {
        Money::from_minor(self.income_minor - self.expense_minor)
    }
}

/// Period summary over a set of cash-flow entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub usd: CurrencyTotals,
    pub som: CurrencyTotals,
    /// Realized margin on USD sales (phones).
    pub profit_usd_minor: i64,
    /// Realized margin on som sales (accessories).
    pub profit_som_minor: i64,
    pub entry_count: usize,
}

/// Folds entries into a period summary. Pure over whatever slice the
/// caller fetched for the date range.
pub fn summarize(entries: &[CashFlowTransaction]) -> CashFlowSummary {
    let mut summary = CashFlowSummary::default();

    for entry in entries {
        let totals = match entry.currency {
            Currency::Usd => &mut summary.usd,
            Currency::Som => &mut summary.som,
        };
        if entry.amount_minor >= 0 {
            totals.income_minor += entry.amount_minor;
        } else {
            totals.expense_minor += -entry.amount_minor;
        }

        if let Some(profit) = entry.profit_minor {
            match entry.currency {
                Currency::Usd => summary.profit_usd_minor += profit,
                Currency::Som => summary.profit_som_minor += profit,
            }
        }

        summary.entry_count += 1;
    }

    summary
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
    }

    #[test]
    fn test_phone_sale_is_positive_usd() {
        let event = CashFlowEvent::PhoneSale {
            shop_id: "s1",
            origin_id: "sale1",
            cash_received: Money::from_minor(300_00),
            profit: Money::from_minor(75_00),
            occurred_on: day(),
            description: None,
        };
        let planned = derive_transaction(&event).unwrap();
        assert_eq!(planned.kind, CashFlowKind::PhoneSale);
        assert_eq!(planned.currency, Currency::Usd);
        assert_eq!(planned.amount_minor, 300_00);
        assert_eq!(planned.profit_minor, Some(75_00));
    }

    #[test]
    fn test_zero_cash_sale_derives_nothing() {
        // fully-on-credit sale: no cash moved
        let event = CashFlowEvent::PhoneSale {
            shop_id: "s1",
            origin_id: "sale1",
            cash_received: Money::zero(),
            profit: Money::from_minor(75_00),
            occurred_on: day(),
            description: None,
        };
        assert!(derive_transaction(&event).is_none());
    }

    #[test]
    fn test_exchange_sign_follows_who_pays() {
        let base = |customer_pays| CashFlowEvent::Exchange {
            shop_id: "s1",
            origin_id: "x1",
            difference: Money::from_minor(50_00),
            customer_pays,
            occurred_on: day(),
            description: None,
        };

        assert_eq!(derive_transaction(&base(true)).unwrap().amount_minor, 50_00);
        assert_eq!(derive_transaction(&base(false)).unwrap().amount_minor, -50_00);
    }

    #[test]
    fn test_outflow_events_are_negative() {
        let expense = CashFlowEvent::Expense {
            shop_id: "s1",
            origin_id: "e1",
            amount: Money::from_minor(50_000_00),
            occurred_on: day(),
            description: Some("rent"),
        };
        let planned = derive_transaction(&expense).unwrap();
        assert_eq!(planned.amount_minor, -50_000_00);
        assert_eq!(planned.currency, Currency::Som);

        let refund = CashFlowEvent::PhoneReturn {
            shop_id: "s1",
            origin_id: "r1",
            refund: Money::from_minor(280_00),
            occurred_on: day(),
            description: None,
        };
        assert_eq!(derive_transaction(&refund).unwrap().amount_minor, -280_00);
    }

    #[test]
    fn test_safe_supplier_payment_derives_nothing() {
        let event = |source| CashFlowEvent::SupplierPayment {
            shop_id: "s1",
            origin_id: "sp1",
            amount: Money::from_minor(500_00),
            source,
            occurred_on: day(),
            description: None,
        };

        assert!(derive_transaction(&event(PaymentSource::Safe)).is_none());
        let cash = derive_transaction(&event(PaymentSource::Cash)).unwrap();
        assert_eq!(cash.amount_minor, -500_00);
    }

    fn txn(currency: Currency, amount_minor: i64, profit_minor: Option<i64>) -> CashFlowTransaction {
        CashFlowTransaction {
            id: "t".into(),
            shop_id: "s1".into(),
            kind: CashFlowKind::PhoneSale,
            currency,
            amount_minor,
            profit_minor,
            origin_id: "o".into(),
            occurred_on: day(),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_splits_by_currency_and_sign() {
        let entries = vec![
            txn(Currency::Usd, 300_00, Some(75_00)),
            txn(Currency::Usd, -120_00, None),
            txn(Currency::Som, 150_000_00, Some(30_000_00)),
            txn(Currency::Som, -50_000_00, None),
        ];
        let summary = summarize(&entries);

        assert_eq!(summary.usd.income_minor, 300_00);
        assert_eq!(summary.usd.expense_minor, 120_00);
        assert_eq!(summary.usd.net().minor(), 180_00);

        assert_eq!(summary.som.income_minor, 150_000_00);
        assert_eq!(summary.som.expense_minor, 50_000_00);

        assert_eq!(summary.profit_usd_minor, 75_00);
        assert_eq!(summary.profit_som_minor, 30_000_00);
        assert_eq!(summary.entry_count, 4);
    }
}
