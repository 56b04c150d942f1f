//! # Debt Planning Rules
//!
//! Pure rules for the bidirectional debt ledger.
//!
//! ## The Dual-Debt Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Credit sale made by the OWNER:                                         │
//! │                                                                         │
//! │      Customer ──owes──► Owner                 (1 debt)                  │
//! │                                                                         │
//! │  Credit sale made by a SALESPERSON:                                     │
//! │                                                                         │
//! │      Customer ──owes──► Salesperson           (customer_to_seller)     │
//! │      Salesperson ──owes──► Owner              (seller_to_boss)         │
//! │                                                                         │
//! │  The salesperson is on the hook for the money whether or not the        │
//! │  customer ever pays; the second debt records that.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Planning is pure: it returns the rows to insert and touches nothing.
//! The db layer writes them (and deletes stale ones on edit) in one
//! transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Currency, DebtKind, DebtPayment, DebtStatus, OriginKind};
use crate::validation::validate_debt_amount;

// =============================================================================
// Planned Debts
// =============================================================================

/// A debt row planned but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDebt {
    pub shop_id: String,
    pub kind: DebtKind,
    pub currency: Currency,
    pub debtor: String,
    pub creditor: String,
    pub debtor_phone: Option<String>,
    pub amount_minor: i64,
    pub due_date: NaiveDate,
    pub origin_kind: OriginKind,
    pub origin_id: String,
    pub note: Option<String>,
}

/// Everything the planner needs to know about a credit sale.
#[derive(Debug, Clone)]
pub struct SaleDebtInput<'a> {
    pub shop_id: &'a str,
    pub origin_kind: OriginKind,
    /// The external sale event's id; how edits and deletes find the rows.
    pub origin_id: &'a str,
    pub currency: Currency,
    pub customer_name: &'a str,
    pub customer_phone: Option<&'a str>,
    /// Who made the sale.
    pub salesperson: &'a str,
    /// Who owns the shop.
    pub owner: &'a str,
    pub debt_amount: Money,
    pub due_date: Option<NaiveDate>,
    /// Display-only context copied onto each planned row.
    pub note: Option<&'a str>,
}

// =============================================================================
// Planning
// =============================================================================

/// Plans the debt rows for a credit sale.
///
/// ## Outcomes
/// - amount zero → no debts
/// - amount > 0, salesperson is the owner → 1 debt (customer → owner)
/// - amount > 0, salesperson is not the owner → 2 debts
///   (customer → salesperson, salesperson → owner)
///
/// ## Errors
/// - [`CoreError::DueDateRequired`] when amount > 0 without a due date
/// - Validation error when the amount is negative or over the cap
pub fn plan_sale_debts(input: &SaleDebtInput<'_>) -> CoreResult<Vec<PlannedDebt>> {
    validate_debt_amount(input.debt_amount.minor(), input.currency)?;

    if input.debt_amount.is_zero() {
        return Ok(Vec::new());
    }

    let due_date = input.due_date.ok_or(CoreError::DueDateRequired)?;

    let mut debts = vec![PlannedDebt {
        shop_id: input.shop_id.to_string(),
        kind: DebtKind::CustomerToSeller,
        currency: input.currency,
        debtor: input.customer_name.to_string(),
        creditor: input.salesperson.to_string(),
        debtor_phone: input.customer_phone.map(str::to_string),
        amount_minor: input.debt_amount.minor(),
        due_date,
        origin_kind: input.origin_kind,
        origin_id: input.origin_id.to_string(),
        note: input.note.map(str::to_string),
    }];

    if input.salesperson != input.owner {
        debts.push(PlannedDebt {
            shop_id: input.shop_id.to_string(),
            kind: DebtKind::SellerToBoss,
            currency: input.currency,
            debtor: input.salesperson.to_string(),
            creditor: input.owner.to_string(),
            debtor_phone: None,
            amount_minor: input.debt_amount.minor(),
            due_date,
            origin_kind: input.origin_kind,
            origin_id: input.origin_id.to_string(),
            note: input.note.map(str::to_string),
        });
    }

    Ok(debts)
}

// =============================================================================
// Settlement State
// =============================================================================

/// Re-derives a debt's paid amount and status from its payments.
///
/// Always recomputed from the full payment set - never incremented - so
/// a deleted payment flips a paid debt back to active with no special
/// casing, and a drifted `paid_amount` self-heals on the next touch.
pub fn settle_state(amount_minor: i64, payments: &[DebtPayment]) -> (i64, DebtStatus) {
    let paid: i64 = payments.iter().map(|p| p.amount_minor).sum();
    let status = if paid >= amount_minor {
        DebtStatus::Paid
    } else {
        DebtStatus::Active
    };
    (paid, status)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn input<'a>(debt_minor: i64, salesperson: &'a str, owner: &'a str) -> SaleDebtInput<'a> {
        SaleDebtInput {
            shop_id: "shop1",
            origin_kind: OriginKind::PhoneSale,
            origin_id: "sale1",
            currency: Currency::Usd,
            customer_name: "Karim",
            customer_phone: Some("+998901112233"),
            salesperson,
            owner,
            debt_amount: Money::from_minor(debt_minor),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 15),
            note: Some("iPhone 13, IMEI 123456789012345"),
        }
    }

    fn payment(minor: i64) -> DebtPayment {
        DebtPayment {
            id: "pay".into(),
            debt_id: "d1".into(),
            amount_minor: minor,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_sale_plans_single_debt() {
        let debts = plan_sale_debts(&input(100_00, "Olim", "Olim")).unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].kind, DebtKind::CustomerToSeller);
        assert_eq!(debts[0].debtor, "Karim");
        assert_eq!(debts[0].creditor, "Olim");
        assert_eq!(debts[0].amount_minor, 100_00);
    }

    #[test]
    fn test_salesperson_sale_plans_dual_debts() {
        let debts = plan_sale_debts(&input(100_00, "Sardor", "Olim")).unwrap();
        assert_eq!(debts.len(), 2);

        assert_eq!(debts[0].kind, DebtKind::CustomerToSeller);
        assert_eq!(debts[0].debtor, "Karim");
        assert_eq!(debts[0].creditor, "Sardor");

        assert_eq!(debts[1].kind, DebtKind::SellerToBoss);
        assert_eq!(debts[1].debtor, "Sardor");
        assert_eq!(debts[1].creditor, "Olim");
        // both debts mirror the same amount and origin
        assert_eq!(debts[1].amount_minor, debts[0].amount_minor);
        assert_eq!(debts[1].origin_id, debts[0].origin_id);
    }

    #[test]
    fn test_zero_amount_plans_nothing() {
        let debts = plan_sale_debts(&input(0, "Sardor", "Olim")).unwrap();
        assert!(debts.is_empty());
    }

    #[test]
    fn test_positive_amount_requires_due_date() {
        let mut i = input(100_00, "Sardor", "Olim");
        i.due_date = None;
        assert!(matches!(
            plan_sale_debts(&i),
            Err(CoreError::DueDateRequired)
        ));
    }

    #[test]
    fn test_amount_over_cap_rejected() {
        // USD cap is $500
        let i = input(600_00, "Sardor", "Olim");
        assert!(plan_sale_debts(&i).is_err());
    }

    #[test]
    fn test_settle_state_transitions() {
        let (paid, status) = settle_state(100_00, &[payment(40_00)]);
        assert_eq!(paid, 40_00);
        assert_eq!(status, DebtStatus::Active);

        let (paid, status) = settle_state(100_00, &[payment(40_00), payment(60_00)]);
        assert_eq!(paid, 100_00);
        assert_eq!(status, DebtStatus::Paid);

        // overpay still reads as paid, full sum preserved
        let (paid, status) = settle_state(100_00, &[payment(120_00)]);
        assert_eq!(paid, 120_00);
        assert_eq!(status, DebtStatus::Paid);

        // removing payments flips paid back to active
        let (paid, status) = settle_state(100_00, &[]);
        assert_eq!(paid, 0);
        assert_eq!(status, DebtStatus::Active);
    }
}
