//! # Supplier Payment Allocation
//!
//! Pure FIFO allocation of a supplier payment across phone balances.
//!
//! ## How a Payment Lands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Payment: $110       Phones (oldest first): [$100, $20, $0]            │
//! │                                                                         │
//! │  Phone 1: min(110, 100) = 100  → balance 100 → 0,  remaining 10        │
//! │  Phone 2: min(10, 20)   = 10   → balance 20 → 10,  remaining 0         │
//! │  Phone 3: remaining is 0       → untouched, NO detail row              │
//! │                                                                         │
//! │  Anything left after all phones goes against initial_debt.             │
//! │  Anything left after THAT is leftover - returned to the caller,        │
//! │  never folded into total_paid.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ordering is the caller's job (created_at ASC, id ASC); this module
//! only walks the slice it is given.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::Money;
use crate::validation::validate_payment_amount;

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// A phone's outstanding supplier balance, in FIFO position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneBalance {
    pub phone_id: String,
    pub balance_minor: i64,
}

/// One allocation against one phone. Only phones that actually received
/// money get a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub phone_id: String,
    pub allocated_minor: i64,
    pub previous_balance_minor: i64,
    pub new_balance_minor: i64,
}

/// The full outcome of allocating one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Per-phone allocations, in the order they were applied.
    pub lines: Vec<AllocationLine>,
    /// Portion applied against the supplier's initial (pre-ledger) debt.
    pub applied_to_initial_minor: i64,
    /// Portion that found nothing to pay. The caller decides whether to
    /// refuse the payment or confirm a carry-over.
    pub leftover_minor: i64,
}

impl AllocationOutcome {
    /// Total applied to phone balances.
    pub fn allocated_total(&self) -> Money {
        Money::from_minor(self.lines.iter().map(|l| l.allocated_minor).sum())
    }

    /// Everything that actually settled debt: phones + initial debt.
    /// This is what `total_paid` grows by.
    pub fn applied_total(&self) -> Money {
        self.allocated_total() + Money::from_minor(self.applied_to_initial_minor)
    }
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocates a payment FIFO across phone balances, then initial debt.
///
/// ## Invariants
/// - Every line has `allocated > 0`; allocation stops the moment the
///   remainder hits zero
/// - `previous_balance - allocated == new_balance` on every line
/// - `amount == allocated_total + applied_to_initial + leftover`
///
/// ## Errors
/// - Validation error when the amount is not positive
pub fn allocate(
    amount: Money,
    initial_debt: Money,
    phones: &[PhoneBalance],
) -> CoreResult<AllocationOutcome> {
    validate_payment_amount(amount.minor())?;

    let mut remaining = amount.minor();
    let mut lines = Vec::new();

    for phone in phones {
        if remaining == 0 {
            break;
        }
        if phone.balance_minor <= 0 {
            continue;
        }

        let pay = remaining.min(phone.balance_minor);
        lines.push(AllocationLine {
            phone_id: phone.phone_id.clone(),
            allocated_minor: pay,
            previous_balance_minor: phone.balance_minor,
            new_balance_minor: phone.balance_minor - pay,
        });
        remaining -= pay;
    }

    let applied_to_initial = remaining.min(initial_debt.minor().max(0));
    let leftover = remaining - applied_to_initial;

    Ok(AllocationOutcome {
        lines,
        applied_to_initial_minor: applied_to_initial,
        leftover_minor: leftover,
    })
}

// =============================================================================
// Reversal
// =============================================================================

/// Computes how much of a reversed payment goes back onto initial debt.
///
/// The detail rows replay exactly onto phone balances; whatever part of
/// the original amount is NOT covered by detail rows was the part that
/// settled initial debt (leftover never entered `total_paid`, so it is
/// excluded by the caller passing the applied amount, not the gross).
pub fn initial_debt_restore(applied_minor: i64, lines_total_minor: i64) -> i64 {
    (applied_minor - lines_total_minor).max(0)
}

// =============================================================================
// Unit Tests
// =============================================================================
