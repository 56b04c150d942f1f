//! # Domain Types
//!
//! Core domain types for the savdo ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Phone       │   │    Supplier     │   │      Debt       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  imei (business)│   │  initial_debt   │   │  kind           │       │
//! │  │  cost_price     │   │  total_debt     │   │  amount/paid    │       │
//! │  │  debt_balance   │   │  total_paid     │   │  origin link    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐  ┌─────────────────┐       │
//! │  │   Accessory     │   │ SupplierPayment  │  │ CashFlowTxn     │       │
//! │  │  quantity       │   │  + Detail rows   │  │  signed amount  │       │
//! │  │  moving avg     │   │  FIFO allocation │  │  per event      │       │
//! │  └─────────────────┘   └──────────────────┘  └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (IMEI, accessory code) - human-readable
//!
//! ## Money Fields
//! All money is stored as i64 minor units (`*_minor` fields) with a
//! `Currency` tag on the record. Typed accessors return [`Money`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Currency
// =============================================================================

/// Currency of a monetary amount.
///
/// The business runs on two currencies: phones and supplier settlements
/// in hard currency (USD), accessories and day-to-day expenses in som.
/// Conversion between the two is out of scope; amounts never cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// US dollars, minor unit = cent.
    Usd,
    /// Uzbek som, minor unit = hundredth (tiyin).
    Som,
}

// =============================================================================
// Phone
// =============================================================================

/// Where a phone entered the inventory from.
///
/// Each source carries its own mandatory counterparty data, validated in
/// [`crate::validation::validate_phone_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PhoneSource {
    /// Bought on credit from a supplier (feeds the supplier ledger).
    Supplier,
    /// Bought outright from a walk-in seller.
    ExternalSeller,
    /// Consigned by a daily seller; payout recorded as cash out.
    DailySeller,
    /// Taken in as the old unit of an exchange deal.
    Exchange,
}

/// Lifecycle status of a phone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PhoneStatus {
    /// On the shelf, available for sale.
    InShop,
    /// Out at the repair master.
    WithRepairMaster,
    /// Sold; restored to InShop if the sale is deleted.
    Sold,
    /// Came back from a customer after a sale.
    Returned,
    /// Taken in as the customer's old unit in an exchange deal.
    ExchangedIn,
}

impl Default for PhoneStatus {
    fn default() -> Self {
        PhoneStatus::InShop
    }
}

/// A single phone unit in inventory.
///
/// Phones are serialized stock: every unit is its own row with its own
/// composite cost and its own outstanding supplier balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Phone {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Shop this unit belongs to.
    pub shop_id: String,

    /// Model name shown on labels and reports.
    pub model: String,

    /// IMEI - business identifier, exactly 15 digits when present.
    pub imei: Option<String>,

    /// Lifecycle status.
    pub status: PhoneStatus,

    /// Where the unit came from.
    pub source: PhoneSource,

    /// Supplier reference (required when source is Supplier).
    pub supplier_id: Option<String>,

    /// Walk-in seller contact (required when source is ExternalSeller).
    pub external_seller_name: Option<String>,
    pub external_seller_phone: Option<String>,

    /// Previous owner contact (required when source is Exchange).
    pub original_owner_name: Option<String>,
    pub original_owner_phone: Option<String>,

    /// Payout owed to a daily seller (required when source is DailySeller).
    pub daily_payment_minor: Option<i64>,

    /// Base purchase price in cents.
    pub purchase_price_minor: i64,

    /// IMEI registration cost in cents.
    pub imei_cost_minor: i64,

    /// Accumulated repair cost in cents.
    pub repair_cost_minor: i64,

    /// Composite cost: purchase + imei + repair. Recomputed before every
    /// persist; never written directly by callers.
    pub cost_price_minor: i64,

    /// Asking price, if set.
    pub sale_price_minor: Option<i64>,

    /// Outstanding amount still owed to the supplier for this unit.
    pub debt_balance_minor: i64,

    /// When the unit was recorded.
    pub created_at: DateTime<Utc>,

    /// When the unit was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Phone {
    /// Composite cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_minor(self.cost_price_minor)
    }

    /// Outstanding supplier balance as Money.
    #[inline]
    pub fn debt_balance(&self) -> Money {
        Money::from_minor(self.debt_balance_minor)
    }

    /// Realized margin for a given sale price.
    #[inline]
    pub fn margin(&self, sale_price: Money) -> Money {
        sale_price - self.cost_price()
    }
}

// =============================================================================
// Accessory Stock
// =============================================================================

/// An accessory stock line (cases, chargers, glass, ...).
///
/// Accessories are counted stock: one row per item type with a quantity
/// and a moving-average purchase price maintained by the restock flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Accessory {
    pub id: String,
    pub shop_id: String,
    /// Business code: numeric, zero-padded to 4 digits, unique per shop.
    pub code: String,
    pub name: String,
    /// Units on hand.
    pub quantity: i64,
    /// Moving-average purchase price in som hundredths.
    pub avg_purchase_price_minor: i64,
    /// Asking price in som hundredths.
    pub sale_price_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Accessory {
    /// Moving-average purchase price as Money.
    #[inline]
    pub fn avg_purchase_price(&self) -> Money {
        Money::from_minor(self.avg_purchase_price_minor)
    }
}

/// One restock event for an accessory. History rows are immutable; the
/// moving average is always recomputed from the full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccessoryPurchase {
    pub id: String,
    pub accessory_id: String,
    /// Units added, always >= 1.
    pub quantity: i64,
    /// Unit purchase price in som hundredths at the time of restock.
    pub unit_price_minor: i64,
    /// Who recorded the restock.
    pub recorded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccessoryPurchase {
    /// Total value of this batch (quantity × unit price).
    #[inline]
    pub fn batch_value(&self) -> Money {
        Money::from_minor(self.unit_price_minor).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A phone supplier with a running credit ledger.
///
/// ## Balance Identity
/// `balance = initial_debt + total_debt`
///
/// Both figures are CURRENT outstanding amounts: settlement pays
/// `initial_debt` down directly and re-derives `total_debt` from the
/// SUM of per-phone balances, never incrementally. `total_paid` is the
/// lifetime paid figure kept for listing screens and audits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    /// Debt carried in from before the ledger started, in cents.
    pub initial_debt_minor: i64,
    /// Sum of outstanding per-phone balances, in cents.
    pub total_debt_minor: i64,
    /// Everything ever paid to this supplier, in cents.
    pub total_paid_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    /// Outstanding balance: initial_debt + total_debt.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_minor(self.initial_debt_minor + self.total_debt_minor)
    }
}

/// Where the cash for a supplier payment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentSource {
    /// Till cash - shows up in the cash-flow ledger.
    Cash,
    /// The safe - internal move, no cash-flow entry.
    Safe,
}

/// Which phones a supplier payment is allowed to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SupplierPaymentType {
    /// Walks every unpaid phone oldest-first, excess hits initial debt.
    General,
    /// Settles only the phones the caller picked; excess never touches
    /// initial debt.
    Specific,
}

/// A payment made to a supplier, allocated FIFO across phone balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplierPayment {
    pub id: String,
    pub supplier_id: String,
    /// Gross amount paid, in cents.
    pub amount_minor: i64,
    /// Portion that found no debt to settle. Never part of `total_paid`;
    /// stored so reversal can reconstruct what was actually applied.
    pub leftover_minor: i64,
    pub source: PaymentSource,
    /// General (all unpaid phones) or specific (a chosen subset). The
    /// edit flow replays the same mode.
    pub payment_type: SupplierPaymentType,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SupplierPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }
}

/// One allocation line of a supplier payment against one phone.
///
/// Detail rows are the audit trail the reversal path replays; previous
/// and new balances are snapshots taken inside the allocation transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplierPaymentDetail {
    pub id: String,
    pub payment_id: String,
    pub phone_id: String,
    /// Amount applied to this phone, in cents. Always > 0.
    pub allocated_minor: i64,
    /// Phone balance before this allocation.
    pub previous_balance_minor: i64,
    /// Phone balance after this allocation.
    pub new_balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl SupplierPaymentDetail {
    #[inline]
    pub fn allocated(&self) -> Money {
        Money::from_minor(self.allocated_minor)
    }
}

// =============================================================================
// Debts
// =============================================================================

/// Direction of a debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    /// Customer owes the person who sold to them.
    CustomerToSeller,
    /// A salesperson owes the shop owner for a credit sale they made.
    SellerToBoss,
}

/// Settlement status of a debt. Derived, never set by hand:
/// paid ⟺ paid_amount >= debt_amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Active,
    Paid,
}

impl Default for DebtStatus {
    fn default() -> Self {
        DebtStatus::Active
    }
}

/// The kind of event a debt or cash-flow entry hangs off.
///
/// The origin link (`origin_kind` + `origin_id`) is how edits and deletes
/// find their rows. Free-text notes are display-only and never matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    PhoneSale,
    AccessorySale,
    Exchange,
    MasterService,
}

/// A debt record in the bidirectional debt ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Debt {
    pub id: String,
    pub shop_id: String,
    pub kind: DebtKind,
    pub currency: Currency,
    /// Who owes (customer name or salesperson name).
    pub debtor: String,
    /// Who is owed (salesperson name or owner name).
    pub creditor: String,
    pub debtor_phone: Option<String>,
    /// Original amount owed, in minor units.
    pub amount_minor: i64,
    /// Sum of recorded payments, re-derived on every payment change.
    pub paid_amount_minor: i64,
    pub status: DebtStatus,
    /// Promise date. Mandatory whenever amount > 0.
    pub due_date: Option<NaiveDate>,
    /// Event that created this debt.
    pub origin_kind: OriginKind,
    pub origin_id: String,
    /// Display-only context ("iPhone 13, IMEI ...").
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Debt {
    /// Original amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }

    /// What is still owed. Zero once fully paid (overpays don't go
    /// negative here; the raw fields keep the record).
    #[inline]
    pub fn remaining(&self) -> Money {
        let rem = self.amount_minor - self.paid_amount_minor;
        Money::from_minor(rem.max(0))
    }

    /// Whether payments cover the debt.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.paid_amount_minor >= self.amount_minor
    }
}

/// One repayment against a debt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DebtPayment {
    pub id: String,
    pub debt_id: String,
    /// Amount paid, in the debt's currency. Always > 0.
    pub amount_minor: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Flow
// =============================================================================

/// The kind of event behind a cash-flow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CashFlowKind {
    PhoneSale,
    AccessorySale,
    Exchange,
    PhoneReturn,
    DailySellerPayment,
    Expense,
    SupplierPayment,
}

/// A signed cash-flow entry, one per mutating business event.
///
/// The sign carries the direction: positive is cash in, negative is cash
/// out. Reports never branch on kind to decide direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashFlowTransaction {
    pub id: String,
    pub shop_id: String,
    pub kind: CashFlowKind,
    pub currency: Currency,
    /// Signed amount in minor units.
    pub amount_minor: i64,
    /// Realized margin for sale-type entries (sale - cost), if known.
    pub profit_minor: Option<i64>,
    /// The originating event's id; unique together with kind.
    pub origin_id: String,
    /// Business date the event happened on (report bucketing key).
    pub occurred_on: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CashFlowTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }

    /// Whether this entry is cash coming in.
    #[inline]
    pub fn is_income(&self) -> bool {
        self.amount_minor > 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn phone_fixture() -> Phone {
        Phone {
            id: "p1".into(),
            shop_id: "s1".into(),
            model: "iPhone 13".into(),
            imei: Some("123456789012345".into()),
            status: PhoneStatus::default(),
            source: PhoneSource::Supplier,
            supplier_id: Some("sup1".into()),
            external_seller_name: None,
            external_seller_phone: None,
            original_owner_name: None,
            original_owner_phone: None,
            daily_payment_minor: None,
            purchase_price_minor: 200_00,
            imei_cost_minor: 10_00,
            repair_cost_minor: 15_00,
            cost_price_minor: 225_00,
            sale_price_minor: Some(300_00),
            debt_balance_minor: 200_00,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_phone_status_default() {
        assert_eq!(PhoneStatus::default(), PhoneStatus::InShop);
    }

    #[test]
    fn test_phone_margin() {
        let phone = phone_fixture();
        assert_eq!(phone.margin(Money::from_minor(300_00)).minor(), 75_00);
    }

    #[test]
    fn test_supplier_balance_identity() {
        let supplier = Supplier {
            id: "s1".into(),
            name: "Akmal".into(),
            phone: None,
            initial_debt_minor: 100_00,
            total_debt_minor: 500_00,
            total_paid_minor: 250_00,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(supplier.balance().minor(), 600_00);
    }

    #[test]
    fn test_debt_remaining_clamps_at_zero() {
        let mut debt = Debt {
            id: "d1".into(),
            shop_id: "s1".into(),
            kind: DebtKind::CustomerToSeller,
            currency: Currency::Usd,
            debtor: "Karim".into(),
            creditor: "Olim".into(),
            debtor_phone: None,
            amount_minor: 100_00,
            paid_amount_minor: 40_00,
            status: DebtStatus::Active,
            due_date: None,
            origin_kind: OriginKind::PhoneSale,
            origin_id: "sale1".into(),
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(debt.remaining().minor(), 60_00);
        assert!(!debt.is_settled());

        debt.paid_amount_minor = 120_00;
        assert_eq!(debt.remaining().minor(), 0);
        assert!(debt.is_settled());
    }

    #[test]
    fn test_accessory_batch_value() {
        let purchase = AccessoryPurchase {
            id: "ap1".into(),
            accessory_id: "a1".into(),
            quantity: 10,
            unit_price_minor: 15_000_00,
            recorded_by: None,
            created_at: Utc::now(),
        };
        assert_eq!(purchase.batch_value().minor(), 150_000_00);
    }

    #[test]
    fn test_cashflow_direction_from_sign() {
        let txn = CashFlowTransaction {
            id: "c1".into(),
            shop_id: "s1".into(),
            kind: CashFlowKind::Expense,
            currency: Currency::Som,
            amount_minor: -50_000_00,
            profit_minor: None,
            origin_id: "e1".into(),
            occurred_on: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            description: Some("rent".into()),
            created_at: Utc::now(),
        };
        assert!(!txn.is_income());
        assert_eq!(txn.amount().minor(), -50_000_00);
    }
}
