//! # Settlement Service
//!
//! FIFO supplier payment settlement: allocation, reversal, edit.
//!
//! ## The Engine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_payment (one transaction):                                      │
//! │                                                                         │
//! │    general:  walk the supplier's unpaid phones oldest-first             │
//! │    specific: walk only the phones the caller picked, oldest-first       │
//! │    ├── pay each balance down, write a detail row per touched phone      │
//! │    ├── excess goes against initial (pre-ledger) debt (general only)     │
//! │    └── anything after that is leftover: stored on the payment,          │
//! │        surfaced to the caller, NEVER folded into total_paid             │
//! │                                                                         │
//! │  reverse_payment: replay the detail rows backwards, restore initial     │
//! │  debt from (amount - leftover) - Σ(details), subtract the applied       │
//! │  amount from total_paid, delete the payment and its cash-flow entry.    │
//! │                                                                         │
//! │  edit_payment: reverse + re-allocate under the SAME payment id,         │
//! │  created_at and payment type, so the payment keeps its place and        │
//! │  mode in history.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::cashflow::CashFlowRepository;
use crate::repository::generate_id;
use crate::repository::phone::PhoneRepository;
use crate::repository::supplier::SupplierRepository;
use savdo_core::allocation::{allocate, initial_debt_restore, AllocationOutcome, PhoneBalance};
use savdo_core::cashflow::{derive_transaction, CashFlowEvent};
use savdo_core::money::Money;
use savdo_core::error::{CoreError, ValidationError};
use savdo_core::types::{
    CashFlowKind, PaymentSource, SupplierPayment, SupplierPaymentDetail, SupplierPaymentType,
};

// =============================================================================
// Inputs / Outcomes
// =============================================================================

/// A payment handed to a supplier.
#[derive(Debug, Clone)]
pub struct SupplierPaymentInput {
    pub shop_id: String,
    pub supplier_id: String,
    pub amount_minor: i64,
    pub source: PaymentSource,
    /// General settles all unpaid phones; specific only `phone_ids`.
    pub payment_type: SupplierPaymentType,
    /// The chosen phones for a specific payment. Ignored for general.
    pub phone_ids: Vec<String>,
    pub occurred_on: NaiveDate,
    pub note: Option<String>,
}

/// What a recorded (or edited) payment did.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub payment: SupplierPayment,
    /// How the payment landed across phones and initial debt.
    pub allocation: AllocationOutcome,
}

// =============================================================================
// Service
// =============================================================================

/// The supplier settlement engine.
#[derive(Debug, Clone)]
pub struct SettlementService {
    pool: SqlitePool,
}

impl SettlementService {
    /// Creates a new SettlementService.
    pub fn new(pool: SqlitePool) -> Self {
        SettlementService { pool }
    }

    fn phones(&self) -> PhoneRepository {
        PhoneRepository::new(self.pool.clone())
    }

    fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    fn cashflow(&self) -> CashFlowRepository {
        CashFlowRepository::new(self.pool.clone())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Collects the balances a payment may settle, oldest first.
    ///
    /// General mode takes every unpaid phone; specific mode only the
    /// chosen ones, which must belong to the supplier.
    async fn allocation_scope(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        supplier_id: &str,
        payment_type: SupplierPaymentType,
        phone_ids: &[String],
    ) -> DbResult<Vec<PhoneBalance>> {
        let phones = self.phones();

        if payment_type == SupplierPaymentType::General {
            let unpaid = phones.unpaid_for_supplier(&mut **tx, supplier_id).await?;
            return Ok(unpaid
                .iter()
                .map(|p| PhoneBalance {
                    phone_id: p.id.clone(),
                    balance_minor: p.debt_balance_minor,
                })
                .collect());
        }

        if phone_ids.is_empty() {
            return Err(DbError::Core(CoreError::Validation(
                ValidationError::Required {
                    field: "phone_ids".to_string(),
                },
            )));
        }

        let mut selected = Vec::with_capacity(phone_ids.len());
        for phone_id in phone_ids {
            let phone = phones
                .fetch(&mut **tx, phone_id)
                .await?
                .ok_or_else(|| DbError::not_found("Phone", phone_id))?;
            if phone.supplier_id.as_deref() != Some(supplier_id) {
                return Err(DbError::Core(CoreError::Validation(
                    ValidationError::InvalidFormat {
                        field: "phone_ids".to_string(),
                        reason: format!("phone {} does not belong to this supplier", phone.id),
                    },
                )));
            }
            selected.push(phone);
        }
        // same deterministic order as the general walk
        selected.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(selected
            .iter()
            .map(|p| PhoneBalance {
                phone_id: p.id.clone(),
                balance_minor: p.debt_balance_minor,
            })
            .collect())
    }

    /// Runs allocation and writes its effects: phone balances, detail
    /// rows, and the supplier's three ledger figures.
    async fn apply_allocation(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        supplier_id: &str,
        amount_minor: i64,
        payment_type: SupplierPaymentType,
        phone_ids: &[String],
        payment_id: &str,
        created_at: DateTime<Utc>,
    ) -> DbResult<AllocationOutcome> {
        let phones = self.phones();
        let suppliers = self.suppliers();

        let supplier = suppliers
            .fetch(&mut **tx, supplier_id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", supplier_id))?;

        let balances = self
            .allocation_scope(tx, supplier_id, payment_type, phone_ids)
            .await?;

        // only a general payment may pay the pre-ledger debt down
        let initial_at_stake = match payment_type {
            SupplierPaymentType::General => supplier.initial_debt_minor,
            SupplierPaymentType::Specific => 0,
        };

        let outcome = allocate(
            Money::from_minor(amount_minor),
            Money::from_minor(initial_at_stake),
            &balances,
        )
        .map_err(DbError::Core)?;

        for line in &outcome.lines {
            phones
                .set_balance(&mut **tx, &line.phone_id, line.new_balance_minor)
                .await?;
            let detail = SupplierPaymentDetail {
                id: generate_id(),
                payment_id: payment_id.to_string(),
                phone_id: line.phone_id.clone(),
                allocated_minor: line.allocated_minor,
                previous_balance_minor: line.previous_balance_minor,
                new_balance_minor: line.new_balance_minor,
                created_at,
            };
            suppliers.insert_detail(&mut **tx, &detail).await?;
        }

        let new_initial = supplier.initial_debt_minor - outcome.applied_to_initial_minor;
        let total_debt = phones.sum_supplier_balances(&mut **tx, supplier_id).await?;
        suppliers
            .apply_settlement(
                &mut **tx,
                supplier_id,
                new_initial,
                total_debt,
                outcome.applied_total().minor(),
            )
            .await?;

        Ok(outcome)
    }

    /// Replays a payment's detail rows backwards and restores the
    /// supplier's ledger figures. The payment row itself is left alone
    /// so the edit flow can reuse it.
    async fn unwind_allocation(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        payment: &SupplierPayment,
    ) -> DbResult<()> {
        let phones = self.phones();
        let suppliers = self.suppliers();

        let details = suppliers.list_details(&mut **tx, &payment.id).await?;
        let mut lines_total = 0;

        for detail in &details {
            let phone = phones.fetch(&mut **tx, &detail.phone_id).await?;
            if phone.is_none() {
                // a reversal must restore every balance it took money
                // from; a missing phone means the ledger can't be made
                // whole, so the whole reversal fails
                warn!(
                    payment_id = %payment.id,
                    phone_id = %detail.phone_id,
                    "Reversal found a missing phone, aborting"
                );
                return Err(DbError::not_found("Phone", &detail.phone_id));
            }
            phones
                .add_to_balance(&mut **tx, &detail.phone_id, detail.allocated_minor)
                .await?;
            lines_total += detail.allocated_minor;
        }

        suppliers.delete_details(&mut **tx, &payment.id).await?;

        // leftover never entered total_paid, so only the applied part
        // comes back out
        let applied = payment.amount_minor - payment.leftover_minor;
        let restore_initial = initial_debt_restore(applied, lines_total);

        let supplier = suppliers
            .fetch(&mut **tx, &payment.supplier_id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", &payment.supplier_id))?;
        let total_debt = phones
            .sum_supplier_balances(&mut **tx, &payment.supplier_id)
            .await?;
        suppliers
            .apply_settlement(
                &mut **tx,
                &payment.supplier_id,
                supplier.initial_debt_minor + restore_initial,
                total_debt,
                -applied,
            )
            .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Public API
    // ------------------------------------------------------------------

    /// Records a supplier payment.
    ///
    /// General payments allocate FIFO across all unpaid phones, then
    /// initial debt. Specific payments settle only the chosen phones.
    /// The returned outcome carries any leftover; the caller decides
    /// what to tell the user about money that found nothing to settle.
    pub async fn record_payment(&self, input: SupplierPaymentInput) -> DbResult<SettlementOutcome> {
        let payment_id = generate_id();
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        // the payment row must exist before its detail rows: the details
        // carry a payment_id foreign key enforced immediately by SQLite
        let mut payment = SupplierPayment {
            id: payment_id,
            supplier_id: input.supplier_id.clone(),
            amount_minor: input.amount_minor,
            leftover_minor: 0,
            source: input.source,
            payment_type: input.payment_type,
            note: input.note,
            created_at,
        };
        self.suppliers().insert_payment(&mut *tx, &payment).await?;

        let allocation = self
            .apply_allocation(
                &mut tx,
                &input.supplier_id,
                input.amount_minor,
                input.payment_type,
                &input.phone_ids,
                &payment.id,
                created_at,
            )
            .await?;

        payment.leftover_minor = allocation.leftover_minor;
        self.suppliers().update_payment(&mut *tx, &payment).await?;

        let event = CashFlowEvent::SupplierPayment {
            shop_id: &input.shop_id,
            origin_id: &payment.id,
            amount: Money::from_minor(input.amount_minor),
            source: input.source,
            occurred_on: input.occurred_on,
            description: payment.note.as_deref(),
        };
        if let Some(entry) = derive_transaction(&event) {
            self.cashflow().upsert(&mut *tx, &entry).await?;
        }

        tx.commit().await?;

        info!(
            payment_id = %payment.id,
            supplier_id = %payment.supplier_id,
            amount = payment.amount_minor,
            applied = allocation.applied_total().minor(),
            leftover = allocation.leftover_minor,
            "Supplier payment recorded"
        );

        Ok(SettlementOutcome {
            payment,
            allocation,
        })
    }

    /// Reverses a supplier payment completely.
    ///
    /// Detail rows replay backwards onto phone balances, initial debt
    /// and `total_paid` are restored, and the payment and its cash-flow
    /// entry disappear.
    pub async fn reverse_payment(&self, payment_id: &str) -> DbResult<()> {
        let suppliers = self.suppliers();

        let mut tx = self.pool.begin().await?;

        let payment = match suppliers.fetch_payment(&mut *tx, payment_id).await? {
            Some(p) => p,
            None => {
                warn!(payment_id = %payment_id, "Reversal of unknown payment");
                return Err(DbError::not_found("SupplierPayment", payment_id));
            }
        };

        self.unwind_allocation(&mut tx, &payment).await?;
        suppliers.delete_payment(&mut *tx, payment_id).await?;
        self.cashflow()
            .delete_by_origin(&mut *tx, CashFlowKind::SupplierPayment, payment_id)
            .await?;

        tx.commit().await?;

        info!(
            payment_id = %payment_id,
            supplier_id = %payment.supplier_id,
            amount = payment.amount_minor,
            "Supplier payment reversed"
        );

        Ok(())
    }

    /// Edits a supplier payment: full reversal plus re-allocation in one
    /// transaction, under the payment's original id, created_at and
    /// payment type so it keeps its place and mode in history.
    ///
    /// A specific payment re-allocates over the phones its detail rows
    /// touched; the selection cannot be changed by an edit.
    pub async fn edit_payment(
        &self,
        payment_id: &str,
        new_amount_minor: i64,
        new_source: PaymentSource,
        note: Option<String>,
        occurred_on: NaiveDate,
    ) -> DbResult<SettlementOutcome> {
        let suppliers = self.suppliers();
        let cashflow = self.cashflow();

        let mut tx = self.pool.begin().await?;

        let old = suppliers
            .fetch_payment(&mut *tx, payment_id)
            .await?
            .ok_or_else(|| DbError::not_found("SupplierPayment", payment_id))?;

        let selection: Vec<String> = match old.payment_type {
            SupplierPaymentType::General => Vec::new(),
            SupplierPaymentType::Specific => suppliers
                .list_details(&mut *tx, &old.id)
                .await?
                .into_iter()
                .map(|d| d.phone_id)
                .collect(),
        };

        self.unwind_allocation(&mut tx, &old).await?;

        let allocation = self
            .apply_allocation(
                &mut tx,
                &old.supplier_id,
                new_amount_minor,
                old.payment_type,
                &selection,
                &old.id,
                old.created_at,
            )
            .await?;

        let payment = SupplierPayment {
            id: old.id.clone(),
            supplier_id: old.supplier_id.clone(),
            amount_minor: new_amount_minor,
            leftover_minor: allocation.leftover_minor,
            source: new_source,
            payment_type: old.payment_type,
            note,
            created_at: old.created_at,
        };
        suppliers.update_payment(&mut *tx, &payment).await?;

        let shop_id = cashflow
            .find_by_origin(&mut *tx, CashFlowKind::SupplierPayment, &payment.id)
            .await?
            .map(|e| e.shop_id);
        let event = CashFlowEvent::SupplierPayment {
            shop_id: shop_id.as_deref().unwrap_or(""),
            origin_id: &payment.id,
            amount: Money::from_minor(new_amount_minor),
            source: new_source,
            occurred_on,
            description: payment.note.as_deref(),
        };
        match derive_transaction(&event) {
            Some(entry) if shop_id.is_some() => cashflow.upsert(&mut *tx, &entry).await?,
            _ => {
                cashflow
                    .delete_by_origin(&mut *tx, CashFlowKind::SupplierPayment, &payment.id)
                    .await?;
            }
        }

        tx.commit().await?;

        info!(
            payment_id = %payment.id,
            old_amount = old.amount_minor,
            new_amount = new_amount_minor,
            "Supplier payment edited"
        );

        Ok(SettlementOutcome {
            payment,
            allocation,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
