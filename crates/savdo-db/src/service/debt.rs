//! # Debt Service
//!
//! Repayments against the bidirectional debt ledger.
//!
//! ## Always Re-Derived
//! `paid_amount` and `status` are never incremented or flipped by hand:
//! every change replays the full payment set through
//! [`savdo_core::debt::settle_state`]. Deleting a payment flips a paid
//! debt back to active with no special casing.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::debt::DebtRepository;
use crate::repository::generate_id;
use savdo_core::debt::settle_state;
use savdo_core::error::CoreError;
use savdo_core::money::Money;
use savdo_core::types::{Debt, DebtPayment};
use savdo_core::validation::validate_payment_amount;

/// Debt repayment use-cases.
#[derive(Debug, Clone)]
pub struct DebtService {
    pool: SqlitePool,
}

impl DebtService {
    /// Creates a new DebtService.
    pub fn new(pool: SqlitePool) -> Self {
        DebtService { pool }
    }

    fn debts(&self) -> DebtRepository {
        DebtRepository::new(self.pool.clone())
    }

    /// Records a repayment against a debt.
    ///
    /// Rejects payments larger than what remains; partial payments keep
    /// the debt active, covering payments flip it to paid.
    pub async fn record_payment(
        &self,
        debt_id: &str,
        amount_minor: i64,
        note: Option<String>,
    ) -> DbResult<Debt> {
        validate_payment_amount(amount_minor)?;

        let repo = self.debts();
        let mut tx = self.pool.begin().await?;

        let debt = repo
            .fetch(&mut *tx, debt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", debt_id))?;

        let remaining = debt.remaining().minor();
        if amount_minor > remaining {
            return Err(DbError::Core(CoreError::PaymentExceedsBalance {
                amount: Money::from_minor(amount_minor).to_string(),
                balance: Money::from_minor(remaining).to_string(),
            }));
        }

        let payment = DebtPayment {
            id: generate_id(),
            debt_id: debt.id.clone(),
            amount_minor,
            note,
            created_at: Utc::now(),
        };
        repo.insert_payment(&mut *tx, &payment).await?;

        let payments = repo.list_payments(&mut *tx, &debt.id).await?;
        let (paid, status) = settle_state(debt.amount_minor, &payments);
        repo.update_settlement(&mut *tx, &debt.id, paid, status)
            .await?;

        tx.commit().await?;

        info!(
            debt_id = %debt.id,
            amount = amount_minor,
            paid,
            status = ?status,
            "Debt payment recorded"
        );

        repo.get(&debt.id).await
    }

    /// Deletes a repayment, re-deriving the debt's settlement state.
    pub async fn delete_payment(&self, payment_id: &str) -> DbResult<Debt> {
        let repo = self.debts();

        let payment = repo.get_payment(payment_id).await?;

        let mut tx = self.pool.begin().await?;

        let debt = repo
            .fetch(&mut *tx, &payment.debt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", &payment.debt_id))?;

        repo.delete_payment(&mut *tx, payment_id).await?;

        let payments = repo.list_payments(&mut *tx, &debt.id).await?;
        let (paid, status) = settle_state(debt.amount_minor, &payments);
        repo.update_settlement(&mut *tx, &debt.id, paid, status)
            .await?;

        tx.commit().await?;

        info!(
            debt_id = %debt.id,
            payment_id = %payment_id,
            paid,
            status = ?status,
            "Debt payment deleted"
        );

        repo.get(&debt.id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::debt::tests::debt_fixture;
    use savdo_core::types::DebtStatus;

    async fn seeded_debt(db: &Database, amount_minor: i64) -> String {
        let debt = debt_fixture("shop1", "sale1", amount_minor);
        db.debts().insert(db.pool(), &debt).await.unwrap();
        debt.id
    }

    #[tokio::test]
    async fn test_partial_then_covering_payment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let debt_id = seeded_debt(&db, 100_00).await;
        let service = db.debt_service();

        let debt = service.record_payment(&debt_id, 40_00, None).await.unwrap();
        assert_eq!(debt.paid_amount_minor, 40_00);
        assert_eq!(debt.status, DebtStatus::Active);
        assert_eq!(debt.remaining().minor(), 60_00);

        let debt = service.record_payment(&debt_id, 60_00, None).await.unwrap();
        assert_eq!(debt.paid_amount_minor, 100_00);
        assert_eq!(debt.status, DebtStatus::Paid);
    }

    #[tokio::test]
    async fn test_overpay_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let debt_id = seeded_debt(&db, 100_00).await;
        let service = db.debt_service();

        service.record_payment(&debt_id, 80_00, None).await.unwrap();
        let err = service
            .record_payment(&debt_id, 30_00, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::PaymentExceedsBalance { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_payment_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let debt_id = seeded_debt(&db, 100_00).await;

        let err = db
            .debt_service()
            .record_payment(&debt_id, 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_deleting_payment_reactivates_debt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let debt_id = seeded_debt(&db, 100_00).await;
        let service = db.debt_service();

        service.record_payment(&debt_id, 100_00, None).await.unwrap();
        let payments = db.debts().list_payments(db.pool(), &debt_id).await.unwrap();
        assert_eq!(payments.len(), 1);

        let debt = service.delete_payment(&payments[0].id).await.unwrap();
        assert_eq!(debt.paid_amount_minor, 0);
        assert_eq!(debt.status, DebtStatus::Active);
    }
}
