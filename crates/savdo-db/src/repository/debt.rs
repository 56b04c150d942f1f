//! # Debt Repository
//!
//! Database operations for the bidirectional debt ledger.
//!
//! ## Origin Link
//! Debts are created by sale events and carry an explicit
//! `(origin_kind, origin_id)` link back to the event. Edit and delete
//! flows resolve rows through that link only; notes are display text.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use savdo_core::types::{Debt, DebtPayment, DebtStatus, OriginKind};

const DEBT_COLUMNS: &str = "id, shop_id, kind, currency, debtor, creditor, debtor_phone, \
     amount_minor, paid_amount_minor, status, due_date, origin_kind, origin_id, note, \
     created_at, updated_at";

/// Repository for debt database operations.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
}

impl DebtRepository {
    /// Creates a new DebtRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DebtRepository { pool }
    }

    // ------------------------------------------------------------------
    // Debts
    // ------------------------------------------------------------------

    /// Gets a debt by ID, erroring when it does not exist.
    pub async fn get(&self, id: &str) -> DbResult<Debt> {
        self.fetch(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", id))
    }

    /// Fetches a debt by ID on any executor.
    pub async fn fetch(&self, exec: impl SqliteExecutor<'_>, id: &str) -> DbResult<Option<Debt>> {
        let sql = format!("SELECT {DEBT_COLUMNS} FROM debts WHERE id = ?1");
        let debt = sqlx::query_as::<_, Debt>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await?;

        Ok(debt)
    }

    /// Lists active debts in a shop, oldest due date first.
    pub async fn list_active(&self, shop_id: &str) -> DbResult<Vec<Debt>> {
        let sql = format!(
            "SELECT {DEBT_COLUMNS} FROM debts \
             WHERE shop_id = ?1 AND status = 'active' \
             ORDER BY due_date ASC, created_at ASC"
        );
        let debts = sqlx::query_as::<_, Debt>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(debts)
    }

    /// Lists the debts hanging off one originating event.
    pub async fn list_by_origin(
        &self,
        exec: impl SqliteExecutor<'_>,
        origin_kind: OriginKind,
        origin_id: &str,
    ) -> DbResult<Vec<Debt>> {
        let sql = format!(
            "SELECT {DEBT_COLUMNS} FROM debts \
             WHERE origin_kind = ?1 AND origin_id = ?2 ORDER BY created_at ASC, id ASC"
        );
        let debts = sqlx::query_as::<_, Debt>(&sql)
            .bind(origin_kind)
            .bind(origin_id)
            .fetch_all(exec)
            .await?;

        Ok(debts)
    }

    /// Inserts a new debt.
    pub async fn insert(&self, exec: impl SqliteExecutor<'_>, debt: &Debt) -> DbResult<()> {
        debug!(
            id = %debt.id,
            kind = ?debt.kind,
            amount = debt.amount_minor,
            "Inserting debt"
        );

        sqlx::query(
            r#"
            INSERT INTO debts (
                id, shop_id, kind, currency, debtor, creditor, debtor_phone,
                amount_minor, paid_amount_minor, status, due_date,
                origin_kind, origin_id, note, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&debt.id)
        .bind(&debt.shop_id)
        .bind(debt.kind)
        .bind(debt.currency)
        .bind(&debt.debtor)
        .bind(&debt.creditor)
        .bind(&debt.debtor_phone)
        .bind(debt.amount_minor)
        .bind(debt.paid_amount_minor)
        .bind(debt.status)
        .bind(debt.due_date)
        .bind(debt.origin_kind)
        .bind(debt.origin_id.as_str())
        .bind(&debt.note)
        .bind(debt.created_at)
        .bind(debt.updated_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Deletes every debt linked to one originating event.
    ///
    /// Payments cascade with their debts. Returns the number of debts
    /// removed; zero is normal (a cash-only sale created none).
    pub async fn delete_by_origin(
        &self,
        exec: impl SqliteExecutor<'_>,
        origin_kind: OriginKind,
        origin_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM debts WHERE origin_kind = ?1 AND origin_id = ?2")
            .bind(origin_kind)
            .bind(origin_id)
            .execute(exec)
            .await?;

        debug!(
            origin_kind = ?origin_kind,
            origin_id = %origin_id,
            removed = result.rows_affected(),
            "Deleted debts by origin"
        );

        Ok(result.rows_affected())
    }

    /// Writes the re-derived paid total and status for a debt.
    pub async fn update_settlement(
        &self,
        exec: impl SqliteExecutor<'_>,
        debt_id: &str,
        paid_minor: i64,
        status: DebtStatus,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE debts SET paid_amount_minor = ?2, status = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(debt_id)
        .bind(paid_minor)
        .bind(status)
        .bind(now)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Debt", debt_id));
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Gets a debt payment by ID.
    pub async fn get_payment(&self, id: &str) -> DbResult<DebtPayment> {
        let payment = sqlx::query_as::<_, DebtPayment>(
            "SELECT id, debt_id, amount_minor, note, created_at \
             FROM debt_payments WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        payment.ok_or_else(|| DbError::not_found("DebtPayment", id))
    }

    /// Lists a debt's payments, oldest first.
    pub async fn list_payments(
        &self,
        exec: impl SqliteExecutor<'_>,
        debt_id: &str,
    ) -> DbResult<Vec<DebtPayment>> {
        let payments = sqlx::query_as::<_, DebtPayment>(
            "SELECT id, debt_id, amount_minor, note, created_at \
             FROM debt_payments WHERE debt_id = ?1 ORDER BY created_at ASC, id ASC",
        )
        .bind(debt_id)
        .fetch_all(exec)
        .await?;

        Ok(payments)
    }

    /// Inserts a debt payment.
    pub async fn insert_payment(
        &self,
        exec: impl SqliteExecutor<'_>,
        payment: &DebtPayment,
    ) -> DbResult<()> {
        debug!(
            id = %payment.id,
            debt_id = %payment.debt_id,
            amount = payment.amount_minor,
            "Inserting debt payment"
        );

        sqlx::query(
            "INSERT INTO debt_payments (id, debt_id, amount_minor, note, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&payment.id)
        .bind(&payment.debt_id)
        .bind(payment.amount_minor)
        .bind(&payment.note)
        .bind(payment.created_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Deletes a debt payment.
    pub async fn delete_payment(&self, exec: impl SqliteExecutor<'_>, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM debt_payments WHERE id = ?1")
            .bind(id)
            .execute(exec)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DebtPayment", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use savdo_core::types::{Currency, DebtKind};

    pub(crate) fn debt_fixture(shop_id: &str, origin_id: &str, amount_minor: i64) -> Debt {
        let now = Utc::now();
        Debt {
            id: generate_id(),
            shop_id: shop_id.to_string(),
            kind: DebtKind::CustomerToSeller,
            currency: Currency::Usd,
            debtor: "Karim".into(),
            creditor: "Olim".into(),
            debtor_phone: None,
            amount_minor,
            paid_amount_minor: 0,
            status: DebtStatus::Active,
            due_date: now.date_naive().succ_opt(),
            origin_kind: OriginKind::PhoneSale,
            origin_id: origin_id.to_string(),
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_by_origin() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.debts();

        let customer = debt_fixture("shop1", "sale1", 100_00);
        let mut seller = debt_fixture("shop1", "sale1", 100_00);
        seller.kind = DebtKind::SellerToBoss;
        let unrelated = debt_fixture("shop1", "sale2", 50_00);

        repo.insert(db.pool(), &customer).await.unwrap();
        repo.insert(db.pool(), &seller).await.unwrap();
        repo.insert(db.pool(), &unrelated).await.unwrap();

        let linked = repo
            .list_by_origin(db.pool(), OriginKind::PhoneSale, "sale1")
            .await
            .unwrap();
        assert_eq!(linked.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_by_origin_cascades_payments() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.debts();

        let debt = debt_fixture("shop1", "sale1", 100_00);
        repo.insert(db.pool(), &debt).await.unwrap();

        let payment = DebtPayment {
            id: generate_id(),
            debt_id: debt.id.clone(),
            amount_minor: 40_00,
            note: None,
            created_at: Utc::now(),
        };
        repo.insert_payment(db.pool(), &payment).await.unwrap();

        let removed = repo
            .delete_by_origin(db.pool(), OriginKind::PhoneSale, "sale1")
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let err = repo.get_payment(&payment.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_by_origin_zero_rows_is_ok() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let removed = db
            .debts()
            .delete_by_origin(db.pool(), OriginKind::AccessorySale, "nothing")
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_update_settlement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.debts();

        let debt = debt_fixture("shop1", "sale1", 100_00);
        repo.insert(db.pool(), &debt).await.unwrap();

        repo.update_settlement(db.pool(), &debt.id, 100_00, DebtStatus::Paid)
            .await
            .unwrap();

        let loaded = repo.get(&debt.id).await.unwrap();
        assert_eq!(loaded.paid_amount_minor, 100_00);
        assert_eq!(loaded.status, DebtStatus::Paid);
    }
}
