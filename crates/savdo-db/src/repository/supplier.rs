//! # Supplier Repository
//!
//! Database operations for suppliers, their payments, and the per-phone
//! allocation detail rows the settlement engine writes.
//!
//! ## Balance Identity
//! ```text
//! balance = initial_debt + total_debt
//! ```
//! Both figures are current outstanding amounts; the settlement service
//! re-derives `total_debt` from SUM(phones.debt_balance_minor) inside
//! the same transaction that changed the balances. `total_paid` is the
//! lifetime paid figure.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use savdo_core::types::{Supplier, SupplierPayment, SupplierPaymentDetail};

const SUPPLIER_COLUMNS: &str = "id, name, phone, initial_debt_minor, \
     total_debt_minor, total_paid_minor, created_at, updated_at";

const PAYMENT_COLUMNS: &str =
    "id, supplier_id, amount_minor, leftover_minor, source, payment_type, note, created_at";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    // ------------------------------------------------------------------
    // Suppliers
    // ------------------------------------------------------------------

    /// Gets a supplier by ID, erroring when it does not exist.
    pub async fn get(&self, id: &str) -> DbResult<Supplier> {
        self.fetch(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Fetches a supplier by ID on any executor.
    pub async fn fetch(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
    ) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await?;

        Ok(supplier)
    }

    /// Lists all suppliers, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name ASC");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    /// Inserts a new supplier.
    pub async fn insert(&self, exec: impl SqliteExecutor<'_>, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, phone, initial_debt_minor,
                total_debt_minor, total_paid_minor,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(supplier.initial_debt_minor)
        .bind(supplier.total_debt_minor)
        .bind(supplier.total_paid_minor)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Updates supplier contact fields.
    pub async fn update(&self, exec: impl SqliteExecutor<'_>, supplier: &Supplier) -> DbResult<()> {
        let now = Utc::now();

        let result =
            sqlx::query("UPDATE suppliers SET name = ?2, phone = ?3, updated_at = ?4 WHERE id = ?1")
                .bind(&supplier.id)
                .bind(&supplier.name)
                .bind(&supplier.phone)
                .bind(now)
                .execute(exec)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", &supplier.id));
        }

        Ok(())
    }

    /// Writes the three ledger figures in one statement.
    ///
    /// `initial_debt_minor` and `total_debt_minor` are absolute values the
    /// caller has just re-derived; `total_paid_delta` is relative so
    /// reversal can subtract what allocation added.
    pub async fn apply_settlement(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        initial_debt_minor: i64,
        total_debt_minor: i64,
        total_paid_delta: i64,
    ) -> DbResult<()> {
        debug!(
            supplier_id = %id,
            initial_debt = initial_debt_minor,
            total_debt = total_debt_minor,
            paid_delta = total_paid_delta,
            "Applying settlement figures"
        );

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE suppliers SET initial_debt_minor = ?2, total_debt_minor = ?3, \
             total_paid_minor = total_paid_minor + ?4, updated_at = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(initial_debt_minor)
        .bind(total_debt_minor)
        .bind(total_paid_delta)
        .bind(now)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Gets a payment by ID, erroring when it does not exist.
    pub async fn get_payment(&self, id: &str) -> DbResult<SupplierPayment> {
        self.fetch_payment(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("SupplierPayment", id))
    }

    /// Fetches a payment by ID on any executor.
    pub async fn fetch_payment(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
    ) -> DbResult<Option<SupplierPayment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM supplier_payments WHERE id = ?1");
        let payment = sqlx::query_as::<_, SupplierPayment>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await?;

        Ok(payment)
    }

    /// Lists payments made to a supplier, newest first.
    pub async fn list_payments(&self, supplier_id: &str) -> DbResult<Vec<SupplierPayment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM supplier_payments \
             WHERE supplier_id = ?1 ORDER BY created_at DESC, id DESC"
        );
        let payments = sqlx::query_as::<_, SupplierPayment>(&sql)
            .bind(supplier_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Inserts a payment record.
    pub async fn insert_payment(
        &self,
        exec: impl SqliteExecutor<'_>,
        payment: &SupplierPayment,
    ) -> DbResult<()> {
        debug!(
            id = %payment.id,
            supplier_id = %payment.supplier_id,
            amount = payment.amount_minor,
            "Inserting supplier payment"
        );

        sqlx::query(
            r#"
            INSERT INTO supplier_payments (
                id, supplier_id, amount_minor, leftover_minor, source,
                payment_type, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.supplier_id)
        .bind(payment.amount_minor)
        .bind(payment.leftover_minor)
        .bind(payment.source)
        .bind(payment.payment_type)
        .bind(&payment.note)
        .bind(payment.created_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Rewrites a payment's figures in place.
    ///
    /// The edit flow keeps the row's id, created_at and payment_type so
    /// the payment holds its position and mode in payment history.
    pub async fn update_payment(
        &self,
        exec: impl SqliteExecutor<'_>,
        payment: &SupplierPayment,
    ) -> DbResult<()> {
        debug!(id = %payment.id, amount = payment.amount_minor, "Updating supplier payment");

        let result = sqlx::query(
            "UPDATE supplier_payments SET amount_minor = ?2, leftover_minor = ?3, \
             source = ?4, note = ?5 WHERE id = ?1",
        )
        .bind(&payment.id)
        .bind(payment.amount_minor)
        .bind(payment.leftover_minor)
        .bind(payment.source)
        .bind(&payment.note)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SupplierPayment", &payment.id));
        }

        Ok(())
    }

    /// Deletes a payment; detail rows go with it via ON DELETE CASCADE.
    pub async fn delete_payment(&self, exec: impl SqliteExecutor<'_>, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM supplier_payments WHERE id = ?1")
            .bind(id)
            .execute(exec)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SupplierPayment", id));
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Allocation details
    // ------------------------------------------------------------------

    /// Inserts one allocation line.
    pub async fn insert_detail(
        &self,
        exec: impl SqliteExecutor<'_>,
        detail: &SupplierPaymentDetail,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO supplier_payment_details (
                id, payment_id, phone_id, allocated_minor,
                previous_balance_minor, new_balance_minor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&detail.id)
        .bind(&detail.payment_id)
        .bind(&detail.phone_id)
        .bind(detail.allocated_minor)
        .bind(detail.previous_balance_minor)
        .bind(detail.new_balance_minor)
        .bind(detail.created_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Removes a payment's allocation lines.
    ///
    /// Reversal deletes details explicitly so the edit flow can re-run
    /// allocation under the same payment row.
    pub async fn delete_details(
        &self,
        exec: impl SqliteExecutor<'_>,
        payment_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM supplier_payment_details WHERE payment_id = ?1")
            .bind(payment_id)
            .execute(exec)
            .await?;

        Ok(result.rows_affected())
    }

    /// Lists a payment's allocation lines in the order they were applied.
    pub async fn list_details(
        &self,
        exec: impl SqliteExecutor<'_>,
        payment_id: &str,
    ) -> DbResult<Vec<SupplierPaymentDetail>> {
        let details = sqlx::query_as::<_, SupplierPaymentDetail>(
            "SELECT id, payment_id, phone_id, allocated_minor, \
             previous_balance_minor, new_balance_minor, created_at \
             FROM supplier_payment_details WHERE payment_id = ?1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(payment_id)
        .fetch_all(exec)
        .await?;

        Ok(details)
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
    use savdo_core::types::{PaymentSource, SupplierPaymentType};

    /// Inserts a supplier with the given opening debt and returns its id.
    pub(crate) async fn insert_supplier(db: &Database, initial_debt_minor: i64) -> String {
        let now = Utc::now();
        let supplier = Supplier {
            id: generate_id(),
            name: "Akmal".into(),
            phone: Some("+998901234567".into()),
            initial_debt_minor,
            total_debt_minor: 0,
            total_paid_minor: 0,
            created_at: now,
            updated_at: now,
        };
        db.suppliers()
            .insert(db.pool(), &supplier)
            .await
            .unwrap();
        supplier.id
    }

    fn payment_fixture(supplier_id: &str, amount_minor: i64) -> SupplierPayment {
        SupplierPayment {
            id: generate_id(),
            supplier_id: supplier_id.to_string(),
            amount_minor,
            leftover_minor: 0,
            source: PaymentSource::Cash,
            payment_type: SupplierPaymentType::General,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let id = insert_supplier(&db, 100_00).await;
        let supplier = db.suppliers().get(&id).await.unwrap();
        assert_eq!(supplier.initial_debt_minor, 100_00);
        assert_eq!(supplier.balance().minor(), 100_00);
    }

    #[tokio::test]
    async fn test_get_missing_supplier() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.suppliers().get("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_apply_settlement_paid_is_relative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.suppliers();

        let id = insert_supplier(&db, 50_00).await;
        repo.apply_settlement(db.pool(), &id, 50_00, 200_00, 80_00)
            .await
            .unwrap();
        repo.apply_settlement(db.pool(), &id, 50_00, 120_00, -30_00)
            .await
            .unwrap();

        let supplier = repo.get(&id).await.unwrap();
        assert_eq!(supplier.total_debt_minor, 120_00);
        assert_eq!(supplier.total_paid_minor, 50_00);
        assert_eq!(supplier.balance().minor(), 170_00);
    }

    #[tokio::test]
    async fn test_delete_payment_cascades_details() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.suppliers();

        let supplier_id = insert_supplier(&db, 0).await;
        let payment = payment_fixture(&supplier_id, 100_00);
        repo.insert_payment(db.pool(), &payment).await.unwrap();

        let mut phone = crate::repository::phone::tests::phone_fixture("shop1");
        phone.supplier_id = Some(supplier_id.clone());
        db.phones().insert(db.pool(), &phone).await.unwrap();

        let detail = SupplierPaymentDetail {
            id: generate_id(),
            payment_id: payment.id.clone(),
            phone_id: phone.id.clone(),
            allocated_minor: 100_00,
            previous_balance_minor: 200_00,
            new_balance_minor: 100_00,
            created_at: Utc::now(),
        };
        repo.insert_detail(db.pool(), &detail).await.unwrap();
        assert_eq!(repo.list_details(db.pool(), &payment.id).await.unwrap().len(), 1);

        repo.delete_payment(db.pool(), &payment.id).await.unwrap();
        assert!(repo.list_details(db.pool(), &payment.id).await.unwrap().is_empty());
    }
}
