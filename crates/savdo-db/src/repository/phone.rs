//! # Phone Repository
//!
//! Database operations for phone units.
//!
//! ## Key Operations
//! - CRUD for serialized stock (one row per unit)
//! - Status flips driven by sale events
//! - Supplier balance reads in FIFO order for the settlement engine

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use savdo_core::types::{Phone, PhoneStatus};

/// Columns selected for every Phone read; keep in sync with the struct.
const PHONE_COLUMNS: &str = "id, shop_id, model, imei, status, source, supplier_id, \
     external_seller_name, external_seller_phone, original_owner_name, original_owner_phone, \
     daily_payment_minor, purchase_price_minor, imei_cost_minor, repair_cost_minor, \
     cost_price_minor, sale_price_minor, debt_balance_minor, created_at, updated_at";

/// Repository for phone database operations.
#[derive(Debug, Clone)]
pub struct PhoneRepository {
    pool: SqlitePool,
}

impl PhoneRepository {
    /// Creates a new PhoneRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PhoneRepository { pool }
    }

    /// Gets a phone by ID, erroring when it does not exist.
    pub async fn get(&self, id: &str) -> DbResult<Phone> {
        self.fetch(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", id))
    }

    /// Fetches a phone by ID on any executor.
    pub async fn fetch(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
    ) -> DbResult<Option<Phone>> {
        let sql = format!("SELECT {PHONE_COLUMNS} FROM phones WHERE id = ?1");
        let phone = sqlx::query_as::<_, Phone>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await?;

        Ok(phone)
    }

    /// Lists phones in a shop with the given status.
    pub async fn list_by_status(&self, shop_id: &str, status: PhoneStatus) -> DbResult<Vec<Phone>> {
        let sql = format!(
            "SELECT {PHONE_COLUMNS} FROM phones \
             WHERE shop_id = ?1 AND status = ?2 ORDER BY created_at DESC"
        );
        let phones = sqlx::query_as::<_, Phone>(&sql)
            .bind(shop_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(phones)
    }

    /// Lists a supplier's phones with outstanding balance, oldest first.
    ///
    /// This is the FIFO order the settlement engine walks:
    /// `created_at ASC, id ASC` (id breaks created_at ties
    /// deterministically).
    pub async fn unpaid_for_supplier(
        &self,
        exec: impl SqliteExecutor<'_>,
        supplier_id: &str,
    ) -> DbResult<Vec<Phone>> {
        let sql = format!(
            "SELECT {PHONE_COLUMNS} FROM phones \
             WHERE supplier_id = ?1 AND debt_balance_minor > 0 \
             ORDER BY created_at ASC, id ASC"
        );
        let phones = sqlx::query_as::<_, Phone>(&sql)
            .bind(supplier_id)
            .fetch_all(exec)
            .await?;

        Ok(phones)
    }

    /// Sums a supplier's outstanding per-phone balances.
    ///
    /// The supplier's `total_debt` is always re-derived from this sum,
    /// never incremented.
    pub async fn sum_supplier_balances(
        &self,
        exec: impl SqliteExecutor<'_>,
        supplier_id: &str,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(debt_balance_minor), 0) FROM phones WHERE supplier_id = ?1",
        )
        .bind(supplier_id)
        .fetch_one(exec)
        .await?;

        Ok(total)
    }

    /// Inserts a new phone.
    pub async fn insert(&self, exec: impl SqliteExecutor<'_>, phone: &Phone) -> DbResult<()> {
        debug!(id = %phone.id, model = %phone.model, "Inserting phone");

        sqlx::query(
            r#"
            INSERT INTO phones (
                id, shop_id, model, imei, status, source, supplier_id,
                external_seller_name, external_seller_phone,
                original_owner_name, original_owner_phone, daily_payment_minor,
                purchase_price_minor, imei_cost_minor, repair_cost_minor,
                cost_price_minor, sale_price_minor, debt_balance_minor,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14, ?15,
                ?16, ?17, ?18,
                ?19, ?20
            )
            "#,
        )
        .bind(&phone.id)
        .bind(&phone.shop_id)
        .bind(&phone.model)
        .bind(&phone.imei)
        .bind(phone.status)
        .bind(phone.source)
        .bind(&phone.supplier_id)
        .bind(&phone.external_seller_name)
        .bind(&phone.external_seller_phone)
        .bind(&phone.original_owner_name)
        .bind(&phone.original_owner_phone)
        .bind(phone.daily_payment_minor)
        .bind(phone.purchase_price_minor)
        .bind(phone.imei_cost_minor)
        .bind(phone.repair_cost_minor)
        .bind(phone.cost_price_minor)
        .bind(phone.sale_price_minor)
        .bind(phone.debt_balance_minor)
        .bind(phone.created_at)
        .bind(phone.updated_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Updates a phone's editable fields (cost components included).
    pub async fn update(&self, exec: impl SqliteExecutor<'_>, phone: &Phone) -> DbResult<()> {
        debug!(id = %phone.id, "Updating phone");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE phones SET
                model = ?2,
                imei = ?3,
                status = ?4,
                sale_price_minor = ?5,
                purchase_price_minor = ?6,
                imei_cost_minor = ?7,
                repair_cost_minor = ?8,
                cost_price_minor = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&phone.id)
        .bind(&phone.model)
        .bind(&phone.imei)
        .bind(phone.status)
        .bind(phone.sale_price_minor)
        .bind(phone.purchase_price_minor)
        .bind(phone.imei_cost_minor)
        .bind(phone.repair_cost_minor)
        .bind(phone.cost_price_minor)
        .bind(now)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Phone", &phone.id));
        }

        Ok(())
    }

    /// Flips a phone's lifecycle status.
    pub async fn set_status(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        status: PhoneStatus,
    ) -> DbResult<()> {
        debug!(id = %id, status = ?status, "Setting phone status");

        let now = Utc::now();

        let result = sqlx::query("UPDATE phones SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(exec)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Phone", id));
        }

        Ok(())
    }

    /// Sets a phone's supplier balance to an absolute value.
    ///
    /// Used by allocation, which has just read the balance inside the
    /// same transaction.
    pub async fn set_balance(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        balance_minor: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result =
            sqlx::query("UPDATE phones SET debt_balance_minor = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(balance_minor)
                .bind(now)
                .execute(exec)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Phone", id));
        }

        Ok(())
    }

    /// Adds a delta to a phone's supplier balance.
    ///
    /// Used by reversal, which replays detail rows additively so
    /// concurrent edits to the same phone cannot be clobbered.
    pub async fn add_to_balance(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        delta_minor: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE phones SET debt_balance_minor = debt_balance_minor + ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(delta_minor)
        .bind(now)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Phone", id));
        }

        Ok(())
    }

    /// Deletes a phone (exchange rollback deletes the traded-in unit).
    pub async fn delete(&self, exec: impl SqliteExecutor<'_>, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting phone");

        let result = sqlx::query("DELETE FROM phones WHERE id = ?1")
            .bind(id)
            .execute(exec)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Phone", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
