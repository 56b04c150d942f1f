//! # Accessory Repository
//!
//! Database operations for counted accessory stock.
//!
//! ## Key Operations
//! - Stock lines keyed by per-shop numeric code
//! - Atomic quantity adjustments (`quantity = quantity + ?`)
//! - Immutable restock history feeding the moving average

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use savdo_core::types::{Accessory, AccessoryPurchase};

const ACCESSORY_COLUMNS: &str = "id, shop_id, code, name, quantity, \
     avg_purchase_price_minor, sale_price_minor, created_at, updated_at";

/// Repository for accessory database operations.
#[derive(Debug, Clone)]
pub struct AccessoryRepository {
    pool: SqlitePool,
}

impl AccessoryRepository {
    /// Creates a new AccessoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccessoryRepository { pool }
    }

    /// Gets an accessory by ID, erroring when it does not exist.
    pub async fn get(&self, id: &str) -> DbResult<Accessory> {
        self.fetch(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Accessory", id))
    }

    /// Fetches an accessory by ID on any executor.
    pub async fn fetch(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
    ) -> DbResult<Option<Accessory>> {
        let sql = format!("SELECT {ACCESSORY_COLUMNS} FROM accessories WHERE id = ?1");
        let accessory = sqlx::query_as::<_, Accessory>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await?;

        Ok(accessory)
    }

    /// Finds an accessory by its per-shop code.
    pub async fn find_by_code(&self, shop_id: &str, code: &str) -> DbResult<Option<Accessory>> {
        let sql =
            format!("SELECT {ACCESSORY_COLUMNS} FROM accessories WHERE shop_id = ?1 AND code = ?2");
        let accessory = sqlx::query_as::<_, Accessory>(&sql)
            .bind(shop_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(accessory)
    }

    /// Returns the numerically highest code in a shop, if any.
    ///
    /// CAST keeps the comparison numeric once codes outgrow the
    /// zero-padded width.
    pub async fn max_code(
        &self,
        exec: impl SqliteExecutor<'_>,
        shop_id: &str,
    ) -> DbResult<Option<String>> {
        let code: Option<String> = sqlx::query_scalar(
            "SELECT code FROM accessories WHERE shop_id = ?1 \
             ORDER BY CAST(code AS INTEGER) DESC LIMIT 1",
        )
        .bind(shop_id)
        .fetch_optional(exec)
        .await?;

        Ok(code)
    }

    /// Inserts a new accessory line.
    pub async fn insert(
        &self,
        exec: impl SqliteExecutor<'_>,
        accessory: &Accessory,
    ) -> DbResult<()> {
        debug!(id = %accessory.id, code = %accessory.code, "Inserting accessory");

        sqlx::query(
            r#"
            INSERT INTO accessories (
                id, shop_id, code, name, quantity,
                avg_purchase_price_minor, sale_price_minor,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&accessory.id)
        .bind(&accessory.shop_id)
        .bind(&accessory.code)
        .bind(&accessory.name)
        .bind(accessory.quantity)
        .bind(accessory.avg_purchase_price_minor)
        .bind(accessory.sale_price_minor)
        .bind(accessory.created_at)
        .bind(accessory.updated_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Updates name and sale price.
    pub async fn update(
        &self,
        exec: impl SqliteExecutor<'_>,
        accessory: &Accessory,
    ) -> DbResult<()> {
        debug!(id = %accessory.id, "Updating accessory");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE accessories SET name = ?2, sale_price_minor = ?3, updated_at = ?4 \
             WHERE id = ?1",
        )
        .bind(&accessory.id)
        .bind(&accessory.name)
        .bind(accessory.sale_price_minor)
        .bind(now)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Accessory", &accessory.id));
        }

        Ok(())
    }

    /// Adjusts the counted quantity by a delta.
    ///
    /// Always a relative update so two concurrent restocks can't clobber
    /// each other's counts.
    pub async fn adjust_quantity(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting accessory quantity");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE accessories SET quantity = quantity + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Accessory", id));
        }

        Ok(())
    }

    /// Writes the recomputed moving-average purchase price.
    pub async fn set_avg_price(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        avg_minor: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE accessories SET avg_purchase_price_minor = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(avg_minor)
        .bind(now)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Accessory", id));
        }

        Ok(())
    }

    /// Inserts one restock history row.
    pub async fn insert_purchase(
        &self,
        exec: impl SqliteExecutor<'_>,
        purchase: &AccessoryPurchase,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accessory_purchases (
                id, accessory_id, quantity, unit_price_minor, recorded_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.accessory_id)
        .bind(purchase.quantity)
        .bind(purchase.unit_price_minor)
        .bind(&purchase.recorded_by)
        .bind(purchase.created_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Lists the full restock history for an accessory, oldest first.
    pub async fn list_purchases(
        &self,
        exec: impl SqliteExecutor<'_>,
        accessory_id: &str,
    ) -> DbResult<Vec<AccessoryPurchase>> {
        let purchases = sqlx::query_as::<_, AccessoryPurchase>(
            "SELECT id, accessory_id, quantity, unit_price_minor, recorded_by, created_at \
             FROM accessory_purchases WHERE accessory_id = ?1 ORDER BY created_at ASC, id ASC",
        )
        .bind(accessory_id)
        .fetch_all(exec)
        .await?;

        Ok(purchases)
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

    pub(crate) fn accessory_fixture(shop_id: &str, code: &str) -> Accessory {
        let now = Utc::now();
        Accessory {
            id: generate_id(),
            shop_id: shop_id.to_string(),
            code: code.to_string(),
            name: "Silicone case".into(),
            quantity: 0,
            avg_purchase_price_minor: 0,
            sale_price_minor: 25_000_00,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accessories();

        let accessory = accessory_fixture("shop1", "0001");
        repo.insert(db.pool(), &accessory).await.unwrap();

        let found = repo.find_by_code("shop1", "0001").await.unwrap().unwrap();
        assert_eq!(found.id, accessory.id);

        assert!(repo.find_by_code("shop2", "0001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_in_shop_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accessories();

        repo.insert(db.pool(), &accessory_fixture("shop1", "0001"))
            .await
            .unwrap();
        let err = repo
            .insert(db.pool(), &accessory_fixture("shop1", "0001"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // same code in a different shop is fine
        repo.insert(db.pool(), &accessory_fixture("shop2", "0001"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_max_code_is_numeric() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accessories();

        assert!(repo.max_code(db.pool(), "shop1").await.unwrap().is_none());

        repo.insert(db.pool(), &accessory_fixture("shop1", "0002"))
            .await
            .unwrap();
        repo.insert(db.pool(), &accessory_fixture("shop1", "0010"))
            .await
            .unwrap();

        let max = repo.max_code(db.pool(), "shop1").await.unwrap();
        assert_eq!(max.as_deref(), Some("0010"));
    }

    #[tokio::test]
    async fn test_adjust_quantity_is_relative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accessories();

        let accessory = accessory_fixture("shop1", "0001");
        repo.insert(db.pool(), &accessory).await.unwrap();

        repo.adjust_quantity(db.pool(), &accessory.id, 10).await.unwrap();
        repo.adjust_quantity(db.pool(), &accessory.id, -3).await.unwrap();

        assert_eq!(repo.get(&accessory.id).await.unwrap().quantity, 7);
    }
}
