//! # Cash Flow Repository
//!
//! Persistence for the signed cash-flow ledger.
//!
//! ## Upsert-In-Place
//! `(kind, origin_id)` is unique, so an event edit replaces its entry
//! instead of stacking a second row. When an edit derives no entry at
//! all (cash dropped to zero, source moved to the safe), the caller
//! deletes by origin instead.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use savdo_core::cashflow::PlannedCashFlow;
use savdo_core::types::{CashFlowKind, CashFlowTransaction};

const CASHFLOW_COLUMNS: &str = "id, shop_id, kind, currency, amount_minor, profit_minor, \
     origin_id, occurred_on, description, created_at";

/// Repository for cash-flow ledger operations.
#[derive(Debug, Clone)]
pub struct CashFlowRepository {
    pool: SqlitePool,
}

impl CashFlowRepository {
    /// Creates a new CashFlowRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashFlowRepository { pool }
    }

    /// Gets an entry by ID.
    pub async fn get(&self, id: &str) -> DbResult<CashFlowTransaction> {
        let sql = format!("SELECT {CASHFLOW_COLUMNS} FROM cashflow_transactions WHERE id = ?1");
        let entry = sqlx::query_as::<_, CashFlowTransaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        entry.ok_or_else(|| DbError::not_found("CashFlowTransaction", id))
    }

    /// Finds the entry for one originating event, if any.
    pub async fn find_by_origin(
        &self,
        exec: impl SqliteExecutor<'_>,
        kind: CashFlowKind,
        origin_id: &str,
    ) -> DbResult<Option<CashFlowTransaction>> {
        let sql = format!(
            "SELECT {CASHFLOW_COLUMNS} FROM cashflow_transactions \
             WHERE kind = ?1 AND origin_id = ?2"
        );
        let entry = sqlx::query_as::<_, CashFlowTransaction>(&sql)
            .bind(kind)
            .bind(origin_id)
            .fetch_optional(exec)
            .await?;

        Ok(entry)
    }

    /// Inserts or replaces the entry for a planned cash flow.
    ///
    /// The conflict target is `(kind, origin_id)`: re-recording an edited
    /// event overwrites amount, profit, date and description while the
    /// row id and created_at stay put.
    pub async fn upsert(
        &self,
        exec: impl SqliteExecutor<'_>,
        planned: &PlannedCashFlow,
    ) -> DbResult<()> {
        debug!(
            kind = ?planned.kind,
            origin_id = %planned.origin_id,
            amount = planned.amount_minor,
            "Upserting cash-flow entry"
        );

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO cashflow_transactions (
                id, shop_id, kind, currency, amount_minor, profit_minor,
                origin_id, occurred_on, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (kind, origin_id) DO UPDATE SET
                shop_id      = excluded.shop_id,
                currency     = excluded.currency,
                amount_minor = excluded.amount_minor,
                profit_minor = excluded.profit_minor,
                occurred_on  = excluded.occurred_on,
                description  = excluded.description
            "#,
        )
        .bind(generate_id())
        .bind(&planned.shop_id)
        .bind(planned.kind)
        .bind(planned.currency)
        .bind(planned.amount_minor)
        .bind(planned.profit_minor)
        .bind(&planned.origin_id)
        .bind(planned.occurred_on)
        .bind(&planned.description)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Removes the entry for one originating event.
    ///
    /// Zero rows is normal: the event may never have moved cash.
    pub async fn delete_by_origin(
        &self,
        exec: impl SqliteExecutor<'_>,
        kind: CashFlowKind,
        origin_id: &str,
    ) -> DbResult<u64> {
        let result =
            sqlx::query("DELETE FROM cashflow_transactions WHERE kind = ?1 AND origin_id = ?2")
                .bind(kind)
                .bind(origin_id)
                .execute(exec)
                .await?;

        Ok(result.rows_affected())
    }

    /// Lists a shop's entries with `from <= occurred_on <= to`, oldest
    /// first.
    pub async fn list_between(
        &self,
        shop_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<CashFlowTransaction>> {
        let sql = format!(
            "SELECT {CASHFLOW_COLUMNS} FROM cashflow_transactions \
             WHERE shop_id = ?1 AND occurred_on >= ?2 AND occurred_on <= ?3 \
             ORDER BY occurred_on ASC, created_at ASC"
        );
        let entries = sqlx::query_as::<_, CashFlowTransaction>(&sql)
            .bind(shop_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
