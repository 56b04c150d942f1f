//! # Report Service
//!
//! Period reports over the cash-flow and debt ledgers.
//!
//! ## Direction Comes From the Sign
//! Totals are sums over signed entries; no report branches on the kind
//! of an entry to decide whether it was income. The per-kind breakdown
//! is presentation, not arithmetic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use crate::repository::cashflow::CashFlowRepository;
use savdo_core::cashflow::{summarize, CashFlowSummary};
use savdo_core::types::{CashFlowKind, Currency};

// =============================================================================
// Report Types
// =============================================================================

/// Net movement for one event kind in one currency.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KindBreakdown {
    pub kind: CashFlowKind,
    pub currency: Currency,
    /// Signed sum over the period.
    pub total_minor: i64,
    pub entry_count: i64,
}

/// Debt movement over a period, one currency.
///
/// Only customer-facing debts are counted; seller-to-boss mirror rows
/// track the same money and would double it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DebtTotals {
    /// New debt extended in the period.
    pub given_minor: i64,
    /// Repayments collected in the period.
    pub received_minor: i64,
}

/// A full period report for one shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReport {
    pub shop_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub cashflow: CashFlowSummary,
    /// Cash left over: income minus every outflow, per currency.
    pub cash_balance_usd_minor: i64,
    pub cash_balance_som_minor: i64,
    pub by_kind: Vec<KindBreakdown>,
    pub debts_usd: DebtTotals,
    pub debts_som: DebtTotals,
}

// =============================================================================
// Service
// =============================================================================

/// Report use-cases. Read-only.
#[derive(Debug, Clone)]
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    /// Creates a new ReportService.
    pub fn new(pool: SqlitePool) -> Self {
        ReportService { pool }
    }

    fn cashflow(&self) -> CashFlowRepository {
        CashFlowRepository::new(self.pool.clone())
    }

    /// Cash-flow summary over an inclusive date range.
    pub async fn cashflow_summary(
        &self,
        shop_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<CashFlowSummary> {
        let entries = self.cashflow().list_between(shop_id, from, to).await?;
        Ok(summarize(&entries))
    }

    /// Full report over an inclusive date range.
    pub async fn period_report(
        &self,
        shop_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<PeriodReport> {
        let cashflow = self.cashflow_summary(shop_id, from, to).await?;

        let by_kind = sqlx::query_as::<_, KindBreakdown>(
            "SELECT kind, currency, SUM(amount_minor) AS total_minor, \
             COUNT(*) AS entry_count \
             FROM cashflow_transactions \
             WHERE shop_id = ?1 AND occurred_on >= ?2 AND occurred_on <= ?3 \
             GROUP BY kind, currency ORDER BY kind, currency",
        )
        .bind(shop_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let debts_usd = self.debt_totals(shop_id, Currency::Usd, from, to).await?;
        let debts_som = self.debt_totals(shop_id, Currency::Som, from, to).await?;

        Ok(PeriodReport {
            shop_id: shop_id.to_string(),
            from,
            to,
            cash_balance_usd_minor: cashflow.usd.net().minor(),
            cash_balance_som_minor: cashflow.som.net().minor(),
            cashflow,
            by_kind,
            debts_usd,
            debts_som,
        })
    }

    /// Report for a single day.
    pub async fn daily_report(&self, shop_id: &str, day: NaiveDate) -> DbResult<PeriodReport> {
        self.period_report(shop_id, day, day).await
    }

    /// Report for a calendar month.
    pub async fn monthly_report(
        &self,
        shop_id: &str,
        year: i32,
        month: u32,
    ) -> DbResult<PeriodReport> {
        let from = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| DbError::Internal(format!("invalid month: {year}-{month}")))?;
        let to = next_month_start(year, month)
            .pred_opt()
            .ok_or_else(|| DbError::Internal(format!("invalid month: {year}-{month}")))?;
        self.period_report(shop_id, from, to).await
    }

    /// Report for a calendar year.
    pub async fn yearly_report(&self, shop_id: &str, year: i32) -> DbResult<PeriodReport> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| DbError::Internal(format!("invalid year: {year}")))?;
        let to = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| DbError::Internal(format!("invalid year: {year}")))?;
        self.period_report(shop_id, from, to).await
    }

    /// Sums debt given and collected over a period, one currency.
    ///
    /// Counts customer-facing rows only (mirror rows excluded).
    async fn debt_totals(
        &self,
        shop_id: &str,
        currency: Currency,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<DebtTotals> {
        let given_minor: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_minor), 0) FROM debts \
             WHERE shop_id = ?1 AND currency = ?2 AND kind = 'customer_to_seller' \
             AND date(created_at) >= ?3 AND date(created_at) <= ?4",
        )
        .bind(shop_id)
        .bind(currency)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let received_minor: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(p.amount_minor), 0) FROM debt_payments p \
             JOIN debts d ON d.id = p.debt_id \
             WHERE d.shop_id = ?1 AND d.currency = ?2 AND d.kind = 'customer_to_seller' \
             AND date(p.created_at) >= ?3 AND date(p.created_at) <= ?4",
        )
        .bind(shop_id)
        .bind(currency)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(DebtTotals {
            given_minor,
            received_minor,
        })
    }
}

fn next_month_start(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("january is always valid")
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap_or_else(|| {
            NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("january is always valid")
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
