//! # Sales Service
//!
//! Sale events and their ledger side-effects.
//!
//! ## What a Sale Touches
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_phone_sale (one transaction):                                   │
//! │                                                                         │
//! │    phones      status → Sold                                            │
//! │    debts       0..2 rows (customer → seller, seller → boss)             │
//! │    cashflow    one signed entry if any cash moved                       │
//! │                                                                         │
//! │  The sale itself has no table: the generated sale id is the origin      │
//! │  link every side-effect row carries, and the handle the caller keeps    │
//! │  for edits and deletes.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::accessory::AccessoryRepository;
use crate::repository::cashflow::CashFlowRepository;
use crate::repository::debt::DebtRepository;
use crate::repository::generate_id;
use crate::repository::phone::PhoneRepository;
use savdo_core::cashflow::{derive_transaction, CashFlowEvent};
use savdo_core::debt::{plan_sale_debts, PlannedDebt, SaleDebtInput};
use savdo_core::error::CoreError;
use savdo_core::money::Money;
use savdo_core::types::{
    CashFlowKind, Currency, Debt, DebtStatus, OriginKind, PhoneSource, PhoneStatus,
};
use savdo_core::validation::{validate_amount, validate_name, validate_payment_amount};

// =============================================================================
// Inputs / Outcomes
// =============================================================================

/// A phone sold over the counter.
#[derive(Debug, Clone)]
pub struct PhoneSaleInput {
    pub shop_id: String,
    pub phone_id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    /// Who made the sale.
    pub salesperson: String,
    /// Who owns the shop.
    pub owner: String,
    pub sale_price_minor: i64,
    /// Cash handed over now; the rest becomes debt.
    pub cash_received_minor: i64,
    pub due_date: Option<NaiveDate>,
    pub occurred_on: NaiveDate,
    pub note: Option<String>,
}

/// Accessories sold over the counter.
#[derive(Debug, Clone)]
pub struct AccessorySaleInput {
    pub shop_id: String,
    pub accessory_id: String,
    pub quantity: i64,
    /// Total charged for the batch, in som hundredths.
    pub total_price_minor: i64,
    pub cash_received_minor: i64,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub salesperson: String,
    pub owner: String,
    pub due_date: Option<NaiveDate>,
    pub occurred_on: NaiveDate,
    pub note: Option<String>,
}

/// A phone-for-phone exchange deal.
#[derive(Debug, Clone)]
pub struct ExchangeInput {
    pub shop_id: String,
    /// The shop's unit going out.
    pub phone_id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    /// The customer's unit coming in.
    pub traded_in_model: String,
    pub traded_in_imei: Option<String>,
    /// What the traded-in unit is worth to the shop.
    pub traded_in_value_minor: i64,
    /// Absolute price difference between the two units.
    pub difference_minor: i64,
    /// true: customer tops up; false: the shop pays out.
    pub customer_pays: bool,
    pub salesperson: String,
    pub owner: String,
    /// Part of the difference taken on credit (customer pays later).
    pub debt_amount_minor: i64,
    pub due_date: Option<NaiveDate>,
    pub occurred_on: NaiveDate,
    pub note: Option<String>,
}

/// Handle returned by a recorded sale.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    /// The origin id every side-effect row carries.
    pub sale_id: String,
    /// Realized margin (sale - cost).
    pub profit_minor: i64,
}

/// Handle returned by a recorded exchange.
#[derive(Debug, Clone)]
pub struct ExchangeRecord {
    pub exchange_id: String,
    /// The customer's old unit, now in inventory.
    pub traded_in_phone_id: String,
}

// =============================================================================
// Service
// =============================================================================

/// Sale-event use-cases.
#[derive(Debug, Clone)]
pub struct SalesService {
    pool: SqlitePool,
}

impl SalesService {
    /// Creates a new SalesService.
    pub fn new(pool: SqlitePool) -> Self {
        SalesService { pool }
    }

    fn phones(&self) -> PhoneRepository {
        PhoneRepository::new(self.pool.clone())
    }

    fn accessories(&self) -> AccessoryRepository {
        AccessoryRepository::new(self.pool.clone())
    }

    fn debts(&self) -> DebtRepository {
        DebtRepository::new(self.pool.clone())
    }

    fn cashflow(&self) -> CashFlowRepository {
        CashFlowRepository::new(self.pool.clone())
    }

    /// Persists planned debt rows inside the given transaction.
    async fn insert_planned_debts(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        planned: Vec<PlannedDebt>,
    ) -> DbResult<Vec<Debt>> {
        let repo = self.debts();
        let now = Utc::now();
        let mut inserted = Vec::with_capacity(planned.len());

        for p in planned {
            let debt = Debt {
                id: generate_id(),
                shop_id: p.shop_id,
                kind: p.kind,
                currency: p.currency,
                debtor: p.debtor,
                creditor: p.creditor,
                debtor_phone: p.debtor_phone,
                amount_minor: p.amount_minor,
                paid_amount_minor: 0,
                status: DebtStatus::Active,
                due_date: Some(p.due_date),
                origin_kind: p.origin_kind,
                origin_id: p.origin_id,
                note: p.note,
                created_at: now,
                updated_at: now,
            };
            repo.insert(&mut **tx, &debt).await?;
            inserted.push(debt);
        }

        Ok(inserted)
    }

    // ------------------------------------------------------------------
    // Phone Sales
    // ------------------------------------------------------------------

    /// Records a phone sale.
    ///
    /// The debt amount is derived, never accepted: anything not covered
    /// by cash becomes debt, planned under the dual-debt rule.
    pub async fn record_phone_sale(&self, input: PhoneSaleInput) -> DbResult<SaleRecord> {
        validate_name("customer_name", &input.customer_name)?;
        validate_name("salesperson", &input.salesperson)?;
        validate_name("owner", &input.owner)?;
        validate_amount("sale_price", input.sale_price_minor)?;
        validate_amount("cash_received", input.cash_received_minor)?;
        if input.cash_received_minor > input.sale_price_minor {
            return Err(DbError::Core(CoreError::PaymentExceedsBalance {
                amount: Money::from_minor(input.cash_received_minor).to_string(),
                balance: Money::from_minor(input.sale_price_minor).to_string(),
            }));
        }

        let sale_id = generate_id();
        let debt_amount = input.sale_price_minor - input.cash_received_minor;

        let phones = self.phones();
        let mut tx = self.pool.begin().await?;

        let phone = phones
            .fetch(&mut *tx, &input.phone_id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", &input.phone_id))?;
        if phone.status == PhoneStatus::Sold {
            return Err(DbError::Core(CoreError::PhoneUnavailable {
                status: phone.status,
            }));
        }

        phones
            .set_status(&mut *tx, &phone.id, PhoneStatus::Sold)
            .await?;

        let profit = input.sale_price_minor - phone.cost_price_minor;

        let planned = plan_sale_debts(&SaleDebtInput {
            shop_id: &input.shop_id,
            origin_kind: OriginKind::PhoneSale,
            origin_id: &sale_id,
            currency: Currency::Usd,
            customer_name: &input.customer_name,
            customer_phone: input.customer_phone.as_deref(),
            salesperson: &input.salesperson,
            owner: &input.owner,
            debt_amount: Money::from_minor(debt_amount),
            due_date: input.due_date,
            note: input.note.as_deref(),
        })
        .map_err(DbError::Core)?;
        self.insert_planned_debts(&mut tx, planned).await?;

        let event = CashFlowEvent::PhoneSale {
            shop_id: &input.shop_id,
            origin_id: &sale_id,
            cash_received: Money::from_minor(input.cash_received_minor),
            profit: Money::from_minor(profit),
            occurred_on: input.occurred_on,
            description: input.note.as_deref(),
        };
        if let Some(entry) = derive_transaction(&event) {
            self.cashflow().upsert(&mut *tx, &entry).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            phone_id = %phone.id,
            price = input.sale_price_minor,
            cash = input.cash_received_minor,
            profit,
            "Phone sale recorded"
        );

        Ok(SaleRecord {
            sale_id,
            profit_minor: profit,
        })
    }

    /// Re-records a phone sale under its existing sale id.
    ///
    /// Side-effect rows are resolved through the origin link: stale debts
    /// are deleted and re-planned, the cash-flow entry is replaced in
    /// place (or removed if the edit dropped the cash to zero).
    pub async fn update_phone_sale(
        &self,
        sale_id: &str,
        input: PhoneSaleInput,
    ) -> DbResult<SaleRecord> {
        validate_name("customer_name", &input.customer_name)?;
        validate_amount("sale_price", input.sale_price_minor)?;
        validate_amount("cash_received", input.cash_received_minor)?;
        if input.cash_received_minor > input.sale_price_minor {
            return Err(DbError::Core(CoreError::PaymentExceedsBalance {
                amount: Money::from_minor(input.cash_received_minor).to_string(),
                balance: Money::from_minor(input.sale_price_minor).to_string(),
            }));
        }

        let debt_amount = input.sale_price_minor - input.cash_received_minor;

        let phones = self.phones();
        let debts = self.debts();
        let cashflow = self.cashflow();

        let mut tx = self.pool.begin().await?;

        let phone = phones
            .fetch(&mut *tx, &input.phone_id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", &input.phone_id))?;
        let profit = input.sale_price_minor - phone.cost_price_minor;

        debts
            .delete_by_origin(&mut *tx, OriginKind::PhoneSale, sale_id)
            .await?;
        let planned = plan_sale_debts(&SaleDebtInput {
            shop_id: &input.shop_id,
            origin_kind: OriginKind::PhoneSale,
            origin_id: sale_id,
            currency: Currency::Usd,
            customer_name: &input.customer_name,
            customer_phone: input.customer_phone.as_deref(),
            salesperson: &input.salesperson,
            owner: &input.owner,
            debt_amount: Money::from_minor(debt_amount),
            due_date: input.due_date,
            note: input.note.as_deref(),
        })
        .map_err(DbError::Core)?;
        self.insert_planned_debts(&mut tx, planned).await?;

        let event = CashFlowEvent::PhoneSale {
            shop_id: &input.shop_id,
            origin_id: sale_id,
            cash_received: Money::from_minor(input.cash_received_minor),
            profit: Money::from_minor(profit),
            occurred_on: input.occurred_on,
            description: input.note.as_deref(),
        };
        match derive_transaction(&event) {
            Some(entry) => cashflow.upsert(&mut *tx, &entry).await?,
            None => {
                cashflow
                    .delete_by_origin(&mut *tx, CashFlowKind::PhoneSale, sale_id)
                    .await?;
            }
        }

        tx.commit().await?;

        info!(sale_id = %sale_id, "Phone sale updated");

        Ok(SaleRecord {
            sale_id: sale_id.to_string(),
            profit_minor: profit,
        })
    }

    /// Deletes a phone sale: the unit returns to the shelf and every
    /// side-effect row linked to the sale id is removed.
    pub async fn delete_phone_sale(&self, sale_id: &str, phone_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        self.phones()
            .set_status(&mut *tx, phone_id, PhoneStatus::InShop)
            .await?;
        self.debts()
            .delete_by_origin(&mut *tx, OriginKind::PhoneSale, sale_id)
            .await?;
        self.cashflow()
            .delete_by_origin(&mut *tx, CashFlowKind::PhoneSale, sale_id)
            .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, phone_id = %phone_id, "Phone sale deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessory Sales
    // ------------------------------------------------------------------

    /// Records an accessory sale.
    ///
    /// Profit is measured against the moving-average purchase price at
    /// the time of sale.
    pub async fn record_accessory_sale(&self, input: AccessorySaleInput) -> DbResult<SaleRecord> {
        validate_name("customer_name", &input.customer_name)?;
        validate_amount("total_price", input.total_price_minor)?;
        validate_amount("cash_received", input.cash_received_minor)?;
        if input.quantity <= 0 {
            return Err(DbError::Core(CoreError::Validation(
                savdo_core::error::ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                },
            )));
        }
        if input.cash_received_minor > input.total_price_minor {
            return Err(DbError::Core(CoreError::PaymentExceedsBalance {
                amount: Money::from_minor(input.cash_received_minor).to_string(),
                balance: Money::from_minor(input.total_price_minor).to_string(),
            }));
        }

        let sale_id = generate_id();
        let debt_amount = input.total_price_minor - input.cash_received_minor;

        let accessories = self.accessories();
        let mut tx = self.pool.begin().await?;

        let accessory = accessories
            .fetch(&mut *tx, &input.accessory_id)
            .await?
            .ok_or_else(|| DbError::not_found("Accessory", &input.accessory_id))?;
        if input.quantity > accessory.quantity {
            return Err(DbError::Core(CoreError::InsufficientStock {
                available: accessory.quantity,
                requested: input.quantity,
            }));
        }

        accessories
            .adjust_quantity(&mut *tx, &accessory.id, -input.quantity)
            .await?;

        let cost = accessory.avg_purchase_price_minor * input.quantity;
        let profit = input.total_price_minor - cost;

        let planned = plan_sale_debts(&SaleDebtInput {
            shop_id: &input.shop_id,
            origin_kind: OriginKind::AccessorySale,
            origin_id: &sale_id,
            currency: Currency::Som,
            customer_name: &input.customer_name,
            customer_phone: input.customer_phone.as_deref(),
            salesperson: &input.salesperson,
            owner: &input.owner,
            debt_amount: Money::from_minor(debt_amount),
            due_date: input.due_date,
            note: input.note.as_deref(),
        })
        .map_err(DbError::Core)?;
        self.insert_planned_debts(&mut tx, planned).await?;

        let event = CashFlowEvent::AccessorySale {
            shop_id: &input.shop_id,
            origin_id: &sale_id,
            cash_received: Money::from_minor(input.cash_received_minor),
            profit: Money::from_minor(profit),
            occurred_on: input.occurred_on,
            description: input.note.as_deref(),
        };
        if let Some(entry) = derive_transaction(&event) {
            self.cashflow().upsert(&mut *tx, &entry).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            accessory_id = %accessory.id,
            quantity = input.quantity,
            profit,
            "Accessory sale recorded"
        );

        Ok(SaleRecord {
            sale_id,
            profit_minor: profit,
        })
    }

    /// Deletes an accessory sale, restoring the counted stock.
    pub async fn delete_accessory_sale(
        &self,
        sale_id: &str,
        accessory_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        self.accessories()
            .adjust_quantity(&mut *tx, accessory_id, quantity)
            .await?;
        self.debts()
            .delete_by_origin(&mut *tx, OriginKind::AccessorySale, sale_id)
            .await?;
        self.cashflow()
            .delete_by_origin(&mut *tx, CashFlowKind::AccessorySale, sale_id)
            .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, "Accessory sale deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Exchanges
    // ------------------------------------------------------------------

    /// Records a phone-for-phone exchange.
    ///
    /// The shop's unit goes out (Sold), the customer's unit comes in as
    /// a new Exchange-sourced phone marked `exchanged_in`, and the price
    /// difference lands in the cash-flow ledger signed by who paid it.
    pub async fn record_exchange(&self, input: ExchangeInput) -> DbResult<ExchangeRecord> {
        validate_name("customer_name", &input.customer_name)?;
        validate_name("traded_in_model", &input.traded_in_model)?;
        validate_amount("traded_in_value", input.traded_in_value_minor)?;
        validate_amount("difference", input.difference_minor)?;

        let exchange_id = generate_id();

        let phones = self.phones();
        let mut tx = self.pool.begin().await?;

        let outgoing = phones
            .fetch(&mut *tx, &input.phone_id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", &input.phone_id))?;
        if outgoing.status == PhoneStatus::Sold {
            return Err(DbError::Core(CoreError::PhoneUnavailable {
                status: outgoing.status,
            }));
        }
        phones
            .set_status(&mut *tx, &outgoing.id, PhoneStatus::Sold)
            .await?;

        let now = Utc::now();
        let traded_in = savdo_core::types::Phone {
            id: generate_id(),
            shop_id: input.shop_id.clone(),
            model: input.traded_in_model.clone(),
            imei: input.traded_in_imei.clone(),
            status: PhoneStatus::ExchangedIn,
            source: PhoneSource::Exchange,
            supplier_id: None,
            external_seller_name: None,
            external_seller_phone: None,
            original_owner_name: Some(input.customer_name.clone()),
            original_owner_phone: input.customer_phone.clone(),
            daily_payment_minor: None,
            purchase_price_minor: input.traded_in_value_minor,
            imei_cost_minor: 0,
            repair_cost_minor: 0,
            cost_price_minor: input.traded_in_value_minor,
            sale_price_minor: None,
            debt_balance_minor: 0,
            created_at: now,
            updated_at: now,
        };
        phones.insert(&mut *tx, &traded_in).await?;

        let planned = plan_sale_debts(&SaleDebtInput {
            shop_id: &input.shop_id,
            origin_kind: OriginKind::Exchange,
            origin_id: &exchange_id,
            currency: Currency::Usd,
            customer_name: &input.customer_name,
            customer_phone: input.customer_phone.as_deref(),
            salesperson: &input.salesperson,
            owner: &input.owner,
            debt_amount: Money::from_minor(input.debt_amount_minor),
            due_date: input.due_date,
            note: input.note.as_deref(),
        })
        .map_err(DbError::Core)?;
        self.insert_planned_debts(&mut tx, planned).await?;

        let event = CashFlowEvent::Exchange {
            shop_id: &input.shop_id,
            origin_id: &exchange_id,
            difference: Money::from_minor(input.difference_minor),
            customer_pays: input.customer_pays,
            occurred_on: input.occurred_on,
            description: input.note.as_deref(),
        };
        if let Some(entry) = derive_transaction(&event) {
            self.cashflow().upsert(&mut *tx, &entry).await?;
        }

        tx.commit().await?;

        info!(
            exchange_id = %exchange_id,
            outgoing = %outgoing.id,
            traded_in = %traded_in.id,
            difference = input.difference_minor,
            customer_pays = input.customer_pays,
            "Exchange recorded"
        );

        Ok(ExchangeRecord {
            exchange_id,
            traded_in_phone_id: traded_in.id,
        })
    }

    /// Deletes an exchange: the shop's unit returns to the shelf and the
    /// traded-in unit leaves the inventory.
    pub async fn delete_exchange(
        &self,
        exchange_id: &str,
        sold_phone_id: &str,
        traded_in_phone_id: &str,
    ) -> DbResult<()> {
        let phones = self.phones();
        let mut tx = self.pool.begin().await?;

        phones
            .set_status(&mut *tx, sold_phone_id, PhoneStatus::InShop)
            .await?;
        phones.delete(&mut *tx, traded_in_phone_id).await?;
        self.debts()
            .delete_by_origin(&mut *tx, OriginKind::Exchange, exchange_id)
            .await?;
        self.cashflow()
            .delete_by_origin(&mut *tx, CashFlowKind::Exchange, exchange_id)
            .await?;

        tx.commit().await?;

        info!(exchange_id = %exchange_id, "Exchange deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Returns, Payouts, Expenses
    // ------------------------------------------------------------------

    /// Records a customer returning a sold phone for a refund.
    pub async fn record_phone_return(
        &self,
        shop_id: &str,
        phone_id: &str,
        refund_minor: i64,
        occurred_on: NaiveDate,
        note: Option<&str>,
    ) -> DbResult<String> {
        validate_amount("refund", refund_minor)?;

        let return_id = generate_id();

        let phones = self.phones();
        let mut tx = self.pool.begin().await?;

        let phone = phones
            .fetch(&mut *tx, phone_id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", phone_id))?;
        if phone.status != PhoneStatus::Sold {
            return Err(DbError::Core(CoreError::PhoneUnavailable {
                status: phone.status,
            }));
        }
        phones
            .set_status(&mut *tx, phone_id, PhoneStatus::Returned)
            .await?;

        let event = CashFlowEvent::PhoneReturn {
            shop_id,
            origin_id: &return_id,
            refund: Money::from_minor(refund_minor),
            occurred_on,
            description: note,
        };
        if let Some(entry) = derive_transaction(&event) {
            self.cashflow().upsert(&mut *tx, &entry).await?;
        }

        tx.commit().await?;

        info!(return_id = %return_id, phone_id = %phone_id, refund = refund_minor, "Phone return recorded");
        Ok(return_id)
    }

    /// Records the payout owed to a daily seller for a consigned phone.
    pub async fn record_daily_seller_payment(
        &self,
        shop_id: &str,
        phone_id: &str,
        occurred_on: NaiveDate,
    ) -> DbResult<String> {
        let phone = self.phones().get(phone_id).await?;
        if phone.source != PhoneSource::DailySeller {
            return Err(DbError::Core(CoreError::Validation(
                savdo_core::error::ValidationError::InvalidFormat {
                    field: "phone".to_string(),
                    reason: "not a daily-seller unit".to_string(),
                },
            )));
        }
        let payout = phone.daily_payment_minor.unwrap_or(0);
        validate_payment_amount(payout)?;

        let payment_id = generate_id();
        let event = CashFlowEvent::DailySellerPayment {
            shop_id,
            origin_id: &payment_id,
            payout: Money::from_minor(payout),
            occurred_on,
            description: None,
        };
        if let Some(entry) = derive_transaction(&event) {
            self.cashflow().upsert(&self.pool, &entry).await?;
        }

        info!(payment_id = %payment_id, phone_id = %phone_id, payout, "Daily-seller payout recorded");
        Ok(payment_id)
    }

    /// Records a shop expense (rent, utilities, salaries).
    pub async fn record_expense(
        &self,
        shop_id: &str,
        amount_minor: i64,
        description: &str,
        occurred_on: NaiveDate,
    ) -> DbResult<String> {
        validate_payment_amount(amount_minor)?;
        validate_name("description", description)?;

        let expense_id = generate_id();
        let event = CashFlowEvent::Expense {
            shop_id,
            origin_id: &expense_id,
            amount: Money::from_minor(amount_minor),
            occurred_on,
            description: Some(description),
        };
        if let Some(entry) = derive_transaction(&event) {
            self.cashflow().upsert(&self.pool, &entry).await?;
        }

        info!(expense_id = %expense_id, amount = amount_minor, "Expense recorded");
        Ok(expense_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::service::inventory::tests::phone_input;
    use crate::service::inventory::NewAccessoryInput;
    use savdo_core::types::DebtKind;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
    }

    fn sale_input(shop_id: &str, phone_id: &str) -> PhoneSaleInput {
        PhoneSaleInput {
            shop_id: shop_id.to_string(),
            phone_id: phone_id.to_string(),
            customer_name: "Karim".into(),
            customer_phone: Some("+998901112233".into()),
            salesperson: "Sardor".into(),
            owner: "Olim".into(),
            sale_price_minor: 300_00,
            cash_received_minor: 300_00,
            due_date: None,
            occurred_on: day(),
            note: None,
        }
    }

    async fn seeded_phone(db: &Database) -> String {
        db.inventory()
            .create_phone(phone_input("shop1"))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_cash_sale_writes_entry_and_no_debts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let record = db
            .sales()
            .record_phone_sale(sale_input("shop1", &phone_id))
            .await
            .unwrap();
        // cost is 225.00 (200 + 10 + 15)
        assert_eq!(record.profit_minor, 75_00);

        assert_eq!(
            db.phones().get(&phone_id).await.unwrap().status,
            PhoneStatus::Sold
        );

        let debts = db
            .debts()
            .list_by_origin(db.pool(), OriginKind::PhoneSale, &record.sale_id)
            .await
            .unwrap();
        assert!(debts.is_empty());

        let entry = db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::PhoneSale, &record.sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.amount_minor, 300_00);
        assert_eq!(entry.profit_minor, Some(75_00));
    }

    #[tokio::test]
    async fn test_credit_sale_plans_dual_debts_and_no_entry() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let mut input = sale_input("shop1", &phone_id);
        input.cash_received_minor = 0;
        input.due_date = NaiveDate::from_ymd_opt(2026, 9, 15);

        let record = db.sales().record_phone_sale(input).await.unwrap();

        let debts = db
            .debts()
            .list_by_origin(db.pool(), OriginKind::PhoneSale, &record.sale_id)
            .await
            .unwrap();
        assert_eq!(debts.len(), 2);
        assert!(debts.iter().any(|d| d.kind == DebtKind::CustomerToSeller));
        assert!(debts.iter().any(|d| d.kind == DebtKind::SellerToBoss));

        // no cash moved, no entry
        let entry = db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::PhoneSale, &record.sale_id)
            .await
            .unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_credit_sale_without_due_date_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let mut input = sale_input("shop1", &phone_id);
        input.cash_received_minor = 100_00;
        input.due_date = None;

        let err = db.sales().record_phone_sale(input).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::DueDateRequired)));

        // rolled back: phone still on the shelf
        assert_eq!(
            db.phones().get(&phone_id).await.unwrap().status,
            PhoneStatus::InShop
        );
    }

    #[tokio::test]
    async fn test_cash_over_price_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let mut input = sale_input("shop1", &phone_id);
        input.cash_received_minor = 350_00;

        let err = db.sales().record_phone_sale(input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::PaymentExceedsBalance { .. })
        ));
    }

    #[tokio::test]
    async fn test_selling_sold_phone_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        db.sales()
            .record_phone_sale(sale_input("shop1", &phone_id))
            .await
            .unwrap();
        let err = db
            .sales()
            .record_phone_sale(sale_input("shop1", &phone_id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::PhoneUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_sale_replaces_side_effects() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let record = db
            .sales()
            .record_phone_sale(sale_input("shop1", &phone_id))
            .await
            .unwrap();

        // edit: half on credit now
        let mut edited = sale_input("shop1", &phone_id);
        edited.cash_received_minor = 150_00;
        edited.due_date = NaiveDate::from_ymd_opt(2026, 9, 15);
        db.sales()
            .update_phone_sale(&record.sale_id, edited)
            .await
            .unwrap();

        let debts = db
            .debts()
            .list_by_origin(db.pool(), OriginKind::PhoneSale, &record.sale_id)
            .await
            .unwrap();
        assert_eq!(debts.len(), 2);
        assert_eq!(debts[0].amount_minor, 150_00);

        let entry = db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::PhoneSale, &record.sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.amount_minor, 150_00);
    }

    #[tokio::test]
    async fn test_delete_sale_restores_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let mut input = sale_input("shop1", &phone_id);
        input.cash_received_minor = 200_00;
        input.due_date = NaiveDate::from_ymd_opt(2026, 9, 15);
        let record = db.sales().record_phone_sale(input).await.unwrap();

        db.sales()
            .delete_phone_sale(&record.sale_id, &phone_id)
            .await
            .unwrap();

        assert_eq!(
            db.phones().get(&phone_id).await.unwrap().status,
            PhoneStatus::InShop
        );
        assert!(db
            .debts()
            .list_by_origin(db.pool(), OriginKind::PhoneSale, &record.sale_id)
            .await
            .unwrap()
            .is_empty());
        assert!(db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::PhoneSale, &record.sale_id)
            .await
            .unwrap()
            .is_none());
    }

    async fn seeded_accessory(db: &Database) -> String {
        db.inventory()
            .create_accessory(NewAccessoryInput {
                shop_id: "shop1".into(),
                code: None,
                name: "Case".into(),
                sale_price_minor: 25_000_00,
                quantity: 10,
                unit_price_minor: 15_000_00,
                recorded_by: None,
            })
            .await
            .unwrap()
            .id
    }

    fn accessory_sale(accessory_id: &str, quantity: i64) -> AccessorySaleInput {
        AccessorySaleInput {
            shop_id: "shop1".into(),
            accessory_id: accessory_id.to_string(),
            quantity,
            total_price_minor: 25_000_00 * quantity,
            cash_received_minor: 25_000_00 * quantity,
            customer_name: "Karim".into(),
            customer_phone: None,
            salesperson: "Olim".into(),
            owner: "Olim".into(),
            due_date: None,
            occurred_on: day(),
            note: None,
        }
    }

    #[tokio::test]
    async fn test_accessory_sale_decrements_stock_and_tracks_profit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let accessory_id = seeded_accessory(&db).await;

        let record = db
            .sales()
            .record_accessory_sale(accessory_sale(&accessory_id, 3))
            .await
            .unwrap();
        // (25000 - 15000) * 3
        assert_eq!(record.profit_minor, 30_000_00);

        let accessory = db.accessories().get(&accessory_id).await.unwrap();
        assert_eq!(accessory.quantity, 7);

        let entry = db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::AccessorySale, &record.sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.currency, Currency::Som);
        assert_eq!(entry.amount_minor, 75_000_00);
    }

    #[tokio::test]
    async fn test_accessory_sale_insufficient_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let accessory_id = seeded_accessory(&db).await;

        let err = db
            .sales()
            .record_accessory_sale(accessory_sale(&accessory_id, 11))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock {
                available: 10,
                requested: 11
            })
        ));

        // nothing written
        assert_eq!(db.accessories().get(&accessory_id).await.unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_delete_accessory_sale_restores_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let accessory_id = seeded_accessory(&db).await;

        let record = db
            .sales()
            .record_accessory_sale(accessory_sale(&accessory_id, 4))
            .await
            .unwrap();
        db.sales()
            .delete_accessory_sale(&record.sale_id, &accessory_id, 4)
            .await
            .unwrap();

        assert_eq!(db.accessories().get(&accessory_id).await.unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_exchange_creates_traded_in_unit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let record = db
            .sales()
            .record_exchange(ExchangeInput {
                shop_id: "shop1".into(),
                phone_id: phone_id.clone(),
                customer_name: "Karim".into(),
                customer_phone: None,
                traded_in_model: "Redmi 9".into(),
                traded_in_imei: None,
                traded_in_value_minor: 120_00,
                difference_minor: 80_00,
                customer_pays: true,
                salesperson: "Olim".into(),
                owner: "Olim".into(),
                debt_amount_minor: 0,
                due_date: None,
                occurred_on: day(),
                note: None,
            })
            .await
            .unwrap();

        let traded_in = db.phones().get(&record.traded_in_phone_id).await.unwrap();
        assert_eq!(traded_in.status, PhoneStatus::ExchangedIn);
        assert_eq!(traded_in.source, PhoneSource::Exchange);
        assert_eq!(traded_in.cost_price_minor, 120_00);
        assert_eq!(traded_in.original_owner_name.as_deref(), Some("Karim"));

        let entry = db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::Exchange, &record.exchange_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.amount_minor, 80_00);
    }

    #[tokio::test]
    async fn test_delete_exchange_unwinds_both_units() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let record = db
            .sales()
            .record_exchange(ExchangeInput {
                shop_id: "shop1".into(),
                phone_id: phone_id.clone(),
                customer_name: "Karim".into(),
                customer_phone: None,
                traded_in_model: "Redmi 9".into(),
                traded_in_imei: None,
                traded_in_value_minor: 120_00,
                difference_minor: 80_00,
                customer_pays: false,
                salesperson: "Olim".into(),
                owner: "Olim".into(),
                debt_amount_minor: 0,
                due_date: None,
                occurred_on: day(),
                note: None,
            })
            .await
            .unwrap();

        db.sales()
            .delete_exchange(&record.exchange_id, &phone_id, &record.traded_in_phone_id)
            .await
            .unwrap();

        assert_eq!(
            db.phones().get(&phone_id).await.unwrap().status,
            PhoneStatus::InShop
        );
        let err = db.phones().get(&record.traded_in_phone_id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_phone_return_flips_status_and_refunds() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        db.sales()
            .record_phone_sale(sale_input("shop1", &phone_id))
            .await
            .unwrap();
        let return_id = db
            .sales()
            .record_phone_return("shop1", &phone_id, 280_00, day(), None)
            .await
            .unwrap();

        assert_eq!(
            db.phones().get(&phone_id).await.unwrap().status,
            PhoneStatus::Returned
        );
        let entry = db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::PhoneReturn, &return_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.amount_minor, -280_00);
    }

    #[tokio::test]
    async fn test_returning_unsold_phone_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone_id = seeded_phone(&db).await;

        let err = db
            .sales()
            .record_phone_return("shop1", &phone_id, 280_00, day(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::PhoneUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_expense_is_negative_som() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let expense_id = db
            .sales()
            .record_expense("shop1", 500_000_00, "rent", day())
            .await
            .unwrap();

        let entry = db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::Expense, &expense_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.amount_minor, -500_000_00);
        assert_eq!(entry.currency, Currency::Som);
    }

    #[tokio::test]
    async fn test_daily_seller_payout() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut input = phone_input("shop1");
        input.source = PhoneSource::DailySeller;
        input.external_seller_name = None;
        input.daily_payment_minor = Some(50_00);
        let phone = db.inventory().create_phone(input).await.unwrap();

        let payment_id = db
            .sales()
            .record_daily_seller_payment("shop1", &phone.id, day())
            .await
            .unwrap();

        let entry = db
            .cashflow()
            .find_by_origin(db.pool(), CashFlowKind::DailySellerPayment, &payment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.amount_minor, -50_00);
    }
}
