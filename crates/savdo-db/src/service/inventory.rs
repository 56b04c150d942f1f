//! # Inventory Service
//!
//! Use-cases for taking stock in: phone intake and accessory restock.
//!
//! ## Phone Intake
//! A supplier-sourced phone opens a per-unit balance equal to its full
//! composite cost (purchase + imei + repair); the supplier's
//! `total_debt` is re-derived from the sum of balances in the same
//! transaction.
//!
//! ## Accessory Restock
//! Every restock appends an immutable history row, bumps the counted
//! quantity, and recomputes the moving average from the FULL history.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::accessory::AccessoryRepository;
use crate::repository::generate_id;
use crate::repository::phone::PhoneRepository;
use crate::repository::supplier::SupplierRepository;
use savdo_core::costing::{moving_average, next_accessory_code, phone_cost_price};
use savdo_core::money::Money;
use savdo_core::types::{Accessory, AccessoryPurchase, Phone, PhoneSource, PhoneStatus};
use savdo_core::validation::{
    validate_accessory_code, validate_amount, validate_imei, validate_name,
    validate_phone_source, validate_quantity,
};
use savdo_core::ACCESSORY_CODE_WIDTH;

// =============================================================================
// Inputs
// =============================================================================

/// Everything needed to record a phone entering the inventory.
#[derive(Debug, Clone)]
pub struct NewPhoneInput {
    pub shop_id: String,
    pub model: String,
    pub imei: Option<String>,
    pub source: PhoneSource,
    pub supplier_id: Option<String>,
    pub external_seller_name: Option<String>,
    pub external_seller_phone: Option<String>,
    pub original_owner_name: Option<String>,
    pub original_owner_phone: Option<String>,
    pub daily_payment_minor: Option<i64>,
    pub purchase_price_minor: i64,
    pub imei_cost_minor: i64,
    pub repair_cost_minor: i64,
    pub sale_price_minor: Option<i64>,
}

/// Editable phone fields. Cost components recompute the composite cost;
/// the supplier balance is settlement state and is never rewritten here.
#[derive(Debug, Clone)]
pub struct UpdatePhoneInput {
    pub phone_id: String,
    pub model: String,
    pub imei: Option<String>,
    pub status: PhoneStatus,
    pub purchase_price_minor: i64,
    pub imei_cost_minor: i64,
    pub repair_cost_minor: i64,
    pub sale_price_minor: Option<i64>,
}

/// Everything needed to open an accessory stock line.
#[derive(Debug, Clone)]
pub struct NewAccessoryInput {
    pub shop_id: String,
    /// Explicit code; `None` takes the next sequential code in the shop.
    pub code: Option<String>,
    pub name: String,
    pub sale_price_minor: i64,
    /// Opening batch. Zero quantity opens an empty line.
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub recorded_by: Option<String>,
}

// =============================================================================
// Service
// =============================================================================

/// Inventory use-cases.
#[derive(Debug, Clone)]
pub struct InventoryService {
    pool: SqlitePool,
}

impl InventoryService {
    /// Creates a new InventoryService.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryService { pool }
    }

    fn phones(&self) -> PhoneRepository {
        PhoneRepository::new(self.pool.clone())
    }

    fn accessories(&self) -> AccessoryRepository {
        AccessoryRepository::new(self.pool.clone())
    }

    fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    // ------------------------------------------------------------------
    // Phones
    // ------------------------------------------------------------------

    /// Records a phone entering the inventory.
    ///
    /// Supplier-sourced units open a balance equal to the composite cost
    /// and push the supplier's `total_debt` up in the same transaction.
    pub async fn create_phone(&self, input: NewPhoneInput) -> DbResult<Phone> {
        validate_name("model", &input.model)?;
        if let Some(imei) = input.imei.as_deref() {
            validate_imei(imei)?;
        }

        let cost = phone_cost_price(
            Money::from_minor(input.purchase_price_minor),
            Money::from_minor(input.imei_cost_minor),
            Money::from_minor(input.repair_cost_minor),
        )
        .map_err(DbError::Core)?;

        // only supplier units owe anybody anything; what is owed is the
        // full composite cost, not just the purchase component
        let debt_balance_minor = if input.source == PhoneSource::Supplier {
            cost.minor()
        } else {
            0
        };

        let now = Utc::now();
        let phone = Phone {
            id: generate_id(),
            shop_id: input.shop_id,
            model: input.model,
            imei: input.imei.map(|i| i.trim().to_string()),
            status: PhoneStatus::InShop,
            source: input.source,
            supplier_id: input.supplier_id,
            external_seller_name: input.external_seller_name,
            external_seller_phone: input.external_seller_phone,
            original_owner_name: input.original_owner_name,
            original_owner_phone: input.original_owner_phone,
            daily_payment_minor: input.daily_payment_minor,
            purchase_price_minor: input.purchase_price_minor,
            imei_cost_minor: input.imei_cost_minor,
            repair_cost_minor: input.repair_cost_minor,
            cost_price_minor: cost.minor(),
            sale_price_minor: input.sale_price_minor,
            debt_balance_minor,
            created_at: now,
            updated_at: now,
        };
        validate_phone_source(&phone)?;

        let phones = self.phones();
        let suppliers = self.suppliers();

        let mut tx = self.pool.begin().await?;

        phones.insert(&mut *tx, &phone).await?;

        if let Some(supplier_id) = phone.supplier_id.as_deref() {
            let supplier = suppliers
                .fetch(&mut *tx, supplier_id)
                .await?
                .ok_or_else(|| DbError::not_found("Supplier", supplier_id))?;
            let total_debt = phones.sum_supplier_balances(&mut *tx, supplier_id).await?;
            suppliers
                .apply_settlement(
                    &mut *tx,
                    supplier_id,
                    supplier.initial_debt_minor,
                    total_debt,
                    0,
                )
                .await?;
        }

        tx.commit().await?;

        info!(
            phone_id = %phone.id,
            model = %phone.model,
            source = ?phone.source,
            cost = phone.cost_price_minor,
            "Phone recorded"
        );

        Ok(phone)
    }

    /// Updates a phone's editable fields, recomputing the composite cost.
    ///
    /// For a supplier-sourced unit the balance tracks the cost: it is
    /// re-derived as `new cost - already paid` and the supplier's
    /// `total_debt` is re-summed in the same transaction.
    pub async fn update_phone(&self, input: UpdatePhoneInput) -> DbResult<Phone> {
        validate_name("model", &input.model)?;
        if let Some(imei) = input.imei.as_deref() {
            validate_imei(imei)?;
        }

        let cost = phone_cost_price(
            Money::from_minor(input.purchase_price_minor),
            Money::from_minor(input.imei_cost_minor),
            Money::from_minor(input.repair_cost_minor),
        )
        .map_err(DbError::Core)?;

        let phones = self.phones();
        let suppliers = self.suppliers();

        let mut tx = self.pool.begin().await?;

        let mut phone = phones
            .fetch(&mut *tx, &input.phone_id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", &input.phone_id))?;

        // settlements paid this much of the old cost already
        let paid_minor = phone.cost_price_minor - phone.debt_balance_minor;

        phone.model = input.model;
        phone.imei = input.imei.map(|i| i.trim().to_string());
        phone.status = input.status;
        phone.purchase_price_minor = input.purchase_price_minor;
        phone.imei_cost_minor = input.imei_cost_minor;
        phone.repair_cost_minor = input.repair_cost_minor;
        phone.cost_price_minor = cost.minor();
        phone.sale_price_minor = input.sale_price_minor;

        phones.update(&mut *tx, &phone).await?;

        if phone.source == PhoneSource::Supplier {
            phone.debt_balance_minor = (cost.minor() - paid_minor).max(0);
            phones
                .set_balance(&mut *tx, &phone.id, phone.debt_balance_minor)
                .await?;

            if let Some(supplier_id) = phone.supplier_id.as_deref() {
                let supplier = suppliers
                    .fetch(&mut *tx, supplier_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Supplier", supplier_id))?;
                let total_debt = phones.sum_supplier_balances(&mut *tx, supplier_id).await?;
                suppliers
                    .apply_settlement(
                        &mut *tx,
                        supplier_id,
                        supplier.initial_debt_minor,
                        total_debt,
                        0,
                    )
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(phone)
    }

    // ------------------------------------------------------------------
    // Accessories
    // ------------------------------------------------------------------

    /// Opens an accessory stock line, optionally with an opening batch.
    pub async fn create_accessory(&self, input: NewAccessoryInput) -> DbResult<Accessory> {
        validate_name("name", &input.name)?;
        validate_amount("sale_price", input.sale_price_minor)?;
        if input.quantity != 0 {
            validate_quantity(input.quantity)?;
            validate_amount("unit_price", input.unit_price_minor)?;
        }

        let accessories = self.accessories();

        let mut tx = self.pool.begin().await?;

        let code = match input.code {
            Some(code) => {
                validate_accessory_code(&code)?;
                // normalize "7" → "0007"; stored codes are always padded
                format!(
                    "{:0width$}",
                    code.trim().parse::<u32>().unwrap_or(0),
                    width = ACCESSORY_CODE_WIDTH
                )
            }
            None => {
                let highest = accessories.max_code(&mut *tx, &input.shop_id).await?;
                next_accessory_code(highest.as_deref())
            }
        };

        let now = Utc::now();
        let accessory = Accessory {
            id: generate_id(),
            shop_id: input.shop_id,
            code,
            name: input.name,
            quantity: 0,
            avg_purchase_price_minor: 0,
            sale_price_minor: input.sale_price_minor,
            created_at: now,
            updated_at: now,
        };
        accessories.insert(&mut *tx, &accessory).await?;

        if input.quantity > 0 {
            let purchase = AccessoryPurchase {
                id: generate_id(),
                accessory_id: accessory.id.clone(),
                quantity: input.quantity,
                unit_price_minor: input.unit_price_minor,
                recorded_by: input.recorded_by,
                created_at: now,
            };
            accessories.insert_purchase(&mut *tx, &purchase).await?;
            accessories
                .adjust_quantity(&mut *tx, &accessory.id, input.quantity)
                .await?;
            accessories
                .set_avg_price(&mut *tx, &accessory.id, input.unit_price_minor)
                .await?;
        }

        tx.commit().await?;

        info!(
            accessory_id = %accessory.id,
            code = %accessory.code,
            opening_quantity = input.quantity,
            "Accessory line opened"
        );

        accessories.get(&accessory.id).await
    }

    /// Restocks an accessory and recomputes the moving average.
    ///
    /// The average comes from the full history, never from an incremental
    /// update, so it survives corrected or deleted history rows.
    pub async fn restock_accessory(
        &self,
        accessory_id: &str,
        quantity: i64,
        unit_price_minor: i64,
        recorded_by: Option<String>,
    ) -> DbResult<Accessory> {
        validate_quantity(quantity)?;
        validate_amount("unit_price", unit_price_minor)?;

        let accessories = self.accessories();

        let mut tx = self.pool.begin().await?;

        let accessory = accessories
            .fetch(&mut *tx, accessory_id)
            .await?
            .ok_or_else(|| DbError::not_found("Accessory", accessory_id))?;

        let purchase = AccessoryPurchase {
            id: generate_id(),
            accessory_id: accessory.id.clone(),
            quantity,
            unit_price_minor,
            recorded_by,
            created_at: Utc::now(),
        };
        accessories.insert_purchase(&mut *tx, &purchase).await?;
        accessories
            .adjust_quantity(&mut *tx, &accessory.id, quantity)
            .await?;

        let history = accessories.list_purchases(&mut *tx, &accessory.id).await?;
        let avg = moving_average(&history);
        accessories
            .set_avg_price(&mut *tx, &accessory.id, avg.minor())
            .await?;

        tx.commit().await?;

        info!(
            accessory_id = %accessory.id,
            quantity,
            avg = avg.minor(),
            "Accessory restocked"
        );

        accessories.get(&accessory.id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::supplier::tests::insert_supplier;
    use savdo_core::error::{CoreError, ValidationError};

    pub(crate) fn phone_input(shop_id: &str) -> NewPhoneInput {
        NewPhoneInput {
            shop_id: shop_id.to_string(),
            model: "iPhone 13".into(),
            imei: None,
            source: PhoneSource::ExternalSeller,
            supplier_id: None,
            external_seller_name: Some("Bekzod".into()),
            external_seller_phone: None,
            original_owner_name: None,
            original_owner_phone: None,
            daily_payment_minor: None,
            purchase_price_minor: 200_00,
            imei_cost_minor: 10_00,
            repair_cost_minor: 15_00,
            sale_price_minor: Some(300_00),
        }
    }

    #[tokio::test]
    async fn test_create_phone_computes_cost() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let phone = db.inventory().create_phone(phone_input("shop1")).await.unwrap();
        assert_eq!(phone.cost_price_minor, 225_00);
        assert_eq!(phone.debt_balance_minor, 0);
    }

    #[tokio::test]
    async fn test_create_supplier_phone_opens_balance_at_cost() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let supplier_id = insert_supplier(&db, 0).await;

        let mut input = phone_input("shop1");
        input.source = PhoneSource::Supplier;
        input.supplier_id = Some(supplier_id.clone());
        input.external_seller_name = None;

        // 200 purchase + 10 imei + 15 repair: the whole cost is owed
        let phone = db.inventory().create_phone(input).await.unwrap();
        assert_eq!(phone.debt_balance_minor, phone.cost_price_minor);
        assert_eq!(phone.debt_balance_minor, 225_00);

        let supplier = db.suppliers().get(&supplier_id).await.unwrap();
        assert_eq!(supplier.total_debt_minor, 225_00);
        assert_eq!(supplier.balance().minor(), 225_00);
    }

    #[tokio::test]
    async fn test_update_phone_resyncs_supplier_balance() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let supplier_id = insert_supplier(&db, 0).await;

        let mut input = phone_input("shop1");
        input.source = PhoneSource::Supplier;
        input.supplier_id = Some(supplier_id.clone());
        input.external_seller_name = None;
        let phone = db.inventory().create_phone(input).await.unwrap();

        // settle part of the cost, then raise the repair component
        db.phones()
            .set_balance(db.pool(), &phone.id, 125_00)
            .await
            .unwrap();
        db.suppliers()
            .apply_settlement(db.pool(), &supplier_id, 0, 125_00, 100_00)
            .await
            .unwrap();

        let updated = db
            .inventory()
            .update_phone(UpdatePhoneInput {
                phone_id: phone.id.clone(),
                model: phone.model.clone(),
                imei: None,
                status: PhoneStatus::InShop,
                purchase_price_minor: 200_00,
                imei_cost_minor: 10_00,
                repair_cost_minor: 40_00,
                sale_price_minor: Some(320_00),
            })
            .await
            .unwrap();

        // new cost 250, already paid 100: 150 still owed
        assert_eq!(updated.cost_price_minor, 250_00);
        assert_eq!(updated.debt_balance_minor, 150_00);

        let supplier = db.suppliers().get(&supplier_id).await.unwrap();
        assert_eq!(supplier.total_debt_minor, 150_00);
    }

    #[tokio::test]
    async fn test_create_phone_source_fields_enforced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut input = phone_input("shop1");
        input.source = PhoneSource::DailySeller;
        let err = db.inventory().create_phone(input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_phone_recomputes_cost() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = db.inventory();

        let phone = service.create_phone(phone_input("shop1")).await.unwrap();

        let updated = service
            .update_phone(UpdatePhoneInput {
                phone_id: phone.id.clone(),
                model: phone.model.clone(),
                imei: None,
                status: PhoneStatus::WithRepairMaster,
                purchase_price_minor: 200_00,
                imei_cost_minor: 10_00,
                repair_cost_minor: 40_00,
                sale_price_minor: Some(320_00),
            })
            .await
            .unwrap();
        assert_eq!(updated.cost_price_minor, 250_00);

        let loaded = db.phones().get(&phone.id).await.unwrap();
        assert_eq!(loaded.cost_price_minor, 250_00);
        assert_eq!(loaded.status, PhoneStatus::WithRepairMaster);
    }

    #[tokio::test]
    async fn test_create_accessory_sequential_codes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = db.inventory();

        let input = |name: &str| NewAccessoryInput {
            shop_id: "shop1".into(),
            code: None,
            name: name.into(),
            sale_price_minor: 25_000_00,
            quantity: 0,
            unit_price_minor: 0,
            recorded_by: None,
        };

        let first = service.create_accessory(input("Case")).await.unwrap();
        let second = service.create_accessory(input("Charger")).await.unwrap();
        assert_eq!(first.code, "0001");
        assert_eq!(second.code, "0002");
    }

    #[tokio::test]
    async fn test_create_accessory_with_opening_batch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let accessory = db
            .inventory()
            .create_accessory(NewAccessoryInput {
                shop_id: "shop1".into(),
                code: Some("7".into()),
                name: "Glass".into(),
                sale_price_minor: 20_000_00,
                quantity: 10,
                unit_price_minor: 8_000_00,
                recorded_by: Some("Olim".into()),
            })
            .await
            .unwrap();

        assert_eq!(accessory.code, "0007");
        assert_eq!(accessory.quantity, 10);
        assert_eq!(accessory.avg_purchase_price_minor, 8_000_00);
    }

    #[tokio::test]
    async fn test_restock_recomputes_moving_average() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = db.inventory();

        let accessory = service
            .create_accessory(NewAccessoryInput {
                shop_id: "shop1".into(),
                code: None,
                name: "Case".into(),
                sale_price_minor: 25_000_00,
                quantity: 5,
                unit_price_minor: 1000_00,
                recorded_by: None,
            })
            .await
            .unwrap();

        // 5 @ 1000.00 on hand, add 5 @ 2000.00 → avg 1500.00
        let restocked = service
            .restock_accessory(&accessory.id, 5, 2000_00, None)
            .await
            .unwrap();
        assert_eq!(restocked.quantity, 10);
        assert_eq!(restocked.avg_purchase_price_minor, 1500_00);
    }

    #[tokio::test]
    async fn test_restock_rejects_bad_quantity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .inventory()
            .restock_accessory("whatever", 0, 100, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }
}
