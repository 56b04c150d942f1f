//! # savdo-db: Persistence Layer for the Savdo Ledger
//!
//! This crate provides SQLite persistence for the savdo back-office
//! ledger. It uses sqlx for async access and embeds its migrations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Savdo Ledger Data Flow                           │
//! │                                                                         │
//! │  Caller (back-office app, CLI, tests)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     savdo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐  │   │
//! │  │   │   Database   │   │  Repositories │   │     Services     │  │   │
//! │  │   │   (pool.rs)  │   │  (one per     │   │  (one use-case,  │  │   │
//! │  │   │              │   │   aggregate)  │   │  one transaction)│  │   │
//! │  │   │ SqlitePool   │◄──│ PhoneRepo     │◄──│ SalesService     │  │   │
//! │  │   │ Migrations   │   │ SupplierRepo  │   │ SettlementService│  │   │
//! │  │   │ WAL + FKs    │   │ DebtRepo ...  │   │ ReportService ...│  │   │
//! │  │   └──────────────┘   └───────────────┘   └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  SQLite database file          savdo-core (pure rules:                 │
//! │  (or :memory: in tests)        costing, allocation, debts,             │
//! │                                cash-flow derivation)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Row-level access, one module per aggregate
//! - [`service`] - Transactional use-cases composing the repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use savdo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/savdo.db")).await?;
//!
//! // Repositories for reads
//! let unpaid = db.phones().unpaid_for_supplier(&supplier_id).await?;
//!
//! // Services for anything that must hold together
//! let outcome = db.settlement().record_payment(input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::accessory::AccessoryRepository;
pub use repository::cashflow::CashFlowRepository;
pub use repository::debt::DebtRepository;
pub use repository::phone::PhoneRepository;
pub use repository::supplier::SupplierRepository;

// Service re-exports
pub use service::debt::DebtService;
pub use service::inventory::InventoryService;
pub use service::report::{PeriodReport, ReportService};
pub use service::sales::SalesService;
pub use service::settlement::SettlementService;
