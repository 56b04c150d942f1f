//! # Repository Module
//!
//! Database repository implementations for the savdo ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service (one transaction)                                             │
//! │       │                                                                 │
//! │       │  phones.insert(&mut *tx, &phone)                               │
//! │       │  debts.delete_by_origin(&mut *tx, kind, id)                    │
//! │       ▼                                                                 │
//! │  Repository methods take `impl SqliteExecutor`, so the same SQL        │
//! │  runs against the pool (standalone) or inside a transaction            │
//! │  (service use-cases).                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`phone::PhoneRepository`] - Phone units and supplier balances
//! - [`accessory::AccessoryRepository`] - Accessory stock and restock history
//! - [`supplier::SupplierRepository`] - Suppliers, payments, allocation details
//! - [`debt::DebtRepository`] - Debts and debt payments
//! - [`cashflow::CashFlowRepository`] - The signed cash-flow ledger

pub mod accessory;
pub mod cashflow;
pub mod debt;
pub mod phone;
pub mod supplier;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
