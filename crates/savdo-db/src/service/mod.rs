//! # Service Module
//!
//! Multi-table use-cases composed from repositories.
//!
//! ## One Use-Case, One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every mutating use-case runs as:                                       │
//! │                                                                         │
//! │      validate (pure, savdo-core)                                        │
//! │         │                                                               │
//! │      begin transaction                                                  │
//! │         │                                                               │
//! │      repository writes (phones + debts + cashflow + ...)                │
//! │         │                                                               │
//! │      commit  ── any error on the way rolls everything back              │
//! │                                                                         │
//! │  A sale that flips a phone to Sold, writes two debts and a cash-flow    │
//! │  entry either does all four or none of them.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Services
//!
//! - [`inventory::InventoryService`] - Phone intake, accessory creation and restock
//! - [`sales::SalesService`] - Sale events and their ledger side-effects
//! - [`debt::DebtService`] - Debt repayments
//! - [`settlement::SettlementService`] - FIFO supplier payment settlement
//! - [`report::ReportService`] - Period reports over the ledgers

pub mod debt;
pub mod inventory;
pub mod report;
pub mod sales;
pub mod settlement;
