//! # savdo-core: Pure Business Logic for the Savdo Ledger
//!
//! This crate is the **heart** of the ledger. It contains all business
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Savdo Ledger Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 External Callers (UI / API layer)               │   │
//! │  │     restock, record sale, pay debt, settle supplier, report     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ savdo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌────────┐ ┌────────────┐ ┌─────────┐ │   │
//! │  │  │  money  │ │ costing │ │  debt  │ │ allocation │ │cashflow │ │   │
//! │  │  │  Money  │ │cost/avg │ │ plans  │ │    FIFO    │ │ derive  │ │   │
//! │  │  └─────────┘ └─────────┘ └────────┘ └────────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    savdo-db (Database Layer)                    │   │
//! │  │          SQLite queries, migrations, transactional services     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Phone, Accessory, Supplier, Debt, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field and business rule validation
//! - [`costing`] - Phone composite cost and accessory moving average
//! - [`debt`] - Sale-debt planning and settlement state
//! - [`allocation`] - FIFO supplier payment allocation
//! - [`cashflow`] - Event-to-entry derivation and period summaries
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are minor units (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod cashflow;
pub mod costing;
pub mod debt;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use savdo_core::Money` instead of
// `use savdo_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// IMEI length in digits.
pub const IMEI_LENGTH: usize = 15;

/// Accessory codes are zero-padded to this many digits.
pub const ACCESSORY_CODE_WIDTH: usize = 4;

/// Largest single debt the shop extends in USD: $500.
///
/// ## Business Reason
/// Per-sale credit exposure is capped; bigger deals go through the owner
/// outside the ledger.
pub const MAX_PHONE_DEBT_MINOR: i64 = 500_00;

/// Largest single debt the shop extends in som: 10,000,000 som.
pub const MAX_ACCESSORY_DEBT_MINOR: i64 = 10_000_000_00;
