//! # Error Types
//!
//! Domain-specific error types for savdo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  savdo-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  savdo-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (IMEI, ID, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::types::{Currency, PhoneStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are raised before
/// any state is written, so a caller seeing one knows nothing changed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two amounts in different currencies met in one calculation.
    ///
    /// ## When This Occurs
    /// - A som payment applied to a USD debt
    /// - A mixed-currency report bucket
    #[error("Currency mismatch: expected {expected:?}, got {actual:?}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    /// A payment would exceed what is actually owed.
    ///
    /// ## When This Occurs
    /// - Supplier payment larger than balance without explicit carry-over
    #[error("Payment {amount} exceeds outstanding balance {balance}")]
    PaymentExceedsBalance { amount: String, balance: String },

    /// Not enough accessory stock to cover a sale.
    ///
    /// ## When This Occurs
    /// - Selling more units than the counted quantity on hand
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// A phone's status does not allow the requested operation.
    ///
    /// ## When This Occurs
    /// - Selling a phone that is already sold or out for repair
    /// - Returning a phone that was never sold
    #[error("Phone cannot take this operation in status {status:?}")]
    PhoneUnavailable { status: PhoneStatus },

    /// A debt needs a due date but none was given.
    ///
    /// Every debt with a positive amount must carry a promise date;
    /// collections work from that date.
    #[error("Due date is required when debt amount is positive")]
    DueDateRequired,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet field-level requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid IMEI, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate IMEI, duplicate accessory code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
