//! # Validation Module
//!
//! Input validation for ledger operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / API layer, out of scope here)                   │
//! │  ├── Basic format checks                                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Runs before any mutation starts                                   │
//! │  └── An error here means nothing was written                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (imei, accessory code)                         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{Currency, Phone, PhoneSource};
use crate::{ACCESSORY_CODE_WIDTH, IMEI_LENGTH, MAX_ACCESSORY_DEBT_MINOR, MAX_PHONE_DEBT_MINOR};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an IMEI.
///
/// ## Rules
/// - Exactly 15 digits, nothing else
///
/// ## Example
/// ```rust
/// use savdo_core::validation::validate_imei;
///
/// assert!(validate_imei("123456789012345").is_ok());
/// assert!(validate_imei("12345").is_err());
/// assert!(validate_imei("12345678901234X").is_err());
/// ```
pub fn validate_imei(imei: &str) -> ValidationResult<()> {
    let imei = imei.trim();

    if imei.is_empty() {
        return Err(ValidationError::Required {
            field: "imei".to_string(),
        });
    }

    if imei.len() != IMEI_LENGTH || !imei.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "imei".to_string(),
            reason: format!("must be exactly {} digits", IMEI_LENGTH),
        });
    }

    Ok(())
}

/// Validates an accessory code.
///
/// ## Rules
/// - Numeric only
/// - At most 4 digits (stored zero-padded to 4)
pub fn validate_accessory_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > ACCESSORY_CODE_WIDTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: format!("must be up to {} digits", ACCESSORY_CODE_WIDTH),
        });
    }

    Ok(())
}

/// Validates a display name (model, supplier, customer, accessory).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a restock quantity.
///
/// ## Rules
/// - Must be positive (>= 1)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price or cost component in minor units.
///
/// ## Rules
/// - Must be non-negative (zero is allowed: free repair, no imei cost)
pub fn validate_amount(field: &str, minor: i64) -> ValidationResult<()> {
    if minor < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a payment amount in minor units.
///
/// ## Rules
/// - Must be positive; paying zero or negative is a caller bug
pub fn validate_payment_amount(minor: i64) -> ValidationResult<()> {
    if minor <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a debt amount against the per-currency application cap.
///
/// ## Rules
/// - Non-negative
/// - At most $500 for USD debts, 10,000,000 som for som debts
pub fn validate_debt_amount(minor: i64, currency: Currency) -> ValidationResult<()> {
    if minor < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "debt amount".to_string(),
        });
    }

    let max = match currency {
        Currency::Usd => MAX_PHONE_DEBT_MINOR,
        Currency::Som => MAX_ACCESSORY_DEBT_MINOR,
    };

    if minor > max {
        return Err(ValidationError::OutOfRange {
            field: "debt amount".to_string(),
            min: 0,
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Phone Source Validators
// =============================================================================

/// Validates that a phone carries the counterparty data its source needs.
///
/// ## Rules per source
/// - Supplier: supplier_id present
/// - ExternalSeller: seller name present
/// - DailySeller: positive daily_payment
/// - Exchange: original owner name present
pub fn validate_phone_source(phone: &Phone) -> ValidationResult<()> {
    match phone.source {
        PhoneSource::Supplier => {
            if phone.supplier_id.as_deref().map_or(true, |s| s.trim().is_empty()) {
                return Err(ValidationError::Required {
                    field: "supplier_id".to_string(),
                });
            }
        }
        PhoneSource::ExternalSeller => {
            if phone
                .external_seller_name
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
            {
                return Err(ValidationError::Required {
                    field: "external_seller_name".to_string(),
                });
            }
        }
        PhoneSource::DailySeller => {
            if phone.daily_payment_minor.map_or(true, |p| p <= 0) {
                return Err(ValidationError::MustBePositive {
                    field: "daily_payment".to_string(),
                });
            }
        }
        PhoneSource::Exchange => {
            if phone
                .original_owner_name
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
            {
                return Err(ValidationError::Required {
                    field: "original_owner_name".to_string(),
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
