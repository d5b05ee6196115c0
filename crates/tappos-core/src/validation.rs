//! # Validation Module
//!
//! Input validation utilities for TapPOS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Engine boundary (Rust)                                       │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (card_uid, email, rfid_uid)                    │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::CartLine;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length for a tag UID. Physical MIFARE UIDs are short hex
/// strings; anything longer is a malformed payload.
pub const MAX_UID_LEN: usize = 32;

/// Maximum distinct lines in a checkout cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum unit price of a cart line, in cents (one million major
/// units). Bounds the line-total and cart-total arithmetic so that
/// `MAX_CART_LINES * MAX_LINE_QUANTITY * MAX_UNIT_PRICE_CENTS` stays
/// far inside i64 range.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a tag UID (customer card or product tag).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most [`MAX_UID_LEN`] characters
/// - Must contain only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use tappos_core::validation::validate_uid;
///
/// assert!(validate_uid("04A1B2C3").is_ok());
/// assert!(validate_uid("").is_err());
/// assert!(validate_uid("bad uid!").is_err());
/// ```
pub fn validate_uid(uid: &str) -> ValidationResult<()> {
    let uid = uid.trim();

    if uid.is_empty() {
        return Err(ValidationError::Required {
            field: "uid".to_string(),
        });
    }

    if uid.len() > MAX_UID_LEN {
        return Err(ValidationError::TooLong {
            field: "uid".to_string(),
            max: MAX_UID_LEN,
        });
    }

    if !uid
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "uid".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer's full name.
pub fn validate_full_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "full_name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "full_name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Format checking is intentionally shallow (one `@`, non-empty local
/// and domain parts). The unique index is the real gatekeeper.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain.tld".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a monetary amount that must be strictly positive
/// (top-up amounts, checkout totals).
pub fn validate_amount(field: &str, amount_cents: i64) -> ValidationResult<()> {
    if amount_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a line quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a checkout cart: non-empty, bounded, every line sane.
pub fn validate_cart(cart: &[CartLine]) -> ValidationResult<()> {
    if cart.is_empty() {
        return Err(ValidationError::Required {
            field: "cart".to_string(),
        });
    }

    if cart.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    for line in cart {
        validate_quantity(line.quantity)?;
        if line.unit_price_cents < 0 {
            return Err(ValidationError::MustBePositive {
                field: "unit_price_cents".to_string(),
            });
        }
        if line.unit_price_cents > MAX_UNIT_PRICE_CENTS {
            return Err(ValidationError::OutOfRange {
                field: "unit_price_cents".to_string(),
                min: 0,
                max: MAX_UNIT_PRICE_CENTS,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uid_accepts_reader_output() {
        // The edge controller emits uppercase hex
        assert!(validate_uid("04A1B2C3D4").is_ok());
        assert!(validate_uid("TAG001").is_ok());
        assert!(validate_uid("ADMIN_CARD").is_ok());
    }

    #[test]
    fn test_validate_uid_rejects_garbage() {
        assert!(validate_uid("").is_err());
        assert!(validate_uid("   ").is_err());
        assert!(validate_uid(&"A".repeat(33)).is_err());
        assert!(validate_uid("uid with spaces").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@darywise.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@missing.local").is_err());
        assert!(validate_email("name@nodot").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("amount", 1000).is_ok());
        assert!(validate_amount("amount", 0).is_err());
        assert!(validate_amount("amount", -500).is_err());
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_cart() {
        let line = CartLine {
            product_id: "p-1".to_string(),
            quantity: 2,
            unit_price_cents: 500,
        };
        assert!(validate_cart(&[line.clone()]).is_ok());
        assert!(validate_cart(&[]).is_err());

        let bad = CartLine {
            quantity: 0,
            ..line
        };
        assert!(validate_cart(&[bad]).is_err());
    }

    #[test]
    fn test_validate_cart_bounds_unit_price() {
        let line = CartLine {
            product_id: "p-1".to_string(),
            quantity: MAX_LINE_QUANTITY,
            unit_price_cents: MAX_UNIT_PRICE_CENTS,
        };
        assert!(validate_cart(&[line.clone()]).is_ok());

        // An absurd price must be rejected before any total arithmetic
        // can overflow
        let bad = CartLine {
            unit_price_cents: i64::MAX / 2,
            ..line
        };
        assert!(matches!(
            validate_cart(&[bad]),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
