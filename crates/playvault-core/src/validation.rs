//! # Validation Module
//!
//! Input validation for the wallet engine's operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer (out of scope here)                            │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Item set shape (non-empty, bounded, deduplicated)                 │
//! │  ├── Amount sign checks                                                │
//! │  └── Code normalization                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (balance_cents >= 0)                                        │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_ORDER_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Normalizes a purchase item-id set.
///
/// ## Rules
/// - Must not be empty
/// - Must not exceed MAX_ORDER_ITEMS unique ids
/// - Duplicates collapse silently (first occurrence wins), so a request
///   naming the same item twice charges and grants it once
///
/// ## Example
/// ```rust
/// use playvault_core::validation::normalize_item_ids;
///
/// assert_eq!(normalize_item_ids(&[3, 1, 3, 2]).unwrap(), vec![3, 1, 2]);
/// assert!(normalize_item_ids(&[]).is_err());
/// ```
pub fn normalize_item_ids(ids: &[i64]) -> ValidationResult<Vec<i64>> {
    if ids.is_empty() {
        return Err(ValidationError::Required {
            field: "item_ids".to_string(),
        });
    }

    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    let mut unique = Vec::with_capacity(ids.len());
    for &id in ids {
        if seen.insert(id) {
            unique.push(id);
        }
    }

    if unique.len() > MAX_ORDER_ITEMS {
        return Err(ValidationError::TooMany {
            field: "item_ids".to_string(),
            max: MAX_ORDER_ITEMS,
        });
    }

    Ok(unique)
}

/// Validates a top-up amount in cents.
///
/// ## Rules
/// - Must be positive (> 0); crediting zero or negative amounts is
///   rejected before any storage access
pub fn validate_top_up_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Normalizes a discount code string for lookup.
///
/// Codes are stored upper-cased; user input is trimmed and upper-cased
/// the same way so `launch10` and `LAUNCH10` resolve identically.
pub fn normalize_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "discount_code".to_string(),
        });
    }

    if code.len() > 64 {
        return Err(ValidationError::InvalidFormat {
            field: "discount_code".to_string(),
            reason: "must be at most 64 characters".to_string(),
        });
    }

    Ok(code.to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
