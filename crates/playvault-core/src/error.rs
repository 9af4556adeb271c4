//! # Error Types
//!
//! The wallet engine's error taxonomy.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  playvault-core errors (this file)                                     │
//! │  ├── WalletError      - Purchase/top-up failures, the full taxonomy    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  playvault-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures, converted into    │
//! │                         WalletError::{StorageConflict,StorageFailure}  │
//! │                                                                         │
//! │  Flow: ValidationError → WalletError → request layer → caller          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts)
//! 3. Errors are enum variants, never String
//! 4. Business failures are terminal for the attempt; only
//!    `StorageConflict` is retryable

use thiserror::Error;

// =============================================================================
// Wallet Error
// =============================================================================

/// Failures of the wallet engine's operations.
///
/// Every business-rule failure aborts the enclosing transaction with a
/// full rollback; no variant ever describes a partially applied purchase.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The request was malformed before any storage access.
    ///
    /// ## When This Occurs
    /// - Empty item set
    /// - Non-positive top-up amount
    /// - Blank discount code string
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// The wallet account does not exist.
    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: i64 },

    /// One or more requested items are missing from the catalog.
    ///
    /// The whole batch is rejected; `missing_ids` lists every id the
    /// catalog could not resolve.
    #[error("Catalog items not found: {missing_ids:?}")]
    ItemNotFound { missing_ids: Vec<i64> },

    /// The account already holds a license for one or more items.
    ///
    /// ## User Workflow
    /// ```text
    /// purchase([A, B]) where B is already owned
    ///      │
    ///      ▼
    /// AlreadyOwned { item_ids: [B] }
    ///      │
    ///      ▼
    /// Nothing is charged, nothing is granted (all-or-nothing)
    /// ```
    #[error("Items already owned: {item_ids:?}")]
    AlreadyOwned { item_ids: Vec<i64> },

    /// The balance cannot cover the order total.
    #[error("Insufficient funds: balance {balance_cents}, required {required_cents}")]
    InsufficientFunds {
        balance_cents: i64,
        required_cents: i64,
    },

    /// No discount code matches the given string.
    #[error("Discount code not found: {code}")]
    CodeNotFound { code: String },

    /// The code exists but is switched off or outside its validity window.
    #[error("Discount code is not active: {code}")]
    CodeInactive { code: String },

    /// The code's redemption count has reached its usage limit.
    #[error("Discount code usage limit reached: {code}")]
    CodeExhausted { code: String },

    /// Transient storage contention (lock wait timeout, pool exhaustion).
    /// Callers may retry the whole operation.
    #[error("Storage conflict, retryable: {message}")]
    StorageConflict { message: String },

    /// Non-retryable storage failure, surfaced as an internal error.
    #[error("Storage failure: {message}")]
    StorageFailure { message: String },
}

impl WalletError {
    /// Whether the caller may retry the operation as-is.
    ///
    /// Business-rule failures are never retryable; retrying them would
    /// produce the same answer (or, worse, a double charge).
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalletError::StorageConflict { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur before any storage access; they describe requests that can
/// never succeed regardless of database state.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A collection exceeds its allowed size.
    #[error("{field} cannot contain more than {max} entries")]
    TooMany { field: String, max: usize },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with WalletError.
pub type WalletResult<T> = Result<T, WalletError>;

// =============================================================================
// Unit Tests
// =============================================================================
