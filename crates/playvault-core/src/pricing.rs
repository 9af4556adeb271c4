//! # Pricing & Discount Calculator
//!
//! Pure pricing math for the purchase flow. No side effects, no I/O,
//! testable in isolation.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Purchase Pricing                                   │
//! │                                                                         │
//! │  Snapshot prices ($10.00, $25.50)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal = $35.50                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount_amount(subtotal, code) ← THIS MODULE                         │
//! │       │   percent 10%, cap $3.00 → min($3.55, $3.00) = $3.00          │
//! │       ▼                                                                 │
//! │  order_total(subtotal, discount) = $32.50                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::Money;
use crate::types::{DiscountCode, DiscountKind};

/// Computes the discount amount a code grants against a subtotal.
///
/// ## Rules
/// - `Percent`: subtotal × rate, rounded half-up to whole cents, then
///   clamped to the code's cap when one is set.
/// - `Fixed`: the code's flat value, never more than the subtotal.
/// - The result is always within `[0, subtotal]`.
///
/// ## Example
/// ```rust
/// use playvault_core::money::Money;
/// use playvault_core::pricing::discount_amount;
/// use playvault_core::types::{DiscountCode, DiscountKind, DiscountStatus};
/// # use chrono::Utc;
///
/// let code = DiscountCode {
///     id: 1,
///     code: "LAUNCH10".to_string(),
///     kind: DiscountKind::Percent,
///     value: 1000, // 10%
///     max_discount_cents: Some(300),
///     usage_limit: None,
///     status: DiscountStatus::Active,
///     starts_at: None,
///     ends_at: None,
///     created_at: Utc::now(),
/// };
///
/// // 10% of $35.50 is $3.55, capped at $3.00
/// let discount = discount_amount(Money::from_cents(3550), &code);
/// assert_eq!(discount.cents(), 300);
/// ```
pub fn discount_amount(subtotal: Money, code: &DiscountCode) -> Money {
    let raw = match code.kind {
        DiscountKind::Percent => {
            let pct = subtotal.percentage(code.rate());
            match code.cap() {
                Some(cap) => pct.min(cap),
                None => pct,
            }
        }
        DiscountKind::Fixed => code.fixed_amount().min(subtotal),
    };

    // Clamp to [0, subtotal]: a malformed definition (negative value,
    // negative cap) must never inflate the total or turn it negative.
    raw.max(Money::zero()).min(subtotal)
}

/// Computes the order total from a subtotal and a discount amount,
/// floored at zero.
#[inline]
pub fn order_total(subtotal: Money, discount: Money) -> Money {
    (subtotal - discount).max(Money::zero())
}

// =============================================================================
// Unit Tests
// =============================================================================
