//! # playvault-core: Pure Business Logic for the Playvault Wallet Engine
//!
//! This crate is the **heart** of the wallet and purchase engine. It
//! contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Playvault Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Request Layer (out of scope)                    │   │
//! │  │    routing, auth, catalog administration, image uploads        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ playvault-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Account  │  │   Money   │  │ discounts │  │   rules   │  │   │
//! │  │   │   Order   │  │   Rate    │  │  totals   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 playvault-db (Database Layer)                   │   │
//! │  │      SQLite storage, repositories, wallet orchestrator          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Account, Order, LedgerEntry, DiscountCode, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Pure discount and total calculation
//! - [`error`] - The wallet error taxonomy
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use playvault_core::money::Money;
//! use playvault_core::pricing::order_total;
//!
//! let subtotal = Money::from_cents(3550); // $35.50
//! let discount = Money::from_cents(300);  // $3.00
//!
//! assert_eq!(order_total(subtotal, discount).cents(), 3250);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use playvault_core::Money` instead of
// `use playvault_core::money::Money`

pub use error::{ValidationError, WalletError, WalletResult};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of unique items in a single purchase.
///
/// ## Business Reason
/// Bounds the write set of one transaction (lines, grants) and keeps
/// accidental bulk requests from holding the writer lock for long.
pub const MAX_ORDER_ITEMS: usize = 100;
