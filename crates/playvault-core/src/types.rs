//! # Domain Types
//!
//! Core domain types for the Playvault wallet engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │      Order      │   │  LedgerEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  balance_cents  │   │  subtotal       │   │  kind           │       │
//! │  │  username       │   │  discount       │   │  amount_cents   │       │
//! │  │  email          │   │  total, status  │   │  order_id?      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountCode   │   │ OwnershipGrant  │   │   CatalogItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  kind, value    │   │  (account,item) │   │  id, name,      │       │
//! │  │  cap, limit     │   │  unique pair    │   │  price_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Accounts and catalog items are owned by external collaborators and carry
//! their integer ids. Rows created by this engine (orders, ledger entries)
//! use UUID v4 strings so they can be minted without coordination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10%, which keeps percent math in exact integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Account
// =============================================================================

/// A user's wallet account.
///
/// The balance is mutated only inside a purchase or top-up transaction and
/// is never negative after a committed operation (the schema backs this
/// with a CHECK constraint).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Account {
    /// Account id, owned by the user-management collaborator.
    pub id: i64,

    pub username: String,

    pub email: String,

    /// Wallet balance in cents. Never negative after commit.
    pub balance_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns the balance as a Money type.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// The engine's read-only view of a catalog item.
///
/// The catalog collaborator owns the full record (description, artwork,
/// category). The engine only needs the identity, display name, and the
/// price it snapshots into order lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CatalogItem {
    pub id: i64,

    /// Display name, copied into the order line at purchase time.
    pub name: String,

    /// Price in cents at the moment of resolution.
    /// Later catalog price changes never touch completed orders.
    pub price_cents: i64,
}

impl CatalogItem {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// `Pending` exists only inside an uncommitted purchase transaction and
/// `Failed` attempts roll back entirely, so durable rows are always
/// `Fulfilled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Purchase in flight, not yet committed.
    Pending,
    /// Purchase committed, terminal.
    Fulfilled,
    /// Purchase attempt failed (never durable, the transaction rolls back).
    Failed,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A committed purchase: the snapshot of items, prices, and discount
/// applied in one wallet transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub account_id: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    /// Discount code applied to this order, if any.
    pub discount_code_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item in an order.
/// Uses the snapshot pattern to freeze the item name and price at purchase
/// time. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub item_id: i64,
    /// Item name at time of purchase (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of purchase (frozen).
    pub unit_price_cents: i64,
    /// Always 1 in this domain: each item is a single license.
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// The kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    /// Wallet credit.
    TopUp,
    /// Wallet debit against an order.
    Purchase,
}

/// The status of a ledger entry.
///
/// Failed attempts never commit, so every durable entry is `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Success,
}

/// An append-only record of a balance-affecting event.
///
/// Entries are never updated or deleted; the ledger is the authoritative
/// audit trail of every wallet credit and debit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub account_id: i64,
    pub kind: LedgerKind,
    /// Amount moved, in cents. Credits and debits are both positive;
    /// `kind` carries the direction.
    pub amount_cents: i64,
    /// The order this entry settles. `None` for top-ups.
    pub order_id: Option<String>,
    pub status: LedgerStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Ownership Grant
// =============================================================================

/// A record that an account holds a perpetual license to a catalog item.
///
/// At most one grant exists per (account, item) pair; the engine checks
/// before debiting and the schema's primary key backs the invariant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OwnershipGrant {
    pub account_id: i64,
    pub item_id: i64,
    /// The order that produced this grant.
    pub order_id: String,
    #[ts(as = "String")]
    pub granted_at: DateTime<Utc>,
}

// =============================================================================
// Discount Code
// =============================================================================

/// How a discount code reduces an order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage of the subtotal, optionally capped.
    Percent,
    /// Flat amount off, clamped to the subtotal.
    Fixed,
}

/// Operator-facing lifecycle switch for a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountStatus {
    Active,
    Inactive,
}

/// A redeemable discount code.
///
/// The lifecycle (creation, editing, deactivation) is managed by an
/// administrative collaborator; this engine reads the definition and
/// appends one redemption row per successful use.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DiscountCode {
    pub id: i64,

    /// Unique, stored upper-cased. Lookups normalize the same way.
    pub code: String,

    pub kind: DiscountKind,

    /// Basis points for `Percent` codes, cents for `Fixed` codes.
    pub value: i64,

    /// Upper bound on the discount amount. Percent codes only.
    pub max_discount_cents: Option<i64>,

    /// Maximum number of redemptions. `None` means unlimited.
    pub usage_limit: Option<i64>,

    pub status: DiscountStatus,

    /// Start of the validity window. `None` means no lower bound.
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    /// End of the validity window. `None` means no upper bound.
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl DiscountCode {
    /// Returns the percent rate. Meaningful for `Percent` codes only.
    #[inline]
    pub fn rate(&self) -> Rate {
        Rate::from_bps(self.value.max(0) as u32)
    }

    /// Returns the flat amount. Meaningful for `Fixed` codes only.
    #[inline]
    pub fn fixed_amount(&self) -> Money {
        Money::from_cents(self.value)
    }

    /// Returns the discount cap, if one is set.
    #[inline]
    pub fn cap(&self) -> Option<Money> {
        self.max_discount_cents.map(Money::from_cents)
    }

    /// Checks whether `now` falls inside the code's validity window.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        if let Some(starts_at) = self.starts_at {
            if now < starts_at {
                return false;
            }
        }
        if let Some(ends_at) = self.ends_at {
            if now > ends_at {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Discount Redemption
// =============================================================================

/// One successful application of a discount code to an order.
///
/// The count of rows per code never exceeds the code's `usage_limit`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DiscountRedemption {
    pub id: i64,
    pub code_id: i64,
    pub account_id: i64,
    pub order_id: String,
    /// Discount amount actually applied, in cents.
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Result DTOs
// =============================================================================

/// A purchased item as reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchasedItem {
    pub item_id: i64,
    pub name: String,
    pub unit_price_cents: i64,
}

/// The result of a successful purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderReceipt {
    pub order_id: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub items: Vec<PurchasedItem>,
    /// The discount code applied, if any.
    pub discount_code_id: Option<i64>,
}

/// A wallet balance snapshot, returned by top-ups and balance reads.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BalanceSummary {
    pub account_id: i64,
    pub balance_cents: i64,
}

impl BalanceSummary {
    /// Returns the balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
