//! # playvault-db: Database Layer for Playvault
//!
//! This crate provides database access for the Playvault storefront
//! backend. It uses SQLite for storage with sqlx for async operations,
//! and it hosts the wallet transaction engine, the one part of the
//! storefront where writes must be atomic and race-safe.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Playvault Data Flow                               │
//! │                                                                         │
//! │  Request layer (routing, auth: out of scope)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   playvault-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │ WalletService │   │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │   │  (wallet.rs)  │   │  (embedded)  │    │   │
//! │  │   │               │   │               │   │              │    │   │
//! │  │   │ SqlitePool    │◄──│ purchase      │   │ 001_init.sql │    │   │
//! │  │   │ WAL, FKs,     │   │ top_up        │   │ 002_idx.sql  │    │   │
//! │  │   │ busy timeout  │   │ balance       │   │              │    │   │
//! │  │   └───────┬───────┘   │ transactions  │   └──────────────┘    │   │
//! │  │           │           └───────────────┘                        │   │
//! │  │           │           ┌───────────────────────────────────┐    │   │
//! │  │           └───────────│ Repositories (catalog, library,   │    │   │
//! │  │                       │ order): read-side contracts       │    │   │
//! │  │                       └───────────────────────────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and wallet-error mapping
//! - [`repository`] - Read-side repositories (catalog, library, order)
//! - [`wallet`] - The wallet transaction engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use playvault_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/playvault.db")).await?;
//!
//! db.wallet().top_up(account_id, 5_000).await?;
//! let receipt = db.wallet().purchase(account_id, &[3, 7], Some("LAUNCH10")).await?;
//! let history = db.wallet().transactions(account_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod wallet;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};
pub use wallet::{Clock, WalletService};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::library::LibraryRepository;
pub use repository::order::OrderRepository;
