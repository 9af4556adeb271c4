//! # Repository Module
//!
//! Read-side database repositories for the wallet engine's collaborator
//! contracts.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Request layer                                                         │
//! │       │                                                                 │
//! │       │  db.catalog().resolve_items(&[3, 7])                           │
//! │       ▼                                                                 │
//! │  CatalogRepository                                                     │
//! │  ├── resolve_items(&self, ids)                                         │
//! │  └── get_by_id(&self, id)                                              │
//! │       │                                                                 │
//! │       │  Parameterized SQL (set membership via bind list,              │
//! │       │  never string-built IN clauses)                                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  The wallet engine reuses the same queries through crate-internal      │
//! │  executor-generic functions, so validation inside a purchase           │
//! │  transaction and plain reads share one SQL definition.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Catalog item resolution
//! - [`library::LibraryRepository`] - Ownership queries
//! - [`order::OrderRepository`] - Order and line reads

pub mod catalog;
pub mod library;
pub mod order;
