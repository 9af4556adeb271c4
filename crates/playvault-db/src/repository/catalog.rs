//! # Catalog Repository
//!
//! The engine's read-only window into the storefront catalog.
//!
//! Catalog administration (creating items, editing prices, uploading
//! artwork) belongs to another service; this repository only resolves
//! ids to `{id, name, price}` snapshots for the purchase flow.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use playvault_core::CatalogItem;

/// Repository for catalog reads.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Resolves a set of item ids to their current catalog snapshots.
    ///
    /// ## Contract
    /// Returns only the items that exist. A result shorter than the
    /// input means some ids are unknown; the caller decides whether
    /// that is an error (the purchase flow rejects the whole batch).
    pub async fn resolve_items(&self, ids: &[i64]) -> DbResult<Vec<CatalogItem>> {
        resolve_items_with(&self.pool, ids).await
    }

    /// Gets a single catalog item by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<CatalogItem>> {
        let item = sqlx::query_as::<_, CatalogItem>(
            r#"
            SELECT id, name, price_cents
            FROM catalog_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }
}

/// Executor-generic item resolution, shared between the repository and
/// the purchase transaction.
///
/// The id set is bound as individual parameters. SQLite's default bind
/// limit is far above the engine's order-size bound, so one statement
/// always suffices.
pub(crate) async fn resolve_items_with<'a, E>(executor: E, ids: &[i64]) -> DbResult<Vec<CatalogItem>>
where
    E: sqlx::Executor<'a, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    debug!(count = ids.len(), "Resolving catalog items");

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, name, price_cents FROM catalog_items WHERE id IN (");
    {
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
    }
    qb.push(")");

    let items = qb
        .build_query_as::<CatalogItem>()
        .fetch_all(executor)
        .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
