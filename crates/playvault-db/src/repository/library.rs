//! # Library Repository
//!
//! Ownership queries: which catalog items an account already holds a
//! license for.
//!
//! Grants are written exclusively by the purchase transaction; this
//! repository only reads them.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::DbResult;
use playvault_core::OwnershipGrant;

/// Repository for ownership reads.
#[derive(Debug, Clone)]
pub struct LibraryRepository {
    pool: SqlitePool,
}

impl LibraryRepository {
    /// Creates a new LibraryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LibraryRepository { pool }
    }

    /// Returns the subset of `ids` the account already owns.
    pub async fn owned_items(&self, account_id: i64, ids: &[i64]) -> DbResult<Vec<i64>> {
        owned_subset_with(&self.pool, account_id, ids).await
    }

    /// Lists every grant held by an account, newest first.
    pub async fn list_owned(&self, account_id: i64) -> DbResult<Vec<OwnershipGrant>> {
        let grants = sqlx::query_as::<_, OwnershipGrant>(
            r#"
            SELECT account_id, item_id, order_id, granted_at
            FROM ownership_grants
            WHERE account_id = ?1
            ORDER BY granted_at DESC, item_id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }
}

/// Executor-generic ownership check, shared between the repository and
/// the purchase transaction.
///
/// Returns the already-owned ids in ascending order so error payloads
/// are deterministic.
pub(crate) async fn owned_subset_with<'a, E>(
    executor: E,
    account_id: i64,
    ids: &[i64],
) -> DbResult<Vec<i64>>
where
    E: sqlx::Executor<'a, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT item_id FROM ownership_grants WHERE account_id = ");
    qb.push_bind(account_id);
    qb.push(" AND item_id IN (");
    {
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
    }
    qb.push(") ORDER BY item_id");

    let owned = qb.build_query_scalar::<i64>().fetch_all(executor).await?;

    Ok(owned)
}
