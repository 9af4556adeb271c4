//! # Wallet Service
//!
//! The transactional core of the storefront: purchases, top-ups, balance
//! reads, and the ledger history.
//!
//! ## Purchase Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Purchase Transaction                               │
//! │                                                                         │
//! │  purchase(account, items, code?)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Normalize input (non-empty, deduplicated)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ── first statement writes the account row, taking SQLite's      │
//! │       │   writer lock before anything is read                          │
//! │       ▼                                                                 │
//! │  2. Account exists?          → AccountNotFound                         │
//! │  3. All items resolve?       → ItemNotFound { missing }                │
//! │  4. None already owned?      → AlreadyOwned { items }                  │
//! │  5. Code valid + not used up?→ CodeNotFound/Inactive/Exhausted         │
//! │  6. balance >= total?        → InsufficientFunds                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  7. Debit balance                                                      │
//! │     Insert order (fulfilled) + lines + ledger entry + grants           │
//! │     Insert redemption row (if code used)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT (or roll back everything on any failure)                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! SQLite has no `SELECT ... FOR UPDATE`. Instead, the transaction's first
//! statement is an UPDATE of the account row, which promotes it to the
//! database's single writer before the balance, ownership set, or
//! redemption count are read. Concurrent wallet operations queue on the
//! writer lock (up to the configured busy timeout), so two purchases from
//! the same account can never both spend the same balance, and two
//! redemptions can never both take a code's last slot. The lock is
//! released only at COMMIT or ROLLBACK, never mid-operation.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{catalog, library};
use playvault_core::{
    pricing, validation, Account, BalanceSummary, CatalogItem, DiscountCode, DiscountStatus,
    LedgerEntry, LedgerKind, LedgerStatus, Money, OrderReceipt, OrderStatus, PurchasedItem,
    WalletError, WalletResult,
};

// =============================================================================
// Clock
// =============================================================================

/// Timestamp source for the wallet engine.
///
/// Passed into [`WalletService`] explicitly so tests can pin time instead
/// of reading the system clock.
#[derive(Debug, Clone)]
pub struct Clock(ClockSource);

#[derive(Debug, Clone)]
enum ClockSource {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// The real system clock.
    pub fn system() -> Self {
        Clock(ClockSource::System)
    }

    /// A clock frozen at `at`. For tests.
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Clock(ClockSource::Fixed(at))
    }

    /// Current time according to this clock.
    pub fn now(&self) -> DateTime<Utc> {
        match self.0 {
            ClockSource::System => Utc::now(),
            ClockSource::Fixed(at) => at,
        }
    }
}

// =============================================================================
// Wallet Service
// =============================================================================

/// The wallet transaction engine.
///
/// All balance mutations in the system go through this service. Each
/// operation runs in a single database transaction that either commits
/// every write or none of them.
#[derive(Debug, Clone)]
pub struct WalletService {
    pool: SqlitePool,
    clock: Clock,
}

impl WalletService {
    /// Creates a new WalletService.
    pub fn new(pool: SqlitePool, clock: Clock) -> Self {
        WalletService { pool, clock }
    }

    /// Purchases a batch of catalog items with the wallet balance.
    ///
    /// ## Arguments
    /// * `account_id` - The buying account
    /// * `item_ids` - Items to license; duplicates collapse to one
    /// * `code` - Optional discount code (case-insensitive)
    ///
    /// ## Returns
    /// A receipt with the order id, pricing breakdown, and items, or the
    /// first failure in the validation sequence. Any failure leaves the
    /// database untouched: no order, no lines, no grants, no ledger
    /// entry, no redemption, no debit.
    pub async fn purchase(
        &self,
        account_id: i64,
        item_ids: &[i64],
        code: Option<&str>,
    ) -> WalletResult<OrderReceipt> {
        let item_ids = validation::normalize_item_ids(item_ids)?;
        let code = code.map(validation::normalize_code).transpose()?;

        debug!(
            account_id,
            items = item_ids.len(),
            code = code.as_deref(),
            "Purchase requested"
        );

        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Writer lock first (see module docs), then every check below
        // reads a state no concurrent wallet operation can move.
        let account = lock_account(&mut tx, account_id)
            .await?
            .ok_or(WalletError::AccountNotFound { account_id })?;

        let items = resolve_in_request_order(&mut tx, &item_ids).await?;

        let owned = library::owned_subset_with(&mut *tx, account_id, &item_ids).await?;
        if !owned.is_empty() {
            return Err(WalletError::AlreadyOwned { item_ids: owned });
        }

        let subtotal: Money = items.iter().map(CatalogItem::price).sum();

        let (discount, code_row) = match code.as_deref() {
            Some(code) => {
                let row = self.validate_code(&mut tx, code).await?;
                (pricing::discount_amount(subtotal, &row), Some(row))
            }
            None => (Money::zero(), None),
        };
        let total = pricing::order_total(subtotal, discount);

        if account.balance() < total {
            return Err(WalletError::InsufficientFunds {
                balance_cents: account.balance_cents,
                required_cents: total.cents(),
            });
        }

        let now = self.clock.now();
        let order_id = Uuid::new_v4().to_string();

        let debited = debit(&mut tx, account_id, total, now).await?;
        if !debited {
            // The balance check above makes this unreachable while the
            // lock is held; the CHECK-backed guard stays for safety.
            return Err(WalletError::InsufficientFunds {
                balance_cents: account.balance_cents,
                required_cents: total.cents(),
            });
        }

        insert_order(
            &mut tx,
            &order_id,
            account_id,
            subtotal,
            discount,
            total,
            code_row.as_ref().map(|c| c.id),
            now,
        )
        .await?;

        let mut receipt_items = Vec::with_capacity(items.len());
        for item in &items {
            insert_order_line(&mut tx, &order_id, item, now).await?;
            insert_grant(&mut tx, account_id, item.id, &order_id, now).await?;

            receipt_items.push(PurchasedItem {
                item_id: item.id,
                name: item.name.clone(),
                unit_price_cents: item.price_cents,
            });
        }

        insert_ledger_entry(
            &mut tx,
            account_id,
            LedgerKind::Purchase,
            total,
            Some(&order_id),
            now,
        )
        .await?;

        if let Some(code_row) = &code_row {
            insert_redemption(&mut tx, code_row.id, account_id, &order_id, discount, now).await?;
        }

        tx.commit().await.map_err(storage_err)?;

        info!(
            account_id,
            order_id = %order_id,
            subtotal = %subtotal,
            discount = %discount,
            total = %total,
            "Purchase fulfilled"
        );

        Ok(OrderReceipt {
            order_id,
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            total_cents: total.cents(),
            items: receipt_items,
            discount_code_id: code_row.map(|c| c.id),
        })
    }

    /// Credits the wallet and appends a top-up ledger entry, atomically.
    ///
    /// Runs under the same account-lock discipline as `purchase`, so a
    /// concurrent purchase and top-up on one account serialize.
    pub async fn top_up(&self, account_id: i64, amount_cents: i64) -> WalletResult<BalanceSummary> {
        validation::validate_top_up_cents(amount_cents)?;
        let amount = Money::from_cents(amount_cents);

        debug!(account_id, amount = %amount, "Top-up requested");

        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let account = lock_account(&mut tx, account_id)
            .await?
            .ok_or(WalletError::AccountNotFound { account_id })?;

        let now = self.clock.now();
        credit(&mut tx, account_id, amount, now).await?;
        insert_ledger_entry(&mut tx, account_id, LedgerKind::TopUp, amount, None, now).await?;

        tx.commit().await.map_err(storage_err)?;

        let balance_cents = account.balance_cents + amount.cents();
        info!(account_id, balance = %Money::from_cents(balance_cents), "Top-up credited");

        Ok(BalanceSummary {
            account_id,
            balance_cents,
        })
    }

    /// Reads the current balance. No lock, no side effects; two reads
    /// with no intervening write return identical results.
    pub async fn balance(&self, account_id: i64) -> WalletResult<BalanceSummary> {
        let summary = sqlx::query_as::<_, BalanceSummary>(
            r#"
            SELECT id AS account_id, balance_cents
            FROM accounts
            WHERE id = ?1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?
        .ok_or(WalletError::AccountNotFound { account_id })?;

        Ok(summary)
    }

    /// Lists an account's ledger entries, newest first.
    pub async fn transactions(&self, account_id: i64) -> WalletResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, account_id, kind, amount_cents, order_id, status, created_at
            FROM ledger_entries
            WHERE account_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(entries)
    }

    /// Validates a discount code inside the purchase transaction.
    ///
    /// The redemption count is read while the writer lock is held, so the
    /// count cannot move between this check and the redemption insert.
    async fn validate_code(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        code: &str,
    ) -> WalletResult<DiscountCode> {
        let row = sqlx::query_as::<_, DiscountCode>(
            r#"
            SELECT id, code, kind, value, max_discount_cents, usage_limit,
                   status, starts_at, ends_at, created_at
            FROM discount_codes
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut **tx)
        .await
        .map_err(storage_err)?
        .ok_or_else(|| WalletError::CodeNotFound {
            code: code.to_string(),
        })?;

        if row.status != DiscountStatus::Active || !row.is_within_window(self.clock.now()) {
            return Err(WalletError::CodeInactive {
                code: code.to_string(),
            });
        }

        if let Some(limit) = row.usage_limit {
            let used: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM discount_redemptions WHERE code_id = ?1")
                    .bind(row.id)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(storage_err)?;

            if used >= limit {
                return Err(WalletError::CodeExhausted {
                    code: code.to_string(),
                });
            }
        }

        Ok(row)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Folds a raw sqlx error through the storage taxonomy.
fn storage_err(err: sqlx::Error) -> WalletError {
    WalletError::from(DbError::from(err))
}

/// Resolves every requested item and reorders the result to match the
/// request. Any unresolved id fails the whole batch.
async fn resolve_in_request_order(
    tx: &mut Transaction<'_, Sqlite>,
    item_ids: &[i64],
) -> WalletResult<Vec<CatalogItem>> {
    let resolved = catalog::resolve_items_with(&mut **tx, item_ids).await?;

    let mut by_id: std::collections::HashMap<i64, CatalogItem> =
        resolved.into_iter().map(|item| (item.id, item)).collect();

    let mut ordered = Vec::with_capacity(item_ids.len());
    let mut missing_ids = Vec::new();
    for &id in item_ids {
        match by_id.remove(&id) {
            Some(item) => ordered.push(item),
            None => missing_ids.push(id),
        }
    }

    if !missing_ids.is_empty() {
        return Err(WalletError::ItemNotFound { missing_ids });
    }

    Ok(ordered)
}

/// Locks the account row and returns its current state.
///
/// The no-op UPDATE is the locking primitive: it forces the transaction
/// to become SQLite's writer immediately, before any read. Returns `None`
/// when the account does not exist.
async fn lock_account(
    tx: &mut Transaction<'_, Sqlite>,
    account_id: i64,
) -> WalletResult<Option<Account>> {
    let result = sqlx::query("UPDATE accounts SET updated_at = updated_at WHERE id = ?1")
        .bind(account_id)
        .execute(&mut **tx)
        .await
        .map_err(storage_err)?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, username, email, balance_cents, created_at, updated_at
        FROM accounts
        WHERE id = ?1
        "#,
    )
    .bind(account_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(Some(account))
}

/// Debits the account. Returns false when the balance cannot cover the
/// amount (the row is left untouched).
async fn debit(
    tx: &mut Transaction<'_, Sqlite>,
    account_id: i64,
    amount: Money,
    now: DateTime<Utc>,
) -> WalletResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET balance_cents = balance_cents - ?2, updated_at = ?3
        WHERE id = ?1 AND balance_cents >= ?2
        "#,
    )
    .bind(account_id)
    .bind(amount.cents())
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(result.rows_affected() == 1)
}

/// Credits the account.
async fn credit(
    tx: &mut Transaction<'_, Sqlite>,
    account_id: i64,
    amount: Money,
    now: DateTime<Utc>,
) -> WalletResult<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET balance_cents = balance_cents + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(account_id)
    .bind(amount.cents())
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn insert_order(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    account_id: i64,
    subtotal: Money,
    discount: Money,
    total: Money,
    discount_code_id: Option<i64>,
    now: DateTime<Utc>,
) -> WalletResult<()> {
    // Inserted fulfilled: a pending order is never observable outside
    // the uncommitted transaction, and failed attempts roll back.
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, account_id, subtotal_cents, discount_cents, total_cents,
            status, discount_code_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(order_id)
    .bind(account_id)
    .bind(subtotal.cents())
    .bind(discount.cents())
    .bind(total.cents())
    .bind(OrderStatus::Fulfilled)
    .bind(discount_code_id)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(())
}

async fn insert_order_line(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    item: &CatalogItem,
    now: DateTime<Utc>,
) -> WalletResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_lines (
            id, order_id, item_id, name_snapshot, unit_price_cents,
            quantity, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(order_id)
    .bind(item.id)
    .bind(&item.name)
    .bind(item.price_cents)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(())
}

async fn insert_grant(
    tx: &mut Transaction<'_, Sqlite>,
    account_id: i64,
    item_id: i64,
    order_id: &str,
    now: DateTime<Utc>,
) -> WalletResult<()> {
    sqlx::query(
        r#"
        INSERT INTO ownership_grants (account_id, item_id, order_id, granted_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(account_id)
    .bind(item_id)
    .bind(order_id)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(())
}

async fn insert_ledger_entry(
    tx: &mut Transaction<'_, Sqlite>,
    account_id: i64,
    kind: LedgerKind,
    amount: Money,
    order_id: Option<&str>,
    now: DateTime<Utc>,
) -> WalletResult<()> {
    sqlx::query(
        r#"
        INSERT INTO ledger_entries (
            id, account_id, kind, amount_cents, order_id, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(account_id)
    .bind(kind)
    .bind(amount.cents())
    .bind(order_id)
    .bind(LedgerStatus::Success)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(())
}

async fn insert_redemption(
    tx: &mut Transaction<'_, Sqlite>,
    code_id: i64,
    account_id: i64,
    order_id: &str,
    amount: Money,
    now: DateTime<Utc>,
) -> WalletResult<()> {
    sqlx::query(
        r#"
        INSERT INTO discount_redemptions (
            code_id, account_id, order_id, amount_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(code_id)
    .bind(account_id)
    .bind(order_id)
    .bind(amount.cents())
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use playvault_core::{DiscountKind, OrderStatus};
    use std::path::PathBuf;

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// File-backed database so multiple connections can actually contend.
    async fn file_db() -> (Database, PathBuf) {
        let path = std::env::temp_dir().join(format!("playvault-test-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        (db, path)
    }

    async fn remove_file_db(db: Database, path: PathBuf) {
        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut p = path.clone().into_os_string();
            p.push(suffix);
            let _ = std::fs::remove_file(p);
        }
    }

    async fn seed_account(db: &Database, username: &str, balance_cents: i64) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO accounts (username, email, balance_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind(balance_cents)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn seed_item(db: &Database, name: &str, price_cents: i64) -> i64 {
        sqlx::query(
            "INSERT INTO catalog_items (name, price_cents, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(price_cents)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[allow(clippy::too_many_arguments)]
    async fn seed_code(
        db: &Database,
        code: &str,
        kind: DiscountKind,
        value: i64,
        max_discount_cents: Option<i64>,
        usage_limit: Option<i64>,
        status: &str,
        window: (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
    ) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO discount_codes (
                code, kind, value, max_discount_cents, usage_limit,
                status, starts_at, ends_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(code)
        .bind(kind)
        .bind(value)
        .bind(max_discount_cents)
        .bind(usage_limit)
        .bind(status)
        .bind(window.0)
        .bind(window.1)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    // -------------------------------------------------------------------------
    // Purchase
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn purchase_debits_grants_and_writes_ledger() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;
        let b = seed_item(&db, "Neon Drift", 2550).await;

        let receipt = db.wallet().purchase(account, &[a, b], None).await.unwrap();

        assert_eq!(receipt.subtotal_cents, 3550);
        assert_eq!(receipt.discount_cents, 0);
        assert_eq!(receipt.total_cents, 3550);
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.discount_code_id, None);

        // balance_after = balance_before - total
        let balance = db.wallet().balance(account).await.unwrap();
        assert_eq!(balance.balance_cents, 5000 - 3550);

        // Order committed as fulfilled, with both lines
        let order = db
            .orders()
            .get_by_id(&receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Fulfilled);
        assert_eq!(order.total_cents, 3550);
        assert_eq!(db.orders().get_lines(&receipt.order_id).await.unwrap().len(), 2);

        // Exactly the purchased items are granted
        let owned = db.library().owned_items(account, &[a, b]).await.unwrap();
        assert_eq!(owned, vec![a, b]);

        // One purchase ledger entry tied to the order
        let entries = db.wallet().transactions(account).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, LedgerKind::Purchase);
        assert_eq!(entries[0].amount_cents, 3550);
        assert_eq!(entries[0].order_id.as_deref(), Some(receipt.order_id.as_str()));
        assert_eq!(entries[0].status, LedgerStatus::Success);
    }

    #[tokio::test]
    async fn purchase_collapses_duplicate_ids() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;

        let receipt = db.wallet().purchase(account, &[a, a, a], None).await.unwrap();

        assert_eq!(receipt.total_cents, 1000);
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 4000);
    }

    #[tokio::test]
    async fn purchase_rejects_empty_item_set() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;

        let err = db.wallet().purchase(account, &[], None).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn purchase_reports_missing_items() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;

        let err = db
            .wallet()
            .purchase(account, &[a, 777, 888], None)
            .await
            .unwrap_err();
        match err {
            WalletError::ItemNotFound { missing_ids } => assert_eq!(missing_ids, vec![777, 888]),
            other => panic!("expected ItemNotFound, got {other:?}"),
        }

        assert_eq!(count(&db, "orders").await, 0);
        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 5000);
    }

    #[tokio::test]
    async fn purchase_unknown_account() {
        let db = test_db().await;
        let a = seed_item(&db, "Star Harvest", 1000).await;

        let err = db.wallet().purchase(42, &[a], None).await.unwrap_err();
        assert!(matches!(err, WalletError::AccountNotFound { account_id: 42 }));
    }

    #[tokio::test]
    async fn purchase_rejects_whole_batch_when_any_item_owned() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 10_000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;
        let b = seed_item(&db, "Neon Drift", 2550).await;

        db.wallet().purchase(account, &[a], None).await.unwrap();

        let err = db.wallet().purchase(account, &[a, b], None).await.unwrap_err();
        match err {
            WalletError::AlreadyOwned { item_ids } => assert_eq!(item_ids, vec![a]),
            other => panic!("expected AlreadyOwned, got {other:?}"),
        }

        // All-or-nothing: the new item was not granted, nothing was charged
        assert!(db.library().owned_items(account, &[b]).await.unwrap().is_empty());
        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 9000);
        assert_eq!(count(&db, "orders").await, 1);
        assert_eq!(count(&db, "ledger_entries").await, 1);
    }

    #[tokio::test]
    async fn purchase_insufficient_funds_leaves_balance_untouched() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 2000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;
        let b = seed_item(&db, "Neon Drift", 1500).await;

        let err = db.wallet().purchase(account, &[a, b], None).await.unwrap_err();
        match err {
            WalletError::InsufficientFunds {
                balance_cents,
                required_cents,
            } => {
                assert_eq!(balance_cents, 2000);
                assert_eq!(required_cents, 2500);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }

        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 2000);
        assert_eq!(count(&db, "orders").await, 0);
        assert_eq!(count(&db, "order_lines").await, 0);
        assert_eq!(count(&db, "ownership_grants").await, 0);
        assert_eq!(count(&db, "ledger_entries").await, 0);
    }

    #[tokio::test]
    async fn purchase_uses_fixed_clock_for_timestamps() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;

        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let wallet = db.wallet_with_clock(Clock::fixed(at));

        let receipt = wallet.purchase(account, &[a], None).await.unwrap();
        let order = db.orders().get_by_id(&receipt.order_id).await.unwrap().unwrap();
        assert_eq!(order.created_at, at);
    }

    // -------------------------------------------------------------------------
    // Discount codes
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn purchase_applies_percent_code_with_cap() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;
        let b = seed_item(&db, "Neon Drift", 2550).await;
        let code_id = seed_code(
            &db,
            "LAUNCH10",
            DiscountKind::Percent,
            1000,
            Some(300),
            None,
            "active",
            (None, None),
        )
        .await;

        // 10% of $35.50 is $3.55, capped at $3.00 → total $32.50
        let receipt = db
            .wallet()
            .purchase(account, &[a, b], Some("launch10"))
            .await
            .unwrap();

        assert_eq!(receipt.subtotal_cents, 3550);
        assert_eq!(receipt.discount_cents, 300);
        assert_eq!(receipt.total_cents, 3250);
        assert_eq!(receipt.discount_code_id, Some(code_id));

        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 1750);

        // One redemption row recording the applied amount
        let (redeemed_count, redeemed_amount): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(amount_cents), 0) FROM discount_redemptions WHERE code_id = ?1",
        )
        .bind(code_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(redeemed_count, 1);
        assert_eq!(redeemed_amount, 300);
    }

    #[tokio::test]
    async fn purchase_fixed_code_floors_total_at_zero() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 1000).await;
        let a = seed_item(&db, "Star Harvest", 3000).await;
        seed_code(
            &db,
            "FREEBIE",
            DiscountKind::Fixed,
            5000,
            None,
            None,
            "active",
            (None, None),
        )
        .await;

        let receipt = db
            .wallet()
            .purchase(account, &[a], Some("FREEBIE"))
            .await
            .unwrap();

        assert_eq!(receipt.discount_cents, 3000);
        assert_eq!(receipt.total_cents, 0);

        // Nothing was debited; the ledger still records the settlement
        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 1000);
        let entries = db.wallet().transactions(account).await.unwrap();
        assert_eq!(entries[0].amount_cents, 0);
    }

    #[tokio::test]
    async fn purchase_rejects_unknown_code() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;

        let err = db
            .wallet()
            .purchase(account, &[a], Some("NOPE"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::CodeNotFound { .. }));
        assert_eq!(count(&db, "orders").await, 0);
    }

    #[tokio::test]
    async fn purchase_rejects_inactive_code() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;
        seed_code(
            &db,
            "PAUSED",
            DiscountKind::Percent,
            1000,
            None,
            None,
            "inactive",
            (None, None),
        )
        .await;

        let err = db
            .wallet()
            .purchase(account, &[a], Some("PAUSED"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::CodeInactive { .. }));
    }

    #[tokio::test]
    async fn purchase_rejects_code_outside_window() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;

        let starts = Utc::now() + chrono::Duration::days(7);
        seed_code(
            &db,
            "SOON",
            DiscountKind::Percent,
            1000,
            None,
            None,
            "active",
            (Some(starts), None),
        )
        .await;

        let err = db
            .wallet()
            .purchase(account, &[a], Some("SOON"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::CodeInactive { .. }));
    }

    #[tokio::test]
    async fn purchase_rejects_exhausted_code() {
        let db = test_db().await;
        let first = seed_account(&db, "mona", 5000).await;
        let second = seed_account(&db, "lisa", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;
        let b = seed_item(&db, "Neon Drift", 1000).await;
        let code_id = seed_code(
            &db,
            "ONCE",
            DiscountKind::Fixed,
            200,
            None,
            Some(1),
            "active",
            (None, None),
        )
        .await;

        db.wallet().purchase(first, &[a], Some("ONCE")).await.unwrap();

        let err = db
            .wallet()
            .purchase(second, &[b], Some("ONCE"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::CodeExhausted { .. }));

        // The failed attempt wrote nothing
        let redemptions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM discount_redemptions WHERE code_id = ?1")
                .bind(code_id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(redemptions, 1);
        assert_eq!(db.wallet().balance(second).await.unwrap().balance_cents, 5000);
    }

    // -------------------------------------------------------------------------
    // Top-up / balance / history
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn top_up_credits_and_writes_ledger() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 500).await;

        let summary = db.wallet().top_up(account, 2500).await.unwrap();
        assert_eq!(summary.balance_cents, 3000);

        let entries = db.wallet().transactions(account).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, LedgerKind::TopUp);
        assert_eq!(entries[0].amount_cents, 2500);
        assert_eq!(entries[0].order_id, None);
    }

    #[tokio::test]
    async fn top_up_rejects_non_positive_amounts() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 500).await;

        for amount in [0, -100] {
            let err = db.wallet().top_up(account, amount).await.unwrap_err();
            assert!(matches!(err, WalletError::InvalidRequest(_)));
        }

        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 500);
        assert_eq!(count(&db, "ledger_entries").await, 0);
    }

    #[tokio::test]
    async fn top_up_unknown_account() {
        let db = test_db().await;
        let err = db.wallet().top_up(42, 1000).await.unwrap_err();
        assert!(matches!(err, WalletError::AccountNotFound { account_id: 42 }));
    }

    #[tokio::test]
    async fn balance_reads_are_idempotent() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 1234).await;

        let first = db.wallet().balance(account).await.unwrap();
        let second = db.wallet().balance(account).await.unwrap();
        assert_eq!(first.balance_cents, second.balance_cents);
        assert_eq!(first.account_id, second.account_id);
    }

    #[tokio::test]
    async fn transactions_are_newest_first() {
        let db = test_db().await;
        let account = seed_account(&db, "mona", 0).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;

        db.wallet().top_up(account, 5000).await.unwrap();
        db.wallet().purchase(account, &[a], None).await.unwrap();
        db.wallet().top_up(account, 700).await.unwrap();

        let entries = db.wallet().transactions(account).await.unwrap();
        let kinds: Vec<LedgerKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![LedgerKind::TopUp, LedgerKind::Purchase, LedgerKind::TopUp]
        );
        assert_eq!(entries[0].amount_cents, 700);
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_purchases_cannot_overspend() {
        let (db, path) = file_db().await;
        let account = seed_account(&db, "mona", 2000).await;
        let a = seed_item(&db, "Star Harvest", 1500).await;
        let b = seed_item(&db, "Neon Drift", 1500).await;

        // Two purchases, each affordable alone, not together
        let w1 = db.wallet();
        let w2 = db.wallet();
        let t1 = tokio::spawn(async move { w1.purchase(account, &[a], None).await });
        let t2 = tokio::spawn(async move { w2.purchase(account, &[b], None).await });

        let results = [t1.await.unwrap(), t2.await.unwrap()];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let insufficient = results
            .iter()
            .filter(|r| matches!(r, Err(WalletError::InsufficientFunds { .. })))
            .count();

        assert_eq!(ok, 1, "exactly one purchase must win: {results:?}");
        assert_eq!(insufficient, 1, "the loser must see the spent balance: {results:?}");
        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 500);
        assert_eq!(count(&db, "orders").await, 1);
        assert_eq!(count(&db, "ledger_entries").await, 1);

        remove_file_db(db, path).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_redemptions_never_exceed_usage_limit() {
        let (db, path) = file_db().await;
        let first = seed_account(&db, "mona", 5000).await;
        let second = seed_account(&db, "lisa", 5000).await;
        let a = seed_item(&db, "Star Harvest", 1000).await;
        let b = seed_item(&db, "Neon Drift", 1000).await;
        let code_id = seed_code(
            &db,
            "ONCE",
            DiscountKind::Fixed,
            200,
            None,
            Some(1),
            "active",
            (None, None),
        )
        .await;

        let w1 = db.wallet();
        let w2 = db.wallet();
        let t1 = tokio::spawn(async move { w1.purchase(first, &[a], Some("ONCE")).await });
        let t2 = tokio::spawn(async move { w2.purchase(second, &[b], Some("ONCE")).await });

        let results = [t1.await.unwrap(), t2.await.unwrap()];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let exhausted = results
            .iter()
            .filter(|r| matches!(r, Err(WalletError::CodeExhausted { .. })))
            .count();

        assert_eq!(ok, 1, "exactly one redemption may land: {results:?}");
        assert_eq!(exhausted, 1, "the loser must see the code as used up: {results:?}");

        let redemptions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM discount_redemptions WHERE code_id = ?1")
                .bind(code_id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(redemptions, 1);

        remove_file_db(db, path).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_top_ups_both_land() {
        let (db, path) = file_db().await;
        let account = seed_account(&db, "mona", 0).await;

        let w1 = db.wallet();
        let w2 = db.wallet();
        let t1 = tokio::spawn(async move { w1.top_up(account, 1000).await });
        let t2 = tokio::spawn(async move { w2.top_up(account, 2000).await });

        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        assert_eq!(db.wallet().balance(account).await.unwrap().balance_cents, 3000);
        assert_eq!(count(&db, "ledger_entries").await, 2);

        remove_file_db(db, path).await;
    }
}
