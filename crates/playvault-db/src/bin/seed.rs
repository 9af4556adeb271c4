//! # Seed Data Generator
//!
//! Populates the database with demo accounts, catalog items, and discount
//! codes for development, then runs one top-up and one discounted
//! purchase to show the wallet engine end to end.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p playvault-db --bin seed
//!
//! # Specify database path
//! cargo run -p playvault-db --bin seed -- --db ./data/playvault.db
//! ```

use chrono::Utc;
use std::env;

use playvault_core::DiscountKind;
use playvault_db::{Database, DbConfig};

/// Demo catalog: (name, price in cents).
const CATALOG: &[(&str, i64)] = &[
    ("Star Harvest", 1999),
    ("Neon Drift", 2550),
    ("Cinder Vale", 3999),
    ("Tidebreaker", 1499),
    ("Moth & Lantern", 999),
    ("Redline Protocol", 4999),
    ("Gloam", 799),
    ("Skyward Salvage", 2999),
    ("Hollow Cartographers", 1999),
    ("Last Stop Diner", 599),
];

/// Demo accounts: (username, starting balance in cents).
const ACCOUNTS: &[(&str, i64)] = &[("mona", 10_000), ("lisa", 2_500), ("sam", 0)];

/// Demo codes: (code, kind, value, cap cents, usage limit).
const CODES: &[(&str, DiscountKind, i64, Option<i64>, Option<i64>)] = &[
    // 10% off, at most $3.00, unlimited uses
    ("LAUNCH10", DiscountKind::Percent, 1000, Some(300), None),
    // $5.00 off, first 100 redemptions
    ("WELCOME5", DiscountKind::Fixed, 500, None, Some(100)),
    // 100% off, single use, for giveaways
    ("ONTHEHOUSE", DiscountKind::Percent, 10_000, None, Some(1)),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./playvault_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Playvault Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./playvault_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Playvault Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} accounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding demo data...");

    let now = Utc::now();

    let mut account_ids = Vec::new();
    for &(username, balance_cents) in ACCOUNTS {
        let id = sqlx::query(
            r#"
            INSERT INTO accounts (username, email, balance_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(username)
        .bind(format!("{username}@playvault.dev"))
        .bind(balance_cents)
        .bind(now)
        .execute(db.pool())
        .await?
        .last_insert_rowid();
        account_ids.push(id);
    }
    println!("  {} accounts", account_ids.len());

    let mut item_ids = Vec::new();
    for &(name, price_cents) in CATALOG {
        let id = sqlx::query(
            "INSERT INTO catalog_items (name, price_cents, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(price_cents)
        .bind(now)
        .execute(db.pool())
        .await?
        .last_insert_rowid();
        item_ids.push(id);
    }
    println!("  {} catalog items", item_ids.len());

    for &(code, kind, value, cap, limit) in CODES {
        sqlx::query(
            r#"
            INSERT INTO discount_codes (
                code, kind, value, max_discount_cents, usage_limit,
                status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'active', ?6)
            "#,
        )
        .bind(code)
        .bind(kind)
        .bind(value)
        .bind(cap)
        .bind(limit)
        .bind(now)
        .execute(db.pool())
        .await?;
    }
    println!("  {} discount codes", CODES.len());

    // Exercise the engine: top up the empty account, then buy two items
    // with the launch code.
    println!();
    println!("Running a demo transaction...");

    let wallet = db.wallet();
    let buyer = account_ids[2];

    let summary = wallet.top_up(buyer, 10_000).await?;
    println!("  Topped up account {} to {}", buyer, summary.balance());

    let receipt = wallet
        .purchase(buyer, &[item_ids[0], item_ids[1]], Some("LAUNCH10"))
        .await?;
    println!("  Receipt:");
    println!("{}", serde_json::to_string_pretty(&receipt)?);

    let balance = wallet.balance(buyer).await?;
    println!("  Remaining balance: {}", balance.balance());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
