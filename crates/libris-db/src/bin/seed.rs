//! # Seed Data Generator
//!
//! Populates a demo database with books, members and loans.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p libris-db --bin seed
//!
//! # Fewer titles
//! cargo run -p libris-db --bin seed -- --count 10
//!
//! # Specify database path
//! cargo run -p libris-db --bin seed -- --db ./data/libris.db
//! ```
//!
//! ## Generated Data
//! - Classic titles with 1-4 copies each
//! - Members of every type, one of them deactivated
//! - Open loans, some issued long enough ago to be overdue
//! - The `admin` and `librarian` demo accounts

use chrono::Utc;
use libris_db::sample::{self, BOOKS};
use libris_db::{Database, DbConfig};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = BOOKS.len();
    let mut db_path = String::from("./libris_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(BOOKS.len());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Libris Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!(
                    "  -c, --count <N>    Number of titles to add (default/max: {})",
                    BOOKS.len()
                );
                println!("  -d, --db <PATH>    Database file path (default: ./libris_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }
    let count = count.min(BOOKS.len());

    println!("📚 Libris Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Titles:   {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    db.users().ensure_default_users().await?;
    println!("✓ Demo accounts: admin/admin, librarian/librarian");

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let summary = sample::seed(&db, count, Utc::now()).await?;

    println!("✓ Added {} books", summary.books);
    println!("✓ Added {} members", summary.members);
    println!("✓ Issued {} loans ({} overdue)", summary.loans, summary.overdue);

    let stats = db.reports().dashboard().await?;
    println!();
    println!(
        "✓ Seed complete in {:?}: {} books, {} active members, {} open loans",
        start.elapsed(),
        stats.total_books,
        stats.total_members,
        stats.active_issues
    );

    db.close().await;
    Ok(())
}
