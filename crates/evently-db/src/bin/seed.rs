//! # Demo Data Seeder
//!
//! Populates a database with the default events and coupons.
//!
//! ## Usage
//! ```bash
//! # Seed ./evently_dev.db (default)
//! cargo run -p evently-db --bin seed
//!
//! # Specify database path
//! cargo run -p evently-db --bin seed -- --db ./data/evently.db
//! ```
//!
//! ## Seeded Data
//! - Tech Conference 2024, Creative Workshop, Music Festival
//!   (only when the events table is empty)
//! - WELCOME20, VIP50, EARLYBIRD coupons (each only when its code is missing)

use std::env;

use evently_db::{seed_demo_data, Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./evently_dev.db");

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
                println!("Evently Demo Data Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./evently_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Evently Demo Data Seeder");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let report = seed_demo_data(&db).await?;

    println!();
    println!("✓ Events added:  {}", report.events_added);
    println!("✓ Coupons added: {}", report.coupons_added);

    if report.events_added == 0 {
        println!("  Events table already had data, default events skipped.");
    }

    println!();
    println!("Events:");
    for event in db.events().list().await? {
        println!(
            "  {:<24} {:>5}/{:<5} {}",
            event.title,
            event.attendees,
            event.max_attendees,
            event.price()
        );
    }

    println!();
    println!("Coupons:");
    for coupon in db.coupons().list().await? {
        println!(
            "  {:<12} {:>3}/{:<3} uses ({:?})",
            coupon.code, coupon.used_count, coupon.usage_limit, coupon.coupon_type
        );
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
