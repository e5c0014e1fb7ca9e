//! # Seed Data Generator
//!
//! Populates the database with a demo venue for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p venue-db --bin seed
//!
//! # Specify database path
//! cargo run -p venue-db --bin seed -- --db ./data/venue.db
//! ```
//!
//! ## Generated Catalog
//! - Room types (Standard, VIP) and four private rooms
//! - Console types (PS5, Xbox) and eight consoles
//! - Table types (Pool, Ping Pong) and four tables
//! - Six café tables
//! - Café products (drinks, snacks)

use std::env;
use venue_core::{
    NewProduct, NewResource, NewResourceType, ResourceCategory, ResourceTypeKind,
};
use venue_db::{Database, DbConfig};

/// (kind, name, hourly price in cents)
const TYPES: &[(ResourceTypeKind, &str, i64)] = &[
    (ResourceTypeKind::Room, "Standard", 1500),
    (ResourceTypeKind::Room, "VIP", 2500),
    (ResourceTypeKind::Console, "PS5", 1200),
    (ResourceTypeKind::Console, "Xbox Series X", 1000),
    (ResourceTypeKind::Table, "Pool", 800),
    (ResourceTypeKind::Table, "Ping Pong", 600),
];

/// (category, label prefix, count, type index into TYPES)
const RESOURCES: &[(ResourceCategory, &str, usize, Option<usize>)] = &[
    (ResourceCategory::PrivateRoom, "Room ", 3, Some(0)),
    (ResourceCategory::PrivateRoom, "VIP Lounge ", 1, Some(1)),
    (ResourceCategory::PublicConsole, "", 5, Some(2)),
    (ResourceCategory::PublicConsole, "X", 3, Some(3)),
    (ResourceCategory::PublicTable, "", 2, Some(4)),
    (ResourceCategory::PublicTable, "P", 2, Some(5)),
    (ResourceCategory::CafeTable, "", 6, None),
];

/// (sku, name, list price in cents)
const PRODUCTS: &[(&str, &str, i64)] = &[
    ("BEV-COLA", "Cola", 300),
    ("BEV-WATER", "Water", 150),
    ("BEV-ENERGY", "Energy Drink", 600),
    ("BEV-COFFEE", "Coffee", 400),
    ("BEV-TEA", "Tea", 250),
    ("SNK-CHIPS", "Chips", 350),
    ("SNK-NACHOS", "Nachos", 700),
    ("SNK-CHOC", "Chocolate Bar", 300),
    ("FOOD-PIZZA", "Pizza Slice", 900),
    ("FOOD-BURGER", "Burger", 1400),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./venue_dev.db");

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
                println!("Venue Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./venue_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Venue Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().list_resources(None).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} resources", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let catalog = db.catalog();

    let mut type_ids = Vec::with_capacity(TYPES.len());
    for (kind, name, price) in TYPES {
        let created = catalog
            .create_type(&NewResourceType {
                kind: *kind,
                name: name.to_string(),
                price_per_hour_cents: *price,
            })
            .await?;
        type_ids.push(created.id);
    }
    println!("✓ Created {} resource types", type_ids.len());

    let mut resources = 0;
    for (category, prefix, count, type_index) in RESOURCES {
        for n in 1..=*count {
            let input = NewResource {
                category: *category,
                label: format!("{}{}", prefix, n),
                sequence: n as i64,
                type_id: type_index.map(|idx| type_ids[idx].clone()),
            };
            if let Err(e) = catalog.create_resource(&input).await {
                eprintln!("Failed to insert {}: {}", input.label, e);
                continue;
            }
            resources += 1;
        }
    }
    println!("✓ Created {} resources", resources);

    let mut products = 0;
    for (sku, name, price) in PRODUCTS {
        let input = NewProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            list_price_cents: *price,
        };
        if let Err(e) = db.products().create(&input).await {
            eprintln!("Failed to insert {}: {}", sku, e);
            continue;
        }
        products += 1;
    }
    println!("✓ Created {} products", products);

    println!();
    for category in ResourceCategory::ALL {
        let free = db.catalog().available(category).await?;
        println!("  {}: {} available", category, free.len());
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
