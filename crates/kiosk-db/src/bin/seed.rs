//! # Seed Data Generator
//!
//! Fills a development database with a kiosk catalog.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p kiosk-db --bin seed
//!
//! # Cap the number of products
//! cargo run -p kiosk-db --bin seed -- --count 20
//!
//! # Specify database path
//! cargo run -p kiosk-db --bin seed -- --db ./data/kiosk.db
//! ```
//!
//! Barcodes are `779` + a zero-padded sequence (EAN-13 length, no checksum).
//! Every tenth product starts under the low-stock threshold.

use std::env;

use kiosk_core::{Category, Money, Product};
use kiosk_db::{Database, DbConfig};

/// Catalog per category: (name, price in cents).
const CATALOG: &[(Category, &[(&str, i64)])] = &[
    (
        Category::Beverages,
        &[
            ("Agua 500ml", 1000),
            ("Agua con gas 500ml", 1100),
            ("Coca Cola 500ml", 1800),
            ("Sprite 500ml", 1700),
            ("Jugo de naranja 1L", 2200),
            ("Gatorade 500ml", 2100),
            ("Cafe en lata", 2500),
        ],
    ),
    (
        Category::Snacks,
        &[
            ("Papas fritas 80g", 1500),
            ("Mani salado 100g", 900),
            ("Palitos salados", 800),
            ("Nachos 150g", 1900),
        ],
    ),
    (
        Category::Sweets,
        &[
            ("Alfajor de chocolate", 800),
            ("Alfajor triple", 1200),
            ("Chicles menta", 400),
            ("Caramelos surtidos", 300),
            ("Barra de cereal", 700),
            ("Chocolate 100g", 2300),
        ],
    ),
    (
        Category::Dairy,
        &[
            ("Leche entera 1L", 1300),
            ("Yogur bebible", 1100),
            ("Queso cremoso 200g", 3200),
        ],
    ),
    (
        Category::Bakery,
        &[
            ("Medialunas x6", 2400),
            ("Pan lactal", 2000),
            ("Galletitas de agua", 1000),
        ],
    ),
    (
        Category::Groceries,
        &[
            ("Fideos 500g", 1400),
            ("Arroz 1kg", 1900),
            ("Yerba 500g", 3100),
        ],
    ),
    (
        Category::Cleaning,
        &[("Detergente 500ml", 1700), ("Lavandina 1L", 1200)],
    ),
    (
        Category::PersonalCare,
        &[
            ("Panuelos descartables", 600),
            ("Pasta dental", 1800),
            ("Jabon de tocador", 900),
        ],
    ),
    (Category::Other, &[("Pilas AA x2", 2600), ("Encendedor", 700)]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./kiosk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
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
                println!("Kiosk POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: whole catalog)");
                println!("  -d, --db <PATH>    Database file path (default: ./kiosk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Kiosk POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicate barcodes.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let products = CATALOG
        .iter()
        .flat_map(|(category, items)| items.iter().map(move |(name, price)| (*category, *name, *price)))
        .take(count)
        .enumerate()
        .map(|(seq, (category, name, price))| generate_product(seq, category, name, price));

    let mut generated = 0;
    for product in products {
        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.barcode, e);
            continue;
        }
        generated += 1;
    }

    println!("✓ Generated {} products", generated);

    match db.products().find_by_barcode(&barcode_for(0)).await? {
        Some(first) => println!("  Try scanning {} ({})", first.barcode, first.name),
        None => println!("  Catalog is empty"),
    }

    db.close().await;
    Ok(())
}

fn barcode_for(seq: usize) -> String {
    format!("779{:010}", seq + 1)
}

fn generate_product(seq: usize, category: Category, name: &str, price_cents: i64) -> Product {
    // Every tenth product is nearly sold out
    let stock = if seq % 10 == 9 { 3 } else { 12 + ((seq * 7) % 40) as i64 };

    Product::new(barcode_for(seq), name, Money::from_cents(price_cents), stock, category)
}
