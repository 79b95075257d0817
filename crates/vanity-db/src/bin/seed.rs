//! # Seed Data Generator
//!
//! Populates a database with beauty-parlour demo data for development.
//!
//! ## Usage
//! ```bash
//! # 200 products (default) with EAN-13 barcodes
//! cargo run -p vanity-db --bin seed
//!
//! # More products, CODE128 labels, custom database
//! cargo run -p vanity-db --bin seed -- --count 1000 --symbology code128 --db ./data/vanity.db
//! ```
//!
//! Each product gets:
//! - SKU `{CATEGORY}-{INDEX}`
//! - A random, unique barcode in the chosen symbology
//! - Sale price ₹49 - ₹2,499, purchase price 45-70% of it
//! - Opening stock 0 - 60 (written as a purchase movement)
//! - GST 5%, 12% or 18%

use std::collections::HashSet;

use chrono::Utc;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vanity_core::barcode::{random_code, Symbology};
use vanity_core::{MovementType, Product, Service};
use vanity_db::repository::generate_id;
use vanity_db::{Database, DbConfig, StockEntry};

const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "HAIR",
        "Hair Care",
        &["Shampoo", "Conditioner", "Hair Oil", "Hair Serum", "Hair Mask", "Hair Spray"],
    ),
    (
        "SKIN",
        "Skin Care",
        &["Face Wash", "Moisturiser", "Sunscreen", "Toner", "Night Cream", "Face Pack"],
    ),
    (
        "MAKE",
        "Makeup",
        &["Lipstick", "Kajal", "Foundation", "Compact", "Mascara", "Nail Polish"],
    ),
    (
        "BODY",
        "Body Care",
        &["Body Lotion", "Body Wash", "Scrub", "Talc", "Deodorant", "Hand Cream"],
    ),
];

const VARIANTS: &[&str] = &["50ml", "100ml", "200ml", "Travel", "Herbal", "Premium"];

const SERVICES: &[(&str, i64, i64)] = &[
    ("Haircut", 40000, 30),
    ("Hair Spa", 120000, 60),
    ("Hair Colour", 250000, 120),
    ("Facial", 150000, 60),
    ("Cleanup", 60000, 30),
    ("Threading", 5000, 10),
    ("Waxing (Full Arms)", 40000, 30),
    ("Manicure", 50000, 40),
    ("Pedicure", 70000, 45),
    ("Bridal Makeup", 1500000, 180),
];

const TAX_RATES: &[u32] = &[500, 1200, 1800];

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Fill a Vanity POS database with demo data")]
struct Args {
    /// Number of products to generate
    #[arg(short, long, default_value_t = 200)]
    count: usize,

    /// Database file path
    #[arg(short, long, default_value = "./vanity_dev.db", env = "VANITY_DB_PATH")]
    db: String,

    /// Barcode symbology for generated labels (code128, ean13, upc)
    #[arg(short, long, default_value = "ean13")]
    symbology: Symbology,

    /// RNG seed, for reproducible data
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Vanity POS Seed Data Generator");
    println!("==============================");
    println!("Database:  {}", args.db);
    println!("Products:  {}", args.count);
    println!("Barcodes:  {}", args.symbology);
    println!();

    let db = Database::new(DbConfig::new(&args.db)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Services
    for (name, price_cents, minutes) in SERVICES {
        let now = Utc::now();
        db.services()
            .insert(&Service {
                id: generate_id(),
                name: name.to_string(),
                price_cents: *price_cents,
                duration_minutes: *minutes,
                tax_rate_bps: 1800,
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("✓ Added {} services", SERVICES.len());

    // Products
    let start = std::time::Instant::now();
    let mut used_codes = HashSet::new();
    let mut generated = 0;

    'outer: for (code, category_name, names) in CATEGORIES {
        let category = db.categories().create(category_name, None).await?;

        for name in names.iter() {
            for variant in VARIANTS {
                if generated >= args.count {
                    break 'outer;
                }

                let barcode = loop {
                    let candidate = random_code(args.symbology, &mut rng);
                    if used_codes.insert(candidate.clone()) {
                        break candidate;
                    }
                };

                let sale_price_cents = rng.gen_range(49..2500) * 100;
                let purchase_price_cents = sale_price_cents * rng.gen_range(45..=70) / 100;
                let now = Utc::now();
                let product = Product {
                    id: generate_id(),
                    sku: format!("{}-{:04}", code, generated + 1),
                    barcode: Some(barcode),
                    barcode_symbology: Some(args.symbology),
                    name: format!("{} {}", name, variant),
                    category_id: Some(category.id.clone()),
                    purchase_price_cents,
                    sale_price_cents,
                    tax_rate_bps: TAX_RATES[rng.gen_range(0..TAX_RATES.len())],
                    stock_qty: 0,
                    low_stock_threshold: vanity_core::DEFAULT_LOW_STOCK_THRESHOLD,
                    image_url: None,
                    created_at: now,
                    updated_at: now,
                };

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }

                let opening = rng.gen_range(0..=60);
                if opening > 0 {
                    db.stock()
                        .record_entry(&StockEntry {
                            product_id: product.id.clone(),
                            movement_type: MovementType::Purchase,
                            quantity: opening,
                            purchase_price_cents: Some(purchase_price_cents),
                            notes: Some("Opening stock".to_string()),
                        })
                        .await?;
                }

                generated += 1;
                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let low = db.products().list_low_stock().await?;
    let value = db.products().inventory_value_cents().await?;
    println!();
    println!("Low stock:        {} products", low.len());
    println!(
        "Inventory value:  {}",
        vanity_core::Money::from_cents(value).format_with_symbol(vanity_core::DEFAULT_CURRENCY_SYMBOL)
    );

    db.close().await;
    println!();
    println!("🎉 Seed complete!");

    Ok(())
}
