//! # Catalog Commands
//!
//! Categories, products and services.
//!
//! Products are created with zero stock; stock arrives through
//! `vanity stock purchase`. A barcode given with `--barcode` is checked
//! against `--symbology`, or the symbology it looks like (EAN-13 / UPC-A
//! check digits are verified), and stored with it.

use chrono::Utc;
use tracing::info;
use vanity_core::barcode::{self, Symbology};
use vanity_core::{Category, Product, Service};
use vanity_db::repository::generate_id;
use vanity_db::{Database, DbError};

use super::{money, parse_money, parse_tax, table, Output};
use crate::cli::{CategoryAction, ProductAction, ProductFields, ServiceAction, SymbologyArg};
use crate::error::{ApiError, ApiResult};
use crate::state::ConfigState;

// =============================================================================
// Categories
// =============================================================================

pub async fn category(db: &Database, action: CategoryAction) -> ApiResult<Output> {
    let repo = db.categories();
    match action {
        CategoryAction::List => {
            let categories = repo.list().await?;
            let rows = categories
                .iter()
                .map(|c| vec![c.id.clone(), c.name.clone(), c.description.clone().unwrap_or_default()])
                .collect::<Vec<_>>();
            Output::new(table(&["id", "name", "description"], &rows), &categories)
        }
        CategoryAction::Add { name, description } => {
            let category = repo.create(&name, description.as_deref()).await?;
            info!(id = %category.id, name = %category.name, "Category created");
            Output::new(format!("Created category {} ({})", category.name, category.id), &category)
        }
        CategoryAction::Update { id, name, description } => {
            let category = resolve_category(db, &id).await?;
            repo.update(&category.id, &name, description.as_deref()).await?;
            Ok(Output::message(format!("Updated category {}", name.trim())))
        }
        CategoryAction::Delete { id } => {
            let category = resolve_category(db, &id).await?;
            repo.delete(&category.id).await?;
            Ok(Output::message(format!("Deleted category {}", category.name)))
        }
    }
}

/// Category by id, then by name.
async fn resolve_category(db: &Database, key: &str) -> ApiResult<Category> {
    let repo = db.categories();
    if let Some(c) = repo.get_by_id(key).await? {
        return Ok(c);
    }
    repo.get_by_name(key)
        .await?
        .ok_or_else(|| DbError::not_found("Category", key).into())
}

// =============================================================================
// Products
// =============================================================================

pub async fn product(db: &Database, config: &ConfigState, action: ProductAction) -> ApiResult<Output> {
    match action {
        ProductAction::List {
            query,
            limit,
            with_barcodes,
        } => {
            let products = match (query.as_deref().map(str::trim), with_barcodes) {
                (_, true) => db.products().list_with_barcodes().await?,
                (Some(q), false) if !q.is_empty() => db.products().search(q, limit).await?,
                _ => db.products().list(limit).await?,
            };
            Output::new(product_table(&products, config), &products)
        }
        ProductAction::Show { key } => {
            let product = db.products().find(&key).await?;
            Output::new(describe_product(&product, config), &product)
        }
        ProductAction::Add { fields } => add_product(db, config, fields).await,
        ProductAction::Update { key, fields } => update_product(db, &key, fields).await,
        ProductAction::Delete { key } => {
            let product = db.products().find(&key).await?;
            db.products().delete(&product.id).await?;
            info!(sku = %product.sku, "Product deleted");
            Ok(Output::message(format!("Deleted {} ({})", product.name, product.sku)))
        }
    }
}

fn product_table(products: &[Product], config: &ConfigState) -> String {
    let rows = products
        .iter()
        .map(|p| {
            vec![
                p.sku.clone(),
                p.name.clone(),
                p.barcode.clone().unwrap_or_default(),
                money(p.sale_price_cents, config),
                p.stock_qty.to_string(),
                if p.is_low_stock() { "LOW".to_string() } else { String::new() },
            ]
        })
        .collect::<Vec<_>>();
    table(&["sku", "name", "barcode", "price", "stock", ""], &rows)
}

fn describe_product(p: &Product, config: &ConfigState) -> String {
    [
        format!("{} ({})", p.name, p.sku),
        format!("Id:        {}", p.id),
        match (p.barcode.as_deref(), p.symbology()) {
            (Some(code), Some(symbology)) => format!("Barcode:   {} ({})", code, symbology),
            _ => "Barcode:   -".to_string(),
        },
        format!("Price:     {}", money(p.sale_price_cents, config)),
        format!("Cost:      {}", money(p.purchase_price_cents, config)),
        format!("Tax:       {}%", p.tax_rate()),
        format!("Stock:     {} (low at {})", p.stock_qty, p.low_stock_threshold),
        format!("Value:     {}", money(p.stock_value().cents(), config)),
    ]
    .join("\n")
}

/// `--tax`, then `VANITY_TAX_RATE`, then the store's default rate.
async fn tax_or_default(db: &Database, config: &ConfigState, tax: Option<&str>) -> ApiResult<u32> {
    if let Some(tax) = tax {
        return parse_tax(tax);
    }
    if let Some(rate) = config.tax_rate {
        return Ok(rate.bps());
    }
    Ok(db.settings().load().await?.default_tax_rate.bps())
}

/// Normalised barcode (check digit appended where it applies) and the
/// symbology it encodes in, `None` for an empty value. Without `--symbology`
/// the symbology is detected, so 13 digits must be a valid EAN-13.
fn checked_barcode(code: &str, symbology: Option<SymbologyArg>) -> ApiResult<Option<(String, Symbology)>> {
    let code = code.trim();
    if code.is_empty() {
        return Ok(None);
    }
    let symbology = symbology.unwrap_or_default().resolve(code);
    let symbol = barcode::encode(code, symbology)?;
    Ok(Some((symbol.text, symbology)))
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> ApiResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{} is required", flag)))
}

async fn add_product(db: &Database, config: &ConfigState, fields: ProductFields) -> ApiResult<Output> {
    let sku = required(&fields.sku, "--sku")?;
    let name = required(&fields.name, "--name")?;
    let price = parse_money("price", required(&fields.price, "--price")?)?;

    let category_id = match fields.category.as_deref() {
        Some(key) => Some(resolve_category(db, key).await?.id),
        None => None,
    };
    let (barcode, barcode_symbology) = match fields.barcode.as_deref() {
        Some(code) => checked_barcode(code, fields.symbology)?.unzip(),
        None if fields.symbology.is_some() => {
            return Err(ApiError::validation("--symbology needs --barcode"));
        }
        None => (None, None),
    };

    let now = Utc::now();
    let product = Product {
        id: generate_id(),
        sku: sku.to_string(),
        barcode,
        barcode_symbology,
        name: name.to_string(),
        category_id,
        purchase_price_cents: fields.cost.as_deref().map(|c| parse_money("cost", c)).transpose()?.unwrap_or(0),
        sale_price_cents: price,
        tax_rate_bps: tax_or_default(db, config, fields.tax.as_deref()).await?,
        stock_qty: 0,
        low_stock_threshold: fields
            .low_stock_threshold
            .unwrap_or(vanity_core::DEFAULT_LOW_STOCK_THRESHOLD),
        image_url: fields.image_url.filter(|u| !u.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };

    let product = db.products().insert(&product).await?;
    info!(id = %product.id, sku = %product.sku, "Product created");
    Output::new(format!("Created {} ({})", product.name, product.sku), &product)
}

async fn update_product(db: &Database, key: &str, fields: ProductFields) -> ApiResult<Output> {
    let mut product = db.products().find(key).await?;

    if let Some(sku) = fields.sku {
        product.sku = sku.trim().to_string();
    }
    if let Some(name) = fields.name {
        product.name = name.trim().to_string();
    }
    if let Some(price) = fields.price.as_deref() {
        product.sale_price_cents = parse_money("price", price)?;
    }
    if let Some(cost) = fields.cost.as_deref() {
        product.purchase_price_cents = parse_money("cost", cost)?;
    }
    if let Some(tax) = fields.tax.as_deref() {
        product.tax_rate_bps = parse_tax(tax)?;
    }
    if let Some(category) = fields.category.as_deref() {
        product.category_id = match category.trim() {
            "" => None,
            key => Some(resolve_category(db, key).await?.id),
        };
    }
    let code = match (fields.barcode.as_deref(), fields.symbology) {
        (Some(code), _) => Some(code.to_string()),
        (None, Some(_)) => Some(product.barcode.clone().ok_or_else(|| {
            ApiError::validation(format!("{} has no barcode; pass --barcode", product.sku))
        })?),
        (None, None) => None,
    };
    if let Some(code) = code {
        (product.barcode, product.barcode_symbology) = checked_barcode(&code, fields.symbology)?.unzip();
    }
    if let Some(threshold) = fields.low_stock_threshold {
        product.low_stock_threshold = threshold;
    }
    if let Some(url) = fields.image_url {
        product.image_url = Some(url).filter(|u| !u.trim().is_empty());
    }

    db.products().update(&product).await?;
    Output::new(format!("Updated {} ({})", product.name, product.sku), &product)
}

// =============================================================================
// Services
// =============================================================================

pub async fn service(db: &Database, config: &ConfigState, action: ServiceAction) -> ApiResult<Output> {
    let repo = db.services();
    match action {
        ServiceAction::List { all } => {
            let services = repo.list(!all).await?;
            let rows = services
                .iter()
                .map(|s| {
                    vec![
                        s.name.clone(),
                        money(s.price_cents, config),
                        format!("{} min", s.duration_minutes),
                        format!("{}%", s.tax_rate()),
                        if s.active { String::new() } else { "inactive".to_string() },
                    ]
                })
                .collect::<Vec<_>>();
            Output::new(table(&["name", "price", "duration", "tax", ""], &rows), &services)
        }
        ServiceAction::Add {
            name,
            price,
            duration,
            tax,
        } => {
            let now = Utc::now();
            let service = Service {
                id: generate_id(),
                name: name.trim().to_string(),
                price_cents: parse_money("price", &price)?,
                duration_minutes: duration,
                tax_rate_bps: tax_or_default(db, config, tax.as_deref()).await?,
                active: true,
                created_at: now,
                updated_at: now,
            };
            let service = repo.insert(&service).await?;
            info!(id = %service.id, name = %service.name, "Service created");
            Output::new(format!("Created service {}", service.name), &service)
        }
        ServiceAction::Update {
            key,
            name,
            price,
            duration,
            tax,
        } => {
            let mut service = repo.find(&key).await?;
            if let Some(name) = name {
                service.name = name.trim().to_string();
            }
            if let Some(price) = price.as_deref() {
                service.price_cents = parse_money("price", price)?;
            }
            if let Some(duration) = duration {
                service.duration_minutes = duration;
            }
            if let Some(tax) = tax.as_deref() {
                service.tax_rate_bps = parse_tax(tax)?;
            }
            repo.update(&service).await?;
            Output::new(format!("Updated service {}", service.name), &service)
        }
        ServiceAction::Toggle { key } => {
            let service = repo.find(&key).await?;
            let active = repo.toggle_active(&service.id).await?;
            let state = if active { "active" } else { "inactive" };
            Output::new(
                format!("{} is now {}", service.name, state),
                &serde_json::json!({ "id": service.id, "active": active }),
            )
        }
        ServiceAction::Delete { key } => {
            let service = repo.find(&key).await?;
            repo.delete(&service.id).await?;
            Ok(Output::message(format!("Deleted service {}", service.name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::harness;
    use crate::error::ErrorCode;

    fn fields(sku: &str, name: &str, price: &str) -> ProductFields {
        ProductFields {
            sku: Some(sku.into()),
            name: Some(name.into()),
            price: Some(price.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_product_with_category_and_barcode() {
        let h = harness().await;
        category(
            &h.db,
            CategoryAction::Add {
                name: "Hair Care".into(),
                description: None,
            },
        )
        .await
        .unwrap();

        let mut f = fields("SH-200", "Shampoo 200ml", "249.50");
        f.cost = Some("120".into());
        f.category = Some("hair care".into());
        f.barcode = Some("5901234123457".into());
        let out = product(&h.db, &h.config, ProductAction::Add { fields: f }).await.unwrap();

        assert_eq!(out.data["sale_price_cents"], 24950);
        assert_eq!(out.data["purchase_price_cents"], 12000);
        assert_eq!(out.data["tax_rate_bps"], 1800);
        assert_eq!(out.data["stock_qty"], 0);
        assert_eq!(out.data["barcode_symbology"], "EAN13");
        assert!(out.data["category_id"].is_string());

        let shown = product(&h.db, &h.config, ProductAction::Show { key: "5901234123457".into() })
            .await
            .unwrap();
        assert!(shown.text.contains("Shampoo 200ml (SH-200)"));
        assert!(shown.text.contains("₹249.50"));
        assert!(shown.text.contains("5901234123457 (EAN13)"));
    }

    #[tokio::test]
    async fn test_product_barcode_symbology() {
        let h = harness().await;

        // valid UPC-A check digit, kept as CODE128 when asked
        let mut f = fields("TON-1", "Rose Toner", "299");
        f.barcode = Some("036000291452".into());
        f.symbology = Some(SymbologyArg::Code128);
        let out = product(&h.db, &h.config, ProductAction::Add { fields: f }).await.unwrap();
        assert_eq!(out.data["barcode_symbology"], "CODE128");

        let update = ProductFields {
            symbology: Some(SymbologyArg::Upc),
            ..Default::default()
        };
        let out = product(&h.db, &h.config, ProductAction::Update { key: "TON-1".into(), fields: update })
            .await
            .unwrap();
        assert_eq!(out.data["barcode"], "036000291452");
        assert_eq!(out.data["barcode_symbology"], "UPC");

        let update = ProductFields {
            barcode: Some("590123412345".into()),
            symbology: Some(SymbologyArg::Ean13),
            ..Default::default()
        };
        let out = product(&h.db, &h.config, ProductAction::Update { key: "TON-1".into(), fields: update })
            .await
            .unwrap();
        assert_eq!(out.data["barcode"], "5901234123457");

        let mut f = fields("TON-2", "Mint Toner", "299");
        f.symbology = Some(SymbologyArg::Ean13);
        let err = product(&h.db, &h.config, ProductAction::Add { fields: f }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut f = fields("TON-2", "Mint Toner", "299");
        f.barcode = Some("TONER-2".into());
        f.symbology = Some(SymbologyArg::Upc);
        let err = product(&h.db, &h.config, ProductAction::Add { fields: f }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BarcodeError);
    }

    #[tokio::test]
    async fn test_add_product_rejects_bad_input() {
        let h = harness().await;

        let mut f = fields("SH-1", "Shampoo", "249");
        f.sku = None;
        let err = product(&h.db, &h.config, ProductAction::Add { fields: f }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut f = fields("SH-1", "Shampoo", "249");
        f.barcode = Some("5901234123450".into());
        let err = product(&h.db, &h.config, ProductAction::Add { fields: f }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BarcodeError);
        assert_eq!(h.db.products().count().await.unwrap(), 0);

        product(&h.db, &h.config, ProductAction::Add { fields: fields("SH-1", "Shampoo", "249") })
            .await
            .unwrap();
        let err = product(&h.db, &h.config, ProductAction::Add { fields: fields("SH-1", "Other", "10") })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);
    }

    #[tokio::test]
    async fn test_update_and_search_products() {
        let h = harness().await;
        product(&h.db, &h.config, ProductAction::Add { fields: fields("GEL-1", "Hair Gel", "99") })
            .await
            .unwrap();

        let update = ProductFields {
            price: Some("109".into()),
            tax: Some("12".into()),
            barcode: Some("GEL-ONE".into()),
            ..Default::default()
        };
        let out = product(&h.db, &h.config, ProductAction::Update { key: "GEL-1".into(), fields: update })
            .await
            .unwrap();
        assert_eq!(out.data["sale_price_cents"], 10900);
        assert_eq!(out.data["tax_rate_bps"], 1200);

        let out = product(
            &h.db,
            &h.config,
            ProductAction::List {
                query: Some("gel".into()),
                limit: 50,
                with_barcodes: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(out.data.as_array().unwrap().len(), 1);
        assert!(out.text.contains("GEL-ONE"));

        let clear = ProductFields {
            barcode: Some(String::new()),
            ..Default::default()
        };
        product(&h.db, &h.config, ProductAction::Update { key: "GEL-1".into(), fields: clear })
            .await
            .unwrap();
        let found = h.db.products().find("GEL-1").await.unwrap();
        assert!(found.barcode.is_none());
    }

    #[tokio::test]
    async fn test_service_lifecycle() {
        let h = harness().await;
        let out = service(
            &h.db,
            &h.config,
            ServiceAction::Add {
                name: "Facial".into(),
                price: "1200".into(),
                duration: 60,
                tax: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(out.data["price_cents"], 120000);
        assert_eq!(out.data["tax_rate_bps"], 1800);

        let out = service(&h.db, &h.config, ServiceAction::Toggle { key: "facial".into() })
            .await
            .unwrap();
        assert_eq!(out.data["active"], false);

        let listed = service(&h.db, &h.config, ServiceAction::List { all: false }).await.unwrap();
        assert!(listed.data.as_array().unwrap().is_empty());
        let listed = service(&h.db, &h.config, ServiceAction::List { all: true }).await.unwrap();
        assert!(listed.text.contains("inactive"));

        service(&h.db, &h.config, ServiceAction::Delete { key: "Facial".into() })
            .await
            .unwrap();
        let err = service(&h.db, &h.config, ServiceAction::Toggle { key: "Facial".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
