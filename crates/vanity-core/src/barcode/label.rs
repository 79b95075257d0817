//! # Printable Labels
//!
//! HTML shelf/product labels sized for an 80 mm × 40 mm thermal roll.
//!
//! ```text
//! ┌──────────────────────────────── 80mm ─┐
//! │            ROSE HAND CREAM            │
//! │   ▌▌█▌▌█▌█▌▌▌██▌▌▌█▌▌▌█▌▌█▌█▌█▌▌      │ 40mm
//! │              SHAM-200                 │
//! │               ₹249.00                 │
//! └───────────────────────────────────────┘
//! ```
//!
//! The barcode is embedded as a PNG `data:` URL so the page prints without
//! any file access.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::render::{escape_xml, png_data_url};
use super::{encode, render_png, BarcodeResult, LabelLayout, Symbology};
use crate::money::Money;
use crate::types::Product;

/// Everything printed on one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelContent {
    pub name: String,
    pub code: String,
    pub symbology: Symbology,
    pub price: Money,
}

impl LabelContent {
    /// Label for a product, or `None` when it has no barcode. Uses the
    /// symbology the barcode was assigned with.
    pub fn for_product(product: &Product) -> Option<Self> {
        let symbology = product.symbology()?;
        Some(LabelContent {
            name: product.name.clone(),
            code: product.barcode.as_deref()?.trim().to_string(),
            symbology,
            price: product.sale_price(),
        })
    }
}

const STYLE: &str = "@page { size: 80mm 40mm; margin: 0; }\
body { margin: 0; font-family: Arial, sans-serif; }\
.label { width: 80mm; height: 40mm; box-sizing: border-box; padding: 2mm; \
display: flex; flex-direction: column; align-items: center; justify-content: center; \
page-break-after: always; }\
.label:last-child { page-break-after: auto; }\
.name { font-size: 10pt; font-weight: bold; text-transform: uppercase; \
white-space: nowrap; overflow: hidden; max-width: 76mm; }\
.barcode { max-width: 76mm; max-height: 24mm; }\
.price { font-size: 12pt; font-weight: bold; }";

fn label_block(content: &LabelContent, currency_symbol: &str, layout: &LabelLayout) -> BarcodeResult<String> {
    let symbol = encode(&content.code, content.symbology)?;
    let png = render_png(&symbol, layout)?;

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="label"><div class="name">{}</div><img class="barcode" src="{}" alt="{}"/><div class="price">{}</div></div>"#,
        escape_xml(&content.name.to_uppercase()),
        png_data_url(&png),
        escape_xml(&symbol.text),
        escape_xml(&content.price.format_with_symbol(currency_symbol)),
    );
    Ok(html)
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>{}</body></html>",
        escape_xml(title),
        STYLE,
        body
    )
}

/// One printable label page.
pub fn render_label_html(
    content: &LabelContent,
    currency_symbol: &str,
    layout: &LabelLayout,
) -> BarcodeResult<String> {
    let block = label_block(content, currency_symbol, layout)?;
    Ok(document(&format!("Label - {}", content.name), &block))
}

/// One document with a label page per entry, in order.
pub fn render_label_sheet(
    contents: &[LabelContent],
    currency_symbol: &str,
    layout: &LabelLayout,
) -> BarcodeResult<String> {
    let mut body = String::new();
    for content in contents {
        body.push_str(&label_block(content, currency_symbol, layout)?);
    }
    Ok(document("Barcode labels", &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::BarcodeError;

    fn content(code: &str) -> LabelContent {
        LabelContent {
            name: "Rose Hand Cream".to_string(),
            code: code.to_string(),
            symbology: Symbology::Code128,
            price: Money::from_cents(24900),
        }
    }

    #[test]
    fn test_single_label() {
        let html = render_label_html(&content("SHAM-200"), "₹", &LabelLayout::default()).unwrap();
        assert!(html.contains("size: 80mm 40mm"));
        assert!(html.contains("ROSE HAND CREAM"));
        assert!(html.contains("src=\"data:image/png;base64,"));
        assert!(html.contains("₹249.00"));
    }

    #[test]
    fn test_sheet_has_one_block_per_label() {
        let labels = vec![content("A-1"), content("B-2"), content("C-3")];
        let html = render_label_sheet(&labels, "Rs ", &LabelLayout::default()).unwrap();
        assert_eq!(html.matches("class=\"label\"").count(), 3);
        assert!(html.contains("Rs 249.00"));
    }

    #[test]
    fn test_bad_code_fails_whole_sheet() {
        let labels = vec![content("A-1"), content("")];
        assert_eq!(
            render_label_sheet(&labels, "₹", &LabelLayout::default()).unwrap_err(),
            BarcodeError::EmptyPayload
        );
    }

    #[test]
    fn test_product_label_keeps_assigned_symbology() {
        let now = chrono::Utc::now();
        let mut product = Product {
            id: "p1".to_string(),
            sku: "HC-1".to_string(),
            barcode: Some("698292245072".to_string()),
            barcode_symbology: Some(Symbology::Code128),
            name: "Rose Hand Cream".to_string(),
            category_id: None,
            purchase_price_cents: 12000,
            sale_price_cents: 24900,
            tax_rate_bps: 1800,
            stock_qty: 5,
            low_stock_threshold: 2,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        // the code's last digit is a valid UPC-A check digit
        assert_eq!(crate::barcode::detect_symbology("698292245072"), Symbology::Upc);

        let label = LabelContent::for_product(&product).unwrap();
        assert_eq!(label.symbology, Symbology::Code128);
        assert_eq!(label.code, "698292245072");

        product.barcode = None;
        assert!(LabelContent::for_product(&product).is_none());
    }

    #[test]
    fn test_name_is_escaped() {
        let mut c = content("X1");
        c.name = "<b>Gel</b>".to_string();
        let html = render_label_html(&c, "₹", &LabelLayout::default()).unwrap();
        assert!(html.contains("&lt;B&gt;GEL&lt;/B&gt;"));
        assert!(!html.contains("<b>"));
    }
}
