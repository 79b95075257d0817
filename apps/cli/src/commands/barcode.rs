//! # Barcode Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  vanity barcode encode 1234             → mode C, values [12, 34], 82  │
//! │  vanity barcode checksum 123456789012   → 8, full code 1234567890128   │
//! │  vanity barcode png 5901234123457       → barcode-5901234123457.png    │
//! │  vanity barcode png --product SH-200    → barcode-SH-200-{code}.png    │
//! │  vanity barcode svg HELLO               → <svg ...> on stdout          │
//! │  vanity barcode label SH-200            → 80x40 mm HTML label          │
//! │  vanity barcode sheet -o labels.html    → every product with a code    │
//! │  vanity barcode assign SH-200 -s ean13  → fresh unique EAN-13          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};
use vanity_core::barcode::code128::{self, CharsetPolicy};
use vanity_core::barcode::label::{render_label_html, render_label_sheet, LabelContent};
use vanity_core::barcode::{self, random_code, render_png, render_svg, LabelLayout};
use vanity_core::{EncodedSymbol, Symbology};
use vanity_db::Database;

use super::{write_file, Output};
use crate::cli::{BarcodeAction, LayoutArgs, SymbologyArg};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::ConfigState;

/// Attempts at finding a code no product uses yet.
const MAX_GENERATE_ATTEMPTS: usize = 20;

pub async fn run(db: &Database, config: &ConfigState, action: BarcodeAction) -> ApiResult<Output> {
    match action {
        BarcodeAction::Encode {
            payload,
            symbology,
            skip_invalid,
        } => encode(&payload, symbology, skip_invalid),
        BarcodeAction::Checksum { payload, symbology } => checksum(&payload, symbology),
        BarcodeAction::Png {
            payload,
            product,
            symbology,
            out,
            layout,
        } => match (product, payload) {
            (Some(key), _) => product_png(db, &key, out, &layout).await,
            (None, Some(payload)) => png(&payload, symbology, out, &layout),
            (None, None) => Err(ApiError::validation("Give a payload or --product")),
        },
        BarcodeAction::Svg {
            payload,
            symbology,
            out,
            layout,
        } => svg(&payload, symbology, out, &layout),
        BarcodeAction::Label { product, out } => label(db, config, &product, out).await,
        BarcodeAction::Sheet { out } => sheet(db, config, out).await,
        BarcodeAction::Generate { symbology, count, seed } => {
            let mut rng = rng(seed);
            let codes: Vec<String> = (0..count)
                .map(|_| random_code(symbology.for_generation(), &mut rng))
                .collect();
            Output::new(codes.join("\n"), &codes)
        }
        BarcodeAction::Assign {
            product,
            code,
            symbology,
        } => assign(db, &product, code, symbology, None).await,
        BarcodeAction::Clear { product } => {
            let product = db.products().find(&product).await?;
            db.products().clear_barcode(&product.id).await?;
            Ok(Output::message(format!("Barcode removed from {}", product.sku)))
        }
    }
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn layout(args: &LayoutArgs) -> ApiResult<LabelLayout> {
    if args.scale == 0 {
        return Err(ApiError::validation("--scale must be at least 1"));
    }
    let mut layout = LabelLayout::default();
    if let Some(w) = args.module_width {
        layout = layout.with_module_width(w);
    }
    if let Some(h) = args.bar_height {
        layout = layout.with_bar_height(h);
    }
    Ok(layout.with_text(!args.no_text).scaled(args.scale))
}

// =============================================================================
// Encoding
// =============================================================================

#[derive(Debug, Serialize)]
struct ChecksumResult {
    symbology: Symbology,
    checksum: u8,
    full_code: String,
}

fn encode(payload: &str, symbology: SymbologyArg, skip_invalid: bool) -> ApiResult<Output> {
    let symbology = symbology.resolve(payload);
    let symbol = match symbology {
        Symbology::Code128 if skip_invalid => code128::encode_with(payload, CharsetPolicy::SkipAndWarn)?,
        _ => barcode::encode(payload, symbology)?,
    };

    Output::new(describe(&symbol), &symbol)
}

fn describe(symbol: &EncodedSymbol) -> String {
    let mut lines = vec![
        format!("Symbology: {}", symbol.symbology),
        format!("Text:      {}", symbol.text),
    ];
    if let Some(mode) = symbol.mode {
        lines.push(format!("Code set:  {:?}", mode));
    }
    lines.push(format!("Values:    {:?}", symbol.units));
    lines.push(format!("Checksum:  {}", symbol.checksum));
    lines.push(format!("Modules:   {}", symbol.len()));
    if !symbol.skipped.is_empty() {
        lines.push(format!("Skipped:   {:?}", symbol.skipped));
    }
    lines.push(symbol.bit_string());
    lines.join("\n")
}

fn checksum(payload: &str, symbology: SymbologyArg) -> ApiResult<Output> {
    let symbology = symbology.resolve(payload);
    let result = ChecksumResult {
        symbology,
        checksum: barcode::checksum(payload, symbology)?,
        full_code: barcode::full_code(payload, symbology)?,
    };
    let text = match symbology {
        Symbology::Code128 => format!("Checksum value: {}", result.checksum),
        _ => format!("Check digit: {}\nFull code:   {}", result.checksum, result.full_code),
    };
    Output::new(text, &result)
}

// =============================================================================
// Images
// =============================================================================

#[derive(Debug, Serialize)]
struct ImageResult {
    path: PathBuf,
    width: u32,
    height: u32,
    symbology: Symbology,
    text: String,
}

/// `out` as given, or `default_name` (inside `out` when it is a directory).
fn png_path(out: Option<PathBuf>, default_name: String) -> PathBuf {
    match out {
        Some(dir) if dir.is_dir() => dir.join(default_name),
        Some(path) => path,
        None => PathBuf::from(default_name),
    }
}

fn png(payload: &str, symbology: SymbologyArg, out: Option<PathBuf>, args: &LayoutArgs) -> ApiResult<Output> {
    let layout = layout(args)?;
    let symbol = barcode::encode(payload, symbology.resolve(payload))?;
    let path = png_path(out, barcode::download_filename(None, &symbol.text));
    write_png(symbol, &layout, path)
}

async fn product_png(db: &Database, key: &str, out: Option<PathBuf>, args: &LayoutArgs) -> ApiResult<Output> {
    let layout = layout(args)?;
    let product = db.products().find(key).await?;
    let content = LabelContent::for_product(&product).ok_or_else(|| no_barcode(&product.sku))?;

    let symbol = barcode::encode(&content.code, content.symbology)?;
    let path = png_path(out, barcode::download_filename(Some(&product.sku), &symbol.text));
    write_png(symbol, &layout, path)
}

fn write_png(symbol: EncodedSymbol, layout: &LabelLayout, path: PathBuf) -> ApiResult<Output> {
    let (width, height) = layout.canvas_size(&symbol)?;
    let bytes = render_png(&symbol, layout)?;

    write_file(&path, &bytes)?;
    info!(path = %path.display(), width, height, "PNG written");

    let result = ImageResult {
        path,
        width,
        height,
        symbology: symbol.symbology,
        text: symbol.text,
    };
    Output::new(
        format!("Wrote {} ({}x{})", result.path.display(), width, height),
        &result,
    )
}

fn svg(payload: &str, symbology: SymbologyArg, out: Option<PathBuf>, args: &LayoutArgs) -> ApiResult<Output> {
    let layout = layout(args)?;
    let symbol = barcode::encode(payload, symbology.resolve(payload))?;
    let svg = render_svg(&symbol, &layout)?;
    emit_document(svg, out)
}

/// Writes a text document to `out`, or returns it for stdout.
fn emit_document(document: String, out: Option<PathBuf>) -> ApiResult<Output> {
    match out {
        Some(path) => {
            write_file(&path, document.as_bytes())?;
            Ok(Output::message(format!("Wrote {}", path.display())))
        }
        None => Output::new(document.clone(), &serde_json::json!({ "document": document })),
    }
}

// =============================================================================
// Labels
// =============================================================================

async fn label(db: &Database, config: &ConfigState, key: &str, out: Option<PathBuf>) -> ApiResult<Output> {
    let product = db.products().find(key).await?;
    let content = LabelContent::for_product(&product).ok_or_else(|| no_barcode(&product.sku))?;

    let html = render_label_html(&content, &config.currency_symbol, &LabelLayout::default())?;
    emit_document(html, out)
}

fn no_barcode(sku: &str) -> ApiError {
    ApiError::new(
        ErrorCode::BusinessLogic,
        format!("{} has no barcode; run `vanity barcode assign {}` first", sku, sku),
    )
}

async fn sheet(db: &Database, config: &ConfigState, out: Option<PathBuf>) -> ApiResult<Output> {
    let products = db.products().list_with_barcodes().await?;
    let contents: Vec<LabelContent> = products.iter().filter_map(LabelContent::for_product).collect();
    if contents.is_empty() {
        return Err(ApiError::new(ErrorCode::BusinessLogic, "No products have a barcode"));
    }

    let html = render_label_sheet(&contents, &config.currency_symbol, &LabelLayout::default())?;
    info!(labels = contents.len(), "Label sheet rendered");
    emit_document(html, out)
}

// =============================================================================
// Assignment
// =============================================================================

/// Stores `code` (or a fresh unique one) as the product's barcode.
pub(crate) async fn assign(
    db: &Database,
    key: &str,
    code: Option<String>,
    symbology: SymbologyArg,
    seed: Option<u64>,
) -> ApiResult<Output> {
    let product = db.products().find(key).await?;

    let (code, symbology) = match code {
        Some(code) => {
            let symbology = symbology.resolve(&code);
            (code, symbology)
        }
        None => {
            let symbology = symbology.for_generation();
            (unused_code(db, symbology, &mut rng(seed)).await?, symbology)
        }
    };

    let stored = db.products().assign_barcode(&product.id, &code, symbology).await?;
    Output::new(
        format!("Assigned {} {} to {}", symbology, stored, product.sku),
        &serde_json::json!({
            "productId": product.id,
            "sku": product.sku,
            "barcode": stored,
            "symbology": symbology,
        }),
    )
}

async fn unused_code<R: Rng>(db: &Database, symbology: Symbology, rng: &mut R) -> ApiResult<String> {
    for _ in 0..MAX_GENERATE_ATTEMPTS {
        let candidate = random_code(symbology, rng);
        if !db.products().barcode_exists(&candidate).await? {
            return Ok(candidate);
        }
        warn!(code = %candidate, "Generated barcode already in use, retrying");
    }
    Err(ApiError::internal("Could not generate an unused barcode"))
}
