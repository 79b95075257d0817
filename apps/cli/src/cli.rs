//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vanity_core::Symbology;

/// Vanity POS: barcodes, stock and billing for a beauty parlour counter.
#[derive(Parser, Debug)]
#[command(name = "vanity", version, about)]
pub struct Cli {
    /// SQLite database file (default: platform data directory).
    #[arg(long, global = true, env = "VANITY_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode, render and print barcodes.
    Barcode {
        #[command(subcommand)]
        action: BarcodeAction,
    },
    /// Product categories.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Stocked products.
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Salon services.
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Customers and their history.
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Stock entries and movement history.
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    /// The open bill, checkout and invoices.
    Bill {
        #[command(subcommand)]
        action: BillAction,
    },
    /// Sales reports and CSV export.
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
    /// Store settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

// =============================================================================
// Barcode
// =============================================================================

/// Symbology as typed on the command line; `auto` guesses from the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SymbologyArg {
    #[default]
    Auto,
    Code128,
    Ean13,
    Upc,
}

impl SymbologyArg {
    pub fn resolve(self, code: &str) -> Symbology {
        match self {
            SymbologyArg::Auto => vanity_core::barcode::detect_symbology(code),
            SymbologyArg::Code128 => Symbology::Code128,
            SymbologyArg::Ean13 => Symbology::Ean13,
            SymbologyArg::Upc => Symbology::Upc,
        }
    }

    /// Symbology for newly generated codes (`auto` means CODE128).
    pub fn for_generation(self) -> Symbology {
        self.resolve("")
    }
}

/// Image geometry flags shared by the rendering commands.
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Module (narrowest bar) width in pixels.
    #[arg(long)]
    pub module_width: Option<u32>,

    /// Bar height in pixels.
    #[arg(long)]
    pub bar_height: Option<u32>,

    /// Multiply every dimension (print resolution).
    #[arg(long, default_value_t = 1)]
    pub scale: u32,

    /// Leave out the human-readable text.
    #[arg(long)]
    pub no_text: bool,
}

#[derive(Subcommand, Debug)]
pub enum BarcodeAction {
    /// Show the encoded symbol: mode, values, checksum and bits.
    Encode {
        payload: String,
        #[arg(short, long, value_enum, default_value_t)]
        symbology: SymbologyArg,
        /// Drop characters CODE128 cannot encode instead of failing.
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Check digit (EAN-13 / UPC-A) or mod-103 checksum (CODE128).
    Checksum {
        payload: String,
        #[arg(short, long, value_enum, default_value_t)]
        symbology: SymbologyArg,
    },
    /// Write a PNG image of a code, or of a product's barcode.
    Png {
        #[arg(required_unless_present = "product")]
        payload: Option<String>,
        /// Product id, SKU or barcode; prints its stored code and symbology.
        #[arg(long, conflicts_with_all = ["payload", "symbology"])]
        product: Option<String>,
        #[arg(short, long, value_enum, default_value_t)]
        symbology: SymbologyArg,
        /// Output file or directory (default name: barcode-{code}.png, or
        /// barcode-{sku}-{code}.png with --product).
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Write an SVG image (stdout without --out).
    Svg {
        payload: String,
        #[arg(short, long, value_enum, default_value_t)]
        symbology: SymbologyArg,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Printable 80x40 mm HTML label for one product.
    Label {
        /// Product id, SKU or barcode.
        product: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// One HTML document with a label per product that has a barcode.
    Sheet {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print random valid codes.
    Generate {
        #[arg(short, long, value_enum, default_value_t)]
        symbology: SymbologyArg,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// RNG seed, for reproducible codes.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Set a product's barcode; a fresh unique one is generated without --code.
    Assign {
        product: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long, value_enum, default_value_t)]
        symbology: SymbologyArg,
    },
    /// Remove a product's barcode.
    Clear { product: String },
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    List,
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProductFields {
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    /// Sale price, e.g. 249 or 249.50
    #[arg(long)]
    pub price: Option<String>,
    /// Purchase price
    #[arg(long)]
    pub cost: Option<String>,
    /// Tax rate in percent
    #[arg(long)]
    pub tax: Option<String>,
    /// Category id or name
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub barcode: Option<String>,
    /// Symbology of --barcode (default: detected from the code)
    #[arg(long, value_enum)]
    pub symbology: Option<SymbologyArg>,
    #[arg(long)]
    pub low_stock_threshold: Option<i64>,
    #[arg(long)]
    pub image_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ProductAction {
    /// List or search products.
    List {
        /// Matches name, SKU or barcode.
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
        /// Only products with a barcode.
        #[arg(long)]
        with_barcodes: bool,
    },
    /// Show one product by id, SKU or barcode.
    Show { key: String },
    Add {
        #[command(flatten)]
        fields: ProductFields,
    },
    Update {
        key: String,
        #[command(flatten)]
        fields: ProductFields,
    },
    Delete { key: String },
}

#[derive(Subcommand, Debug)]
pub enum ServiceAction {
    List {
        /// Include inactive services.
        #[arg(long)]
        all: bool,
    },
    Add {
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long, default_value_t = 30)]
        duration: i64,
        #[arg(long)]
        tax: Option<String>,
    },
    Update {
        key: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        duration: Option<i64>,
        #[arg(long)]
        tax: Option<String>,
    },
    /// Switch a service on or off.
    Toggle { key: String },
    Delete { key: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CustomerFields {
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum CustomerAction {
    /// Customers with invoice count and total spent.
    List {
        #[arg(short, long)]
        query: Option<String>,
    },
    Add {
        name: String,
        #[command(flatten)]
        fields: CustomerFields,
    },
    Update {
        id: String,
        name: String,
        #[command(flatten)]
        fields: CustomerFields,
    },
    Delete { id: String },
    /// The customer's invoices, newest first.
    History { id: String },
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum StockAction {
    /// Goods received: adds stock, optionally at a new purchase price.
    Purchase {
        product: String,
        quantity: i64,
        #[arg(long)]
        cost: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Manual correction; negative quantities remove stock.
    Adjust {
        product: String,
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Movements, newest first.
    History {
        #[arg(long)]
        product: Option<String>,
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },
    /// Products at or below their low-stock threshold.
    Low,
    /// Stock value at purchase price.
    Value,
}

// =============================================================================
// Billing
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum BillAction {
    /// Show the open bill.
    Show,
    /// Add a product by id, SKU or barcode.
    Add {
        product: String,
        #[arg(short, long, default_value_t = 1)]
        qty: i64,
    },
    /// Add one unit of the product with this exact barcode.
    Scan { code: String },
    /// Add a service by id or name.
    Service {
        service: String,
        #[arg(short, long, default_value_t = 1)]
        qty: i64,
    },
    /// Set a line's quantity (line number, item id or name); 0 removes it.
    Qty { line: String, qty: i64 },
    Remove { line: String },
    /// `10%`, a fixed amount like `50`, or `none`.
    Discount { value: String },
    Clear,
    /// Turn the open bill into an invoice.
    Checkout {
        /// Customer id or phone number.
        #[arg(long)]
        customer: Option<String>,
        /// Walk-in customer name.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// cash, card or upi
        #[arg(long, default_value = "cash")]
        pay: String,
    },
    /// List invoices, newest first.
    List {
        /// First day, YYYY-MM-DD.
        #[arg(long)]
        from: Option<String>,
        /// Last day, YYYY-MM-DD.
        #[arg(long)]
        to: Option<String>,
        #[arg(short, long)]
        query: Option<String>,
        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// One invoice with its lines, by id or number.
    Invoice { key: String },
}

// =============================================================================
// Reports & Settings
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum ReportAction {
    /// Sales, tax, profit and best sellers for a date range (default today).
    Sales {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Write the report as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Every invoice in the range as CSV.
    Invoices {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    List,
    Get { key: String },
    Set { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_barcode_png() {
        let cli = Cli::try_parse_from([
            "vanity", "--json", "barcode", "png", "5901234123457", "-s", "ean13", "--scale", "2", "--no-text",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Barcode {
                action: BarcodeAction::Png { payload, product, symbology, layout, out },
            } => {
                assert_eq!(payload.as_deref(), Some("5901234123457"));
                assert!(product.is_none());
                assert_eq!(symbology, SymbologyArg::Ean13);
                assert_eq!(layout.scale, 2);
                assert!(layout.no_text);
                assert!(out.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_product_png() {
        let cli = Cli::try_parse_from(["vanity", "barcode", "png", "--product", "SH-200"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Barcode {
                action: BarcodeAction::Png { payload: None, product: Some(_), .. }
            }
        ));

        assert!(Cli::try_parse_from(["vanity", "barcode", "png"]).is_err());
        assert!(Cli::try_parse_from(["vanity", "barcode", "png", "123", "--product", "SH-200"]).is_err());
    }

    #[test]
    fn test_negative_adjustment() {
        let cli = Cli::try_parse_from(["vanity", "stock", "adjust", "SH-1", "-3"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Stock { action: StockAction::Adjust { quantity: -3, .. } }
        ));
    }

    #[test]
    fn test_symbology_resolution() {
        assert_eq!(SymbologyArg::Auto.resolve("5901234123457"), Symbology::Ean13);
        assert_eq!(SymbologyArg::Auto.resolve("HELLO"), Symbology::Code128);
        assert_eq!(SymbologyArg::Upc.resolve("HELLO"), Symbology::Upc);
        assert_eq!(SymbologyArg::Auto.for_generation(), Symbology::Code128);
    }
}
