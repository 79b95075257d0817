//! # Vanity POS Entry Point
//!
//! ```text
//! $ vanity product add --sku SH-200 --name "Shampoo 200ml" --price 249
//! $ vanity barcode assign SH-200 -s ean13
//! $ vanity stock purchase SH-200 24 --cost 120
//! $ vanity bill scan 8901234567892
//! $ vanity bill checkout --pay upi
//! $ vanity report sales --from 2026-10-01 --to 2026-10-31
//! ```
//!
//! The setup lives in lib.rs so commands can be tested without a process.

use std::process::ExitCode;

use clap::Parser;
use vanity_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    vanity_cli::init_tracing();
    vanity_cli::run(cli).await
}
