//! # Vanity CLI Library
//!
//! Everything behind the `vanity` binary; `main.rs` only parses arguments
//! and calls [`run`].
//!
//! ## Module Organization
//! ```text
//! vanity_cli/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── cart.rs     ◄─── Open bill, persisted as cart.json
//! │   └── config.rs   ◄─── VANITY_* environment
//! ├── commands/       ◄─── One module per command group
//! └── error.rs        ◄─── ApiError, exit codes
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()           RUST_LOG, logs to stderr                  │
//! │  2. ConfigState::from_env()  --db wins over VANITY_DB_PATH            │
//! │  3. Database::new()          creates the file, runs migrations         │
//! │  4. CartState::load()        open bill from the last invocation        │
//! │  5. commands::dispatch()     → Output or ApiError                      │
//! │  6. print, exit 0 / 1 (rejected) / 2 (database, IO, internal)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use std::process::ExitCode;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use error::{ApiError, ApiResult};
use state::{CartState, ConfigState};
use vanity_db::{Database, DbConfig};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=vanity=trace` - Show trace for vanity crates only
/// - Default: warnings only
///
/// Logs go to stderr so stdout stays clean for `--json` and piped output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one command and prints its result.
pub async fn run(cli: Cli) -> ExitCode {
    let json = cli.json;
    match execute(cli).await.and_then(|output| output.render(json)) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_error(&err, json);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn execute(cli: Cli) -> ApiResult<commands::Output> {
    let mut config = ConfigState::from_env();
    if let Some(path) = cli.db {
        config = config.with_db_path(path);
    }
    debug!(db = %config.db_path.display(), cart = %config.cart_path.display(), "Configuration resolved");

    if let Some(dir) = config.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ApiError::io(dir, e))?;
    }
    let db = Database::new(DbConfig::new(&config.db_path)).await?;
    info!(path = %config.db_path.display(), "Database ready");

    let cart = CartState::load(&config.cart_path);
    let result = commands::dispatch(cli.command, &db, &config, &cart).await;

    db.close().await;
    result
}

fn report_error(err: &ApiError, json: bool) {
    if json {
        match serde_json::to_string_pretty(err) {
            Ok(body) => println!("{}", body),
            Err(_) => eprintln!("{}", err),
        }
    } else {
        eprintln!("{}", err);
    }
}
