//! # State Module
//!
//! Each command takes only the state it needs instead of one big
//! `AppState`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   Database   │  │  CartState   │  │   ConfigState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │  SQLite pool │  │  Mutex<Cart> │  │  db / cart path  │              │
//! │  │  + repos     │  │  cart.json   │  │  currency, tax   │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  • Database: internal connection pool                                  │
//! │  • CartState: saved to disk after every successful change              │
//! │  • ConfigState: read-only after startup                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;

pub use cart::CartState;
pub use config::ConfigState;
