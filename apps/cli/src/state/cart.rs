//! # Cart State
//!
//! The open bill. A CLI process ends after every command, so the cart is
//! kept as JSON next to the database and reloaded on the next call.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Operator                 Command                 Cart State Change     │
//! │  ────────                 ───────                 ─────────────────     │
//! │                                                                         │
//! │  Scan label ─────────────► bill scan ───────────► +1 of the product    │
//! │                                                                         │
//! │  Type SKU / service ─────► bill add ────────────► merge or push line   │
//! │                                                                         │
//! │  Change quantity ────────► bill qty ────────────► line.qty = n (0 rm)  │
//! │                                                                         │
//! │  Discount ───────────────► bill discount ───────► 10% or fixed amount  │
//! │                                                                         │
//! │  Pay ────────────────────► bill checkout ───────► invoice; cart reset  │
//! │                                                                         │
//! │  Every write goes through with_cart_mut(), which saves cart.json.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};
use vanity_core::Cart;

use crate::error::{ApiError, ApiResult};

/// Cart persisted at `path`.
#[derive(Debug)]
pub struct CartState {
    path: PathBuf,
    cart: Mutex<Cart>,
}

impl CartState {
    /// Loads the saved cart, or starts an empty one.
    ///
    /// An unreadable file is logged and replaced by an empty cart rather
    /// than blocking billing.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cart = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Discarding unreadable cart");
                Cart::new()
            }),
            Err(_) => Cart::new(),
        };

        CartState {
            path,
            cart: Mutex::new(cart),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Executes a fallible change and saves the cart when it succeeds.
    ///
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| Ok(cart.add_product(&product, 1)?))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> ApiResult<R>
    where
        F: FnOnce(&mut Cart) -> ApiResult<R>,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        let mut draft = cart.clone();
        let result = f(&mut draft)?;
        self.save(&draft)?;
        *cart = draft;
        Ok(result)
    }

    fn save(&self, cart: &Cart) -> ApiResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ApiError::io(dir, e))?;
        }
        let json = serde_json::to_string_pretty(cart)?;
        fs::write(&self.path, json).map_err(|e| ApiError::io(&self.path, e))?;
        debug!(path = %self.path.display(), lines = cart.item_count(), "Cart saved");
        Ok(())
    }
}
