//! # Billing Cart
//!
//! In-memory bill being assembled at the counter: product and service lines,
//! an optional discount, and the totals that go onto the invoice.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator Action            Cart Method              Effect             │
//! │  ───────────────            ───────────              ──────             │
//! │  Scan / pick product ─────► add_product()  ────────► line += qty        │
//! │  Pick service ────────────► add_service()  ────────► line += qty        │
//! │  Change quantity ─────────► update_quantity() ─────► qty = n (0 drops)  │
//! │  Remove line ─────────────► remove_item()  ────────► line dropped       │
//! │  Discount % / amount ─────► set_discount() ────────► totals recomputed  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! ```text
//! subtotal = Σ unit_price × qty
//! discount = subtotal × pct   or   fixed amount      (never above subtotal)
//! tax      = Σ line tax on the undiscounted line total (half-up per line)
//! total    = subtotal − discount + tax
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{ItemType, Product, Service, TaxRate};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the bill, frozen when first added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_type: ItemType,
    /// Product or service id.
    pub item_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    pub quantity: i64,
    /// Units on hand when added; `None` for services.
    pub available: Option<i64>,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            item_type: ItemType::Product,
            item_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.sale_price_cents,
            tax_rate_bps: product.tax_rate_bps,
            quantity,
            available: Some(product.stock_qty),
            added_at: Utc::now(),
        }
    }

    pub fn from_service(service: &Service, quantity: i64) -> Self {
        CartLine {
            item_type: ItemType::Service,
            item_id: service.id.clone(),
            name: service.name.clone(),
            unit_price_cents: service.price_cents,
            tax_rate_bps: service.tax_rate_bps,
            quantity,
            available: None,
            added_at: Utc::now(),
        }
    }

    fn matches(&self, item_type: ItemType, item_id: &str) -> bool {
        self.item_type == item_type && self.item_id == item_id
    }

    /// Unit price × quantity, before tax.
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    pub fn tax_cents(&self) -> i64 {
        Money::from_cents(self.line_total_cents())
            .calculate_tax(TaxRate::from_bps(self.tax_rate_bps))
            .cents()
    }

    pub fn line_total_with_tax_cents(&self) -> i64 {
        self.line_total_cents() + self.tax_cents()
    }

    fn check_quantity(&self, quantity: i64) -> CoreResult<()> {
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if let Some(available) = self.available {
            if quantity > available {
                return Err(CoreError::InsufficientStock {
                    item: self.name.clone(),
                    available,
                    requested: quantity,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Discount
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Discount {
    #[default]
    None,
    /// Percentage of the subtotal in basis points (1000 = 10%).
    Percentage(u32),
    /// Fixed amount off, in paise.
    Fixed(i64),
}

impl Discount {
    /// Parses `"10%"` as a percentage and `"50"` / `"49.50"` as an amount.
    pub fn parse(input: &str) -> CoreResult<Discount> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Discount::None);
        }
        if let Some(pct) = input.strip_suffix('%') {
            let rate = TaxRate::parse_percentage(pct).map_err(|_| CoreError::InvalidDiscount {
                reason: format!("'{}' is not a percentage between 0 and 100", input),
            })?;
            return Ok(Discount::Percentage(rate.bps()));
        }
        let amount = Money::parse_decimal(input)?;
        if amount.is_negative() {
            return Err(CoreError::InvalidDiscount {
                reason: "amount cannot be negative".to_string(),
            });
        }
        Ok(Discount::Fixed(amount.cents()))
    }

    /// Amount taken off `subtotal`, capped at the subtotal.
    pub fn amount_for(&self, subtotal: Money) -> Money {
        let raw = match self {
            Discount::None => Money::zero(),
            Discount::Percentage(bps) => subtotal.percentage(*bps),
            Discount::Fixed(cents) => Money::from_cents(*cents),
        };
        raw.min(subtotal).max(Money::zero())
    }

    /// Percentage recorded on the invoice, 0 for fixed discounts.
    pub fn bps(&self) -> u32 {
        match self {
            Discount::Percentage(bps) => *bps,
            _ => 0,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The bill being assembled.
///
/// ## Invariants
/// - Lines are unique by `(item_type, item_id)`; adding again increases qty
/// - Quantity is 1..=999; setting 0 removes the line
/// - Product lines never exceed the stock seen when they were added
/// - At most 100 lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub discount: Discount,
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            discount: Discount::None,
            created_at: Utc::now(),
        }
    }

    /// Adds `quantity` of a product, merging with an existing line.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        self.add_line(CartLine::from_product(product, quantity))
    }

    /// Adds `quantity` of an active service, merging with an existing line.
    pub fn add_service(&mut self, service: &Service, quantity: i64) -> CoreResult<()> {
        if !service.active {
            return Err(CoreError::ServiceInactive(service.name.clone()));
        }
        self.add_line(CartLine::from_service(service, quantity))
    }

    fn add_line(&mut self, line: CartLine) -> CoreResult<()> {
        validate_quantity(line.quantity)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.matches(line.item_type, &line.item_id))
        {
            let new_qty = existing.quantity + line.quantity;
            existing.check_quantity(new_qty)?;
            existing.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        line.check_quantity(line.quantity)?;
        self.items.push(line);
        Ok(())
    }

    /// Sets a line's quantity; 0 removes it.
    pub fn update_quantity(&mut self, item_type: ItemType, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(item_type, item_id);
        }
        validate_quantity(quantity)?;

        let line = self
            .items
            .iter_mut()
            .find(|i| i.matches(item_type, item_id))
            .ok_or_else(|| CoreError::ItemNotInCart(item_id.to_string()))?;
        line.check_quantity(quantity)?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, item_type: ItemType, item_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| !i.matches(item_type, item_id));

        if self.items.len() == initial_len {
            Err(CoreError::ItemNotInCart(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn set_discount(&mut self, discount: Discount) -> CoreResult<()> {
        if let Discount::Percentage(bps) = discount {
            if bps > 10000 {
                return Err(CoreError::InvalidDiscount {
                    reason: "percentage cannot exceed 100".to_string(),
                });
            }
        }
        if let Discount::Fixed(cents) = discount {
            if cents < 0 {
                return Err(CoreError::InvalidDiscount {
                    reason: "amount cannot be negative".to_string(),
                });
            }
        }
        self.discount = discount;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.discount = Discount::None;
        self.created_at = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_total_cents()).sum()
    }

    pub fn discount_cents(&self) -> i64 {
        self.discount
            .amount_for(Money::from_cents(self.subtotal_cents()))
            .cents()
    }

    pub fn tax_cents(&self) -> i64 {
        self.items.iter().map(|i| i.tax_cents()).sum()
    }

    pub fn total_cents(&self) -> i64 {
        self.subtotal_cents() - self.discount_cents() + self.tax_cents()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

/// Cart totals summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub discount_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal_cents(),
            discount_cents: cart.discount_cents(),
            discount_bps: cart.discount.bps(),
            tax_cents: cart.tax_cents(),
            total_cents: cart.total_cents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            barcode: None,
            barcode_symbology: None,
            name: format!("Product {}", id),
            category_id: None,
            purchase_price_cents: price_cents / 2,
            sale_price_cents: price_cents,
            tax_rate_bps: 1800,
            stock_qty: stock,
            low_stock_threshold: 10,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_service(id: &str, price_cents: i64, active: bool) -> Service {
        Service {
            id: id.to_string(),
            name: format!("Service {}", id),
            price_cents,
            duration_minutes: 30,
            tax_rate_bps: 1800,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 999, 50), 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal_cents(), 1998);
    }

    #[test]
    fn test_same_product_merges() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 50);

        cart.add_product(&product, 2).unwrap();
        cart.add_product(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_product_and_service_with_same_id_are_separate_lines() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000, 5), 1).unwrap();
        cart.add_service(&test_service("1", 50000, true), 1).unwrap();
        assert_eq!(cart.item_count(), 2);

        cart.remove_item(ItemType::Service, "1").unwrap();
        assert_eq!(cart.items[0].item_type, ItemType::Product);
    }

    #[test]
    fn test_stock_limit() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 3);

        cart.add_product(&product, 2).unwrap();
        let err = cart.add_product(&product, 2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 4, .. }
        ));
        assert_eq!(cart.total_quantity(), 2);

        assert!(cart.update_quantity(ItemType::Product, "1", 4).is_err());
        cart.update_quantity(ItemType::Product, "1", 3).unwrap();
    }

    #[test]
    fn test_services_are_unlimited_but_must_be_active() {
        let mut cart = Cart::new();
        cart.add_service(&test_service("s", 50000, true), 500).unwrap();
        assert!(matches!(
            cart.add_service(&test_service("off", 100, false), 1),
            Err(CoreError::ServiceInactive(_))
        ));
    }

    #[test]
    fn test_quantity_bounds() {
        let mut cart = Cart::new();
        let service = test_service("s", 100, true);
        assert!(cart.add_service(&service, 0).is_err());
        cart.add_service(&service, 999).unwrap();
        assert!(matches!(
            cart.add_service(&service, 1),
            Err(CoreError::QuantityTooLarge { requested: 1000, .. })
        ));
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000, 5), 1).unwrap();
        cart.update_quantity(ItemType::Product, "1", 0).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(
            cart.update_quantity(ItemType::Product, "1", 2),
            Err(CoreError::ItemNotInCart(_))
        ));
    }

    #[test]
    fn test_totals_with_percentage_discount() {
        let mut cart = Cart::new();
        // 2 × 499.00 at 18%
        cart.add_product(&test_product("1", 49900, 10), 2).unwrap();
        cart.set_discount(Discount::Percentage(1000)).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 99800);
        assert_eq!(totals.discount_cents, 9980);
        assert_eq!(totals.discount_bps, 1000);
        // tax is on the undiscounted line: 99800 × 18% = 17964
        assert_eq!(totals.tax_cents, 17964);
        assert_eq!(totals.total_cents, 99800 - 9980 + 17964);
    }

    #[test]
    fn test_fixed_discount_is_capped() {
        let mut cart = Cart::new();
        cart.add_service(&test_service("s", 10000, true), 1).unwrap();
        cart.set_discount(Discount::Fixed(50000)).unwrap();
        assert_eq!(cart.discount_cents(), 10000);
        assert_eq!(cart.total_cents(), 1800);
        assert_eq!(cart.totals().discount_bps, 0);
    }

    #[test]
    fn test_discount_parse() {
        assert_eq!(Discount::parse("10%").unwrap(), Discount::Percentage(1000));
        assert_eq!(Discount::parse("12.5%").unwrap(), Discount::Percentage(1250));
        assert_eq!(Discount::parse("49.50").unwrap(), Discount::Fixed(4950));
        assert_eq!(Discount::parse("").unwrap(), Discount::None);
        assert!(Discount::parse("150%").is_err());
        assert!(Discount::parse("-5").is_err());
    }

    #[test]
    fn test_set_discount_rejects_over_100_percent() {
        let mut cart = Cart::new();
        assert!(cart.set_discount(Discount::Percentage(10001)).is_err());
        assert!(cart.set_discount(Discount::Fixed(-1)).is_err());
    }

    #[test]
    fn test_clear_resets_discount() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 999, 5), 2).unwrap();
        cart.set_discount(Discount::Fixed(100)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.discount, Discount::None);
    }
}
