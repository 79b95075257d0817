//! # Billing Commands
//!
//! The open bill lives in [`CartState`]; `checkout` turns it into an
//! invoice and empties it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  bill scan 5901234123457 ──► products().get_by_barcode ──► cart +1     │
//! │  bill add SH-200 -q 2    ──► products().find           ──► cart +2     │
//! │  bill service Facial     ──► services().find           ──► cart +1     │
//! │  bill discount 10%       ──► Discount::Percentage(1000)                │
//! │  bill checkout --pay upi ──► invoices().checkout(cart)  ──► INV-1001   │
//! │                               (stock decremented, cart cleared)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are addressed by their 1-based position in `bill show`, by item
//! id, or by name.

use std::str::FromStr;

use serde::Serialize;
use tracing::info;
use vanity_core::{Cart, CartTotals, Discount, InvoiceWithItems, ItemType, PaymentMethod};
use vanity_db::{CheckoutRequest, Database, DbError, InvoiceFilter};

use super::customer::invoice_table;
use super::{day_range, money, table, Output};
use crate::cli::BillAction;
use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, ConfigState};

#[derive(Debug, Serialize)]
struct CartView {
    cart: Cart,
    totals: CartTotals,
}

pub async fn run(db: &Database, config: &ConfigState, cart: &CartState, action: BillAction) -> ApiResult<Output> {
    match action {
        BillAction::Show => show(cart, config),
        BillAction::Add { product, qty } => {
            let product = db.products().find(&product).await?;
            cart.with_cart_mut(|c| Ok(c.add_product(&product, qty)?))?;
            show(cart, config)
        }
        BillAction::Scan { code } => {
            let code = code.trim();
            let product = db
                .products()
                .get_by_barcode(code)
                .await?
                .ok_or_else(|| DbError::not_found("Product with barcode", code))?;
            cart.with_cart_mut(|c| Ok(c.add_product(&product, 1)?))?;
            info!(sku = %product.sku, "Scanned");
            show(cart, config)
        }
        BillAction::Service { service, qty } => {
            let service = db.services().find(&service).await?;
            cart.with_cart_mut(|c| Ok(c.add_service(&service, qty)?))?;
            show(cart, config)
        }
        BillAction::Qty { line, qty } => {
            cart.with_cart_mut(|c| {
                let (item_type, item_id) = resolve_line(c, &line)?;
                Ok(c.update_quantity(item_type, &item_id, qty)?)
            })?;
            show(cart, config)
        }
        BillAction::Remove { line } => {
            cart.with_cart_mut(|c| {
                let (item_type, item_id) = resolve_line(c, &line)?;
                Ok(c.remove_item(item_type, &item_id)?)
            })?;
            show(cart, config)
        }
        BillAction::Discount { value } => {
            let discount = match value.trim() {
                v if v.eq_ignore_ascii_case("none") => Discount::None,
                v => Discount::parse(v)?,
            };
            cart.with_cart_mut(|c| Ok(c.set_discount(discount)?))?;
            show(cart, config)
        }
        BillAction::Clear => {
            cart.with_cart_mut(|c| {
                c.clear();
                Ok(())
            })?;
            Ok(Output::message("Bill cleared"))
        }
        BillAction::Checkout {
            customer,
            name,
            phone,
            pay,
        } => checkout(db, config, cart, customer, name, phone, &pay).await,
        BillAction::List { from, to, query, page } => {
            let range = match (from.as_deref(), to.as_deref()) {
                (None, None) => None,
                (from, to) => Some(day_range(from, to)?),
            };
            let filter = InvoiceFilter {
                from: range.map(|r| r.0),
                to: range.map(|r| r.1),
                query,
                page: page.saturating_sub(1),
            };
            let invoices = db.invoices().list(&filter).await?;
            Output::new(invoice_table(&invoices, config), &invoices)
        }
        BillAction::Invoice { key } => {
            let invoice = db.invoices().get_with_items(key.trim()).await?;
            let store_name = store_name(db, config).await?;
            Output::new(receipt(&invoice, &store_name, config), &invoice)
        }
    }
}

/// `(item_type, item_id)` for a line number, item id or item name.
fn resolve_line(cart: &Cart, key: &str) -> ApiResult<(ItemType, String)> {
    let key = key.trim();
    let line = match key.parse::<usize>() {
        Ok(n) if (1..=cart.items.len()).contains(&n) => cart.items.get(n - 1),
        _ => cart
            .items
            .iter()
            .find(|l| l.item_id == key)
            .or_else(|| cart.items.iter().find(|l| l.name.eq_ignore_ascii_case(key))),
    };
    line.map(|l| (l.item_type, l.item_id.clone()))
        .ok_or_else(|| ApiError::cart(format!("No line '{}' on the bill", key)))
}

fn show(cart: &CartState, config: &ConfigState) -> ApiResult<Output> {
    let view = cart.with_cart(|c| CartView {
        cart: c.clone(),
        totals: c.totals(),
    });
    if view.cart.is_empty() {
        return Output::new("Bill is empty", &view);
    }

    let rows = view
        .cart
        .items
        .iter()
        .enumerate()
        .map(|(i, l)| {
            vec![
                (i + 1).to_string(),
                l.name.clone(),
                l.quantity.to_string(),
                money(l.unit_price_cents, config),
                money(l.line_total_cents(), config),
            ]
        })
        .collect::<Vec<_>>();

    let t = &view.totals;
    let mut text = vec![
        table(&["#", "item", "qty", "price", "amount"], &rows),
        String::new(),
        format!("Subtotal: {}", money(t.subtotal_cents, config)),
    ];
    if t.discount_cents > 0 {
        text.push(format!("Discount: -{}", money(t.discount_cents, config)));
    }
    text.push(format!("Tax:      {}", money(t.tax_cents, config)));
    text.push(format!("Total:    {}", money(t.total_cents, config)));

    Output::new(text.join("\n"), &view)
}

async fn store_name(db: &Database, config: &ConfigState) -> ApiResult<String> {
    match &config.store_name {
        Some(name) => Ok(name.clone()),
        None => Ok(db.settings().load().await?.store_name),
    }
}

async fn checkout(
    db: &Database,
    config: &ConfigState,
    cart: &CartState,
    customer: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    pay: &str,
) -> ApiResult<Output> {
    let payment_method = PaymentMethod::from_str(pay)?;
    let customer_id = match customer.as_deref().map(str::trim) {
        Some(key) => {
            let repo = db.customers();
            let found = match repo.get_by_id(key).await? {
                Some(c) => Some(c),
                None => repo.get_by_phone(key).await?,
            };
            Some(found.ok_or_else(|| DbError::not_found("Customer", key))?.id)
        }
        None => None,
    };

    let request = CheckoutRequest {
        customer_id,
        customer_name: name,
        customer_phone: phone,
        payment_method,
    };
    let snapshot = cart.with_cart(Cart::clone);
    let invoice = db.invoices().checkout(&snapshot, &request).await?;

    cart.with_cart_mut(|c| {
        c.clear();
        Ok(())
    })?;
    info!(
        invoice_number = %invoice.invoice.invoice_number,
        total_cents = invoice.invoice.total_cents,
        "Invoice issued"
    );

    let store_name = store_name(db, config).await?;
    Output::new(receipt(&invoice, &store_name, config), &invoice)
}

fn receipt(invoice: &InvoiceWithItems, store_name: &str, config: &ConfigState) -> String {
    let head = &invoice.invoice;
    let mut lines = vec![
        store_name.to_string(),
        format!("Invoice {}  {}", head.invoice_number, head.created_at.format("%Y-%m-%d %H:%M")),
    ];
    if let Some(name) = &head.customer_name {
        match &head.customer_phone {
            Some(phone) => lines.push(format!("Customer: {} ({})", name, phone)),
            None => lines.push(format!("Customer: {}", name)),
        }
    }

    let rows = invoice
        .items
        .iter()
        .map(|i| {
            vec![
                i.item_name.clone(),
                i.quantity.to_string(),
                money(i.unit_price_cents, config),
                money(i.total_cents, config),
            ]
        })
        .collect::<Vec<_>>();
    lines.push(String::new());
    lines.push(table(&["item", "qty", "price", "total"], &rows));
    lines.push(String::new());
    lines.push(format!("Subtotal: {}", money(head.subtotal_cents, config)));
    if head.discount_cents > 0 {
        lines.push(format!("Discount: -{}", money(head.discount_cents, config)));
    }
    lines.push(format!("Tax:      {}", money(head.tax_cents, config)));
    lines.push(format!("Total:    {}", money(head.total_cents, config)));
    lines.push(format!("Paid by {}", head.payment_method));
    lines.join("\n")
}
