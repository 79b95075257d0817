//! Customer commands.

use tracing::info;
use vanity_core::Invoice;
use vanity_db::{CustomerInput, Database, DbError};

use super::{money, table, Output};
use crate::cli::{CustomerAction, CustomerFields};
use crate::error::ApiResult;
use crate::state::ConfigState;

pub async fn run(db: &Database, config: &ConfigState, action: CustomerAction) -> ApiResult<Output> {
    let repo = db.customers();
    match action {
        CustomerAction::List { query } => {
            let customers = repo.list_with_totals(query.as_deref()).await?;
            let rows = customers
                .iter()
                .map(|s| {
                    vec![
                        s.customer.id.clone(),
                        s.customer.name.clone(),
                        s.customer.phone.clone().unwrap_or_default(),
                        s.invoice_count.to_string(),
                        money(s.total_spent_cents, config),
                    ]
                })
                .collect::<Vec<_>>();
            Output::new(table(&["id", "name", "phone", "invoices", "spent"], &rows), &customers)
        }
        CustomerAction::Add { name, fields } => {
            let customer = repo.create(&input(name, fields)).await?;
            info!(id = %customer.id, "Customer created");
            Output::new(format!("Created customer {} ({})", customer.name, customer.id), &customer)
        }
        CustomerAction::Update { id, name, fields } => {
            repo.update(&id, &input(name, fields)).await?;
            let customer = repo
                .get_by_id(&id)
                .await?
                .ok_or_else(|| DbError::not_found("Customer", &id))?;
            Output::new(format!("Updated customer {}", customer.name), &customer)
        }
        CustomerAction::Delete { id } => {
            repo.delete(&id).await?;
            Ok(Output::message(format!("Deleted customer {}", id)))
        }
        CustomerAction::History { id } => {
            let customer = repo
                .get_by_id(&id)
                .await?
                .ok_or_else(|| DbError::not_found("Customer", &id))?;
            let invoices = repo.invoices(&customer.id).await?;
            let text = format!("{}\n{}", customer.name, invoice_table(&invoices, config));
            Output::new(text, &invoices)
        }
    }
}

fn input(name: String, fields: CustomerFields) -> CustomerInput {
    CustomerInput {
        name,
        phone: fields.phone,
        email: fields.email,
        address: fields.address,
        notes: fields.notes,
    }
}

pub(crate) fn invoice_table(invoices: &[Invoice], config: &ConfigState) -> String {
    let rows = invoices
        .iter()
        .map(|i| {
            vec![
                i.invoice_number.clone(),
                i.created_at.format("%Y-%m-%d %H:%M").to_string(),
                i.customer_name.clone().unwrap_or_default(),
                i.payment_method.to_string(),
                money(i.total_cents, config),
            ]
        })
        .collect::<Vec<_>>();
    table(&["invoice", "date", "customer", "payment", "total"], &rows)
}
