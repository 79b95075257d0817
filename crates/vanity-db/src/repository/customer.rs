//! # Customer Repository
//!
//! Customers, their lifetime spend and invoice history. Deleting a customer
//! keeps their invoices (with the name and phone snapshot) and clears the
//! link.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, like_pattern};
use vanity_core::validation::{validate_name, validate_phone};
use vanity_core::{Customer, CustomerSummary, Invoice};

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, notes, created_at, updated_at";

/// Fields an operator enters for a customer.
#[derive(Debug, Clone, Default)]
pub struct CustomerInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CustomerInput {
    fn validate(&self) -> DbResult<()> {
        validate_name("customer name", &self.name)?;
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Customers by name with invoice count and total spent.
    pub async fn list_with_totals(&self, query: Option<&str>) -> DbResult<Vec<CustomerSummary>> {
        let pattern = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(like_pattern);

        let customers = sqlx::query_as::<_, CustomerSummary>(
            r#"
            SELECT
                c.id, c.name, c.phone, c.email, c.address, c.notes,
                c.created_at, c.updated_at,
                COUNT(i.id) AS invoice_count,
                COALESCE(SUM(i.total_cents), 0) AS total_spent_cents
            FROM customers c
            LEFT JOIN invoices i ON i.customer_id = c.id
            WHERE ?1 IS NULL
               OR c.name LIKE ?1 ESCAPE '\'
               OR c.phone LIKE ?1 ESCAPE '\'
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1 LIMIT 1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(phone.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        input.validate()?;

        let now = Utc::now();
        let customer = Customer {
            id: generate_id(),
            name: input.name.trim().to_string(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, email, address, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.notes)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<()> {
        input.validate()?;
        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2, phone = ?3, email = ?4, address = ?5, notes = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// The customer's invoices, newest first.
    pub async fn invoices(&self, customer_id: &str) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, customer_name, customer_phone,
                   subtotal_cents, discount_cents, discount_bps, tax_cents, total_cents,
                   payment_method, created_at
            FROM invoices
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::invoice::CheckoutRequest;
    use crate::repository::test_support::*;
    use vanity_core::Cart;

    fn input(name: &str, phone: Option<&str>) -> CustomerInput {
        CustomerInput {
            name: name.to_string(),
            phone: phone.map(str::to_string),
            ..CustomerInput::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_db().await;
        let repo = db.customers();

        let priya = repo.create(&input("Priya", Some("9876543210"))).await.unwrap();
        assert_eq!(repo.get_by_phone("9876543210").await.unwrap().unwrap().id, priya.id);
        assert!(repo.create(&input("Bad", Some("12ab"))).await.is_err());
        assert!(repo.create(&input("", None)).await.is_err());

        repo.update(&priya.id, &input("Priya Sharma", Some("9876543210")))
            .await
            .unwrap();
        assert_eq!(repo.get_by_id(&priya.id).await.unwrap().unwrap().name, "Priya Sharma");
    }

    #[tokio::test]
    async fn test_totals_and_history() {
        let db = test_db().await;
        let repo = db.customers();
        let anita = repo.create(&input("Anita", Some("9000000001"))).await.unwrap();
        repo.create(&input("Bela", None)).await.unwrap();

        let haircut = db.services().insert(&service("Haircut", 50000)).await.unwrap();
        for _ in 0..2 {
            let mut cart = Cart::new();
            cart.add_service(&haircut, 1).unwrap();
            let request = CheckoutRequest {
                customer_id: Some(anita.id.clone()),
                ..CheckoutRequest::default()
            };
            db.invoices().checkout(&cart, &request).await.unwrap();
        }

        let list = repo.list_with_totals(None).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].customer.name, "Anita");
        assert_eq!(list[0].invoice_count, 2);
        assert_eq!(list[0].total_spent_cents, 2 * 59000);
        assert_eq!(list[1].total_spent_cents, 0);

        let filtered = repo.list_with_totals(Some("bel")).await.unwrap();
        assert_eq!(filtered.len(), 1);

        assert_eq!(repo.invoices(&anita.id).await.unwrap().len(), 2);

        repo.delete(&anita.id).await.unwrap();
        let orphaned = db.invoices().list(&Default::default()).await.unwrap();
        assert_eq!(orphaned.len(), 2);
        assert!(orphaned.iter().all(|i| i.customer_id.is_none()));
        assert!(orphaned.iter().all(|i| i.customer_name.as_deref() == Some("Anita")));
    }
}
