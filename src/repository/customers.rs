//! Customers domain methods on Repository

use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{Customer, UpdateCustomer},
        like_pattern, PageRequest,
    },
};

fn push_customer_search(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ").push_bind(pattern.clone());
        qb.push(" OR phone_number ILIKE ").push_bind(pattern);
        qb.push(")");
    }
}

impl Repository {
    /// Search customers by name or phone, newest first
    pub async fn customers_list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<Customer>, i64)> {
        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM customers WHERE 1=1");
        push_customer_search(&mut count_qb, search);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM customers WHERE 1=1");
        push_customer_search(&mut qb, search);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = qb.build_query_as::<Customer>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Get a customer by ID
    pub async fn customers_get_by_id(&self, id: i32) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }

    pub async fn customers_exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a customer
    pub async fn customers_create(
        &self,
        name: &str,
        phone_number: &str,
        notes: Option<&str>,
    ) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone_number, notes)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(phone_number)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the supplied fields of a customer
    pub async fn customers_update(&self, id: i32, data: &UpdateCustomer) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                phone_number = COALESCE($3, phone_number),
                notes = COALESCE($4, notes),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.phone_number)
        .bind(&data.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }

    /// Delete a customer; their bookings become walk-ins
    pub async fn customers_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Customer {} not found", id)));
        }
        Ok(())
    }
}
