//! Items domain methods on Repository

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        item::{Item, ItemFields, ItemQuery, UpdateItem},
        like_pattern,
    },
};

impl Repository {
    /// List items, optionally restricted to a category or a name search
    pub async fn items_list(&self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM items WHERE 1=1");
        if let Some(category_id) = query.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND name ILIKE ").push_bind(like_pattern(search));
        }
        qb.push(" ORDER BY name, id");

        let rows = qb.build_query_as::<Item>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Get an item by ID
    pub async fn items_get_by_id(&self, id: i32) -> AppResult<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    /// The subset of `ids` that exist
    pub async fn items_existing_ids(&self, ids: &[i32]) -> AppResult<HashSet<i32>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found: Vec<i32> = sqlx::query_scalar("SELECT id FROM items WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(found.into_iter().collect())
    }

    /// Create an item
    pub async fn items_create(&self, fields: &ItemFields) -> AppResult<Item> {
        let row = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, price, description, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(fields.price)
        .bind(&fields.description)
        .bind(fields.category_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the supplied fields of an item
    pub async fn items_update(&self, id: i32, data: &UpdateItem) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET
                name = COALESCE($2, name),
                price = COALESCE($3, price),
                description = COALESCE($4, description),
                category_id = COALESCE($5, category_id),
                updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.price)
        .bind(&data.description)
        .bind(data.category_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    /// Number of bookings that carry the item as a line
    pub async fn items_count_bookings(&self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM booking_items WHERE item_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn items_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", id)));
        }
        Ok(())
    }
}
