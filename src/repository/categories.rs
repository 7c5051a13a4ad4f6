//! Categories domain methods on Repository

use std::collections::HashSet;

use chrono::Utc;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::category::Category,
};

impl Repository {
    /// List all categories, ordered by English name
    pub async fn categories_list(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name_en, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a category by ID
    pub async fn categories_get_by_id(&self, id: i32) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn categories_exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Slugs equal to `base` or of the form `base-N`, ignoring `exclude_id`
    pub async fn categories_slugs_like(
        &self,
        base: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<HashSet<String>> {
        let escaped = base.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let suffixed = format!("{}-%", escaped);
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT slug FROM categories
            WHERE (slug = $1 OR slug LIKE $2)
              AND ($3::INTEGER IS NULL OR id <> $3)
            "#,
        )
        .bind(base)
        .bind(suffixed)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs.into_iter().collect())
    }

    /// Create a category
    pub async fn categories_create(
        &self,
        name_en: &str,
        name_ar: &str,
        slug: &str,
    ) -> AppResult<Category> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name_en, name_ar, slug)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name_en)
        .bind(name_ar)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the supplied fields of a category
    pub async fn categories_update(
        &self,
        id: i32,
        name_en: Option<&str>,
        name_ar: Option<&str>,
        slug: Option<&str>,
    ) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name_en = COALESCE($2, name_en),
                name_ar = COALESCE($3, name_ar),
                slug = COALESCE($4, slug),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name_en)
        .bind(name_ar)
        .bind(slug)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Number of bookings filed under a category
    pub async fn categories_count_bookings(&self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a category; its items go with it
    pub async fn categories_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }
}
