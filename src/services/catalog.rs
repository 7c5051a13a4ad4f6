//! Catalog management service (categories and items)

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        category::{slugify, unique_slug, Category, CreateCategory, UpdateCategory},
        item::{CreateItem, Item, ItemQuery, UpdateItem},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // ---- Categories ----

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories_list().await
    }

    pub async fn get_category(&self, id: i32) -> AppResult<Category> {
        self.repository.categories_get_by_id(id).await
    }

    /// First free slug derived from `name_en`, ignoring the category being updated
    async fn free_slug(&self, name_en: &str, exclude_id: Option<i32>) -> AppResult<String> {
        let base = slugify(name_en);
        let taken = self.repository.categories_slugs_like(&base, exclude_id).await?;
        Ok(unique_slug(&base, &taken))
    }

    /// Create a category with a unique slug
    pub async fn create_category(&self, data: &CreateCategory) -> AppResult<Category> {
        data.validate()?;
        let (name_en, name_ar) = match (&data.name_en, &data.name_ar) {
            (Some(en), Some(ar)) => (en.as_str(), ar.as_str()),
            _ => return Err(AppError::Validation("Category names are required".to_string())),
        };

        let slug = self.free_slug(name_en, None).await?;
        let category = self.repository.categories_create(name_en, name_ar, &slug).await?;
        tracing::info!("Category created: id={} slug={}", category.id, category.slug);
        Ok(category)
    }

    /// Update a category; the slug follows a changed English name
    pub async fn update_category(&self, id: i32, data: &UpdateCategory) -> AppResult<Category> {
        data.validate()?;
        let current = self.repository.categories_get_by_id(id).await?;

        let slug = match data.name_en.as_deref() {
            Some(name_en) if name_en != current.name_en => {
                Some(self.free_slug(name_en, Some(id)).await?)
            }
            _ => None,
        };

        self.repository
            .categories_update(
                id,
                data.name_en.as_deref(),
                data.name_ar.as_deref(),
                slug.as_deref(),
            )
            .await
    }

    /// Delete a category unless bookings are filed under it
    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        self.repository.categories_get_by_id(id).await?;
        let bookings = self.repository.categories_count_bookings(id).await?;
        if bookings > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete category with existing bookings ({})",
                bookings
            )));
        }
        self.repository.categories_delete(id).await?;
        tracing::info!("Category deleted: id={}", id);
        Ok(())
    }

    // ---- Items ----

    pub async fn list_items(&self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        self.repository.items_list(query).await
    }

    pub async fn get_item(&self, id: i32) -> AppResult<Item> {
        self.repository.items_get_by_id(id).await
    }

    pub async fn create_item(&self, data: &CreateItem) -> AppResult<Item> {
        let category_exists = match data.category_id {
            Some(category_id) => self.repository.categories_exists(category_id).await?,
            None => false,
        };
        let fields = data.check(category_exists)?;
        self.repository.items_create(&fields).await
    }

    pub async fn update_item(&self, id: i32, data: &UpdateItem) -> AppResult<Item> {
        self.repository.items_get_by_id(id).await?;
        let category_exists = match data.category_id {
            Some(category_id) => self.repository.categories_exists(category_id).await?,
            None => true,
        };
        data.check(category_exists)?;
        self.repository.items_update(id, data).await
    }

    /// Delete an item unless a booking carries it
    pub async fn delete_item(&self, id: i32) -> AppResult<()> {
        self.repository.items_get_by_id(id).await?;
        let bookings = self.repository.items_count_bookings(id).await?;
        if bookings > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete item attached to existing bookings ({})",
                bookings
            )));
        }
        self.repository.items_delete(id).await?;
        tracing::info!("Item deleted: id={}", id);
        Ok(())
    }
}
