//! Category model and slug generation

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;
use validator::Validate;

/// Booking category (e.g. "Wedding Dresses")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    /// English name
    pub name_en: String,
    /// Arabic name
    pub name_ar: String,
    /// URL-safe identifier derived from name_en
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create category request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(
        required(message = "The name_en field is required"),
        length(min = 1, max = 255, message = "The name_en must be between 1 and 255 characters")
    )]
    pub name_en: Option<String>,
    #[validate(
        required(message = "The name_ar field is required"),
        length(min = 1, max = 255, message = "The name_ar must be between 1 and 255 characters")
    )]
    pub name_ar: Option<String>,
}

/// Update category request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(
        length(min = 1, max = 255, message = "The name_en must be between 1 and 255 characters")
    )]
    pub name_en: Option<String>,
    #[validate(
        length(min = 1, max = 255, message = "The name_ar must be between 1 and 255 characters")
    )]
    pub name_ar: Option<String>,
}

/// Turn a display name into a lowercase, dash separated identifier.
///
/// Accented letters are folded to ASCII; anything that is not a letter or a
/// digit becomes a single dash.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "category".to_string()
    } else {
        slug
    }
}

/// First of `base`, `base-1`, `base-2`, ... that is not already taken
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
