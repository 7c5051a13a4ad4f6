//! Catalog item model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::max_amount;
use crate::error::FieldErrors;

/// A rentable good with its current price
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i32,
    pub name: String,
    /// Current price; bookings keep their own copy
    pub price: Decimal,
    pub description: Option<String>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create item request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    #[validate(
        required(message = "The name field is required"),
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters")
    )]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    #[validate(required(message = "The category_id field is required"))]
    pub category_id: Option<i32>,
}

/// Update item request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItem {
    #[validate(
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters")
    )]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
}

/// Item list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ItemQuery {
    pub category_id: Option<i32>,
    /// Case-insensitive name search
    pub search: Option<String>,
}

/// Validated item fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub category_id: i32,
}

fn check_price(errors: &mut FieldErrors, price: Option<Decimal>, required: bool) {
    match price {
        None if required => errors.add("price", "The price field is required"),
        Some(p) if p < Decimal::ZERO => {
            errors.add("price", "The price must be at least 0")
        }
        Some(p) if p.round_dp(2) > max_amount() => {
            errors.add("price", format!("The price may not be greater than {}", max_amount()))
        }
        _ => {}
    }
}

impl CreateItem {
    /// Check the request; `category_exists` reports whether the referenced
    /// category was found.
    pub fn check(&self, category_exists: bool) -> Result<ItemFields, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        check_price(&mut errors, self.price, true);
        if self.category_id.is_some() && !category_exists {
            errors.add("category_id", "The selected category_id is invalid");
        }

        match (&self.name, self.price, self.category_id) {
            (Some(name), Some(price), Some(category_id)) if errors.is_empty() => Ok(ItemFields {
                name: name.clone(),
                price,
                description: self.description.clone(),
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateItem {
    pub fn check(&self, category_exists: bool) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        check_price(&mut errors, self.price, false);
        if self.category_id.is_some() && !category_exists {
            errors.add("category_id", "The selected category_id is invalid");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_collects_all_problems() {
        let request = CreateItem {
            name: None,
            price: Some(Decimal::new(-500, 2)),
            description: None,
            category_id: Some(42),
        };
        let errors = request.check(false).unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("price"));
        assert!(errors.contains("category_id"));
    }

    #[test]
    fn create_accepts_free_items() {
        let request = CreateItem {
            name: Some("Veil".to_string()),
            price: Some(Decimal::ZERO),
            description: None,
            category_id: Some(1),
        };
        let fields = request.check(true).expect("valid item");
        assert_eq!(fields.price, Decimal::ZERO);
        assert_eq!(fields.category_id, 1);
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        assert!(UpdateItem::default().check(false).is_ok());

        let negative = UpdateItem {
            price: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert!(negative.check(true).unwrap_err().contains("price"));
    }

    #[test]
    fn price_above_column_range_is_rejected() {
        let request = UpdateItem {
            price: Some(Decimal::new(100_000_000, 0)),
            ..Default::default()
        };
        assert!(request.check(true).unwrap_err().contains("price"));

        let at_limit = UpdateItem {
            price: Some(max_amount()),
            ..Default::default()
        };
        assert!(at_limit.check(true).is_ok());
    }
}
