//! Customer model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub phone_number: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create customer request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomer {
    #[validate(
        required(message = "The name field is required"),
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "The phone_number field is required"),
        length(min = 1, max = 50, message = "The phone_number must be between 1 and 50 characters")
    )]
    pub phone_number: Option<String>,
    pub notes: Option<String>,
}

/// Update customer request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomer {
    #[validate(
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters")
    )]
    pub name: Option<String>,
    #[validate(
        length(min = 1, max = 50, message = "The phone_number must be between 1 and 50 characters")
    )]
    pub phone_number: Option<String>,
    pub notes: Option<String>,
}

/// Customer list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CustomerQuery {
    /// Matches name or phone number
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
