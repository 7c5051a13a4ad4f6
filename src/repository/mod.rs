//! Repository layer for database operations
//!
//! Each submodule adds domain methods to [`Repository`], prefixed with the
//! domain name (`bookings_list`, `time_slots_create`, ...).

pub mod bookings;
pub mod categories;
pub mod customers;
pub mod items;
pub mod reports;
pub mod time_slots;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Round trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
