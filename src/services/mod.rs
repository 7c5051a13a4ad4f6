//! Business logic services

pub mod bookings;
pub mod catalog;
pub mod customers;
pub mod reports;
pub mod time_slots;
pub mod users;

use crate::{config::AuthConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub time_slots: time_slots::TimeSlotsService,
    pub customers: customers::CustomersService,
    pub bookings: bookings::BookingsService,
    pub users: users::UsersService,
    pub reports: reports::ReportsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            time_slots: time_slots::TimeSlotsService::new(repository.clone()),
            customers: customers::CustomersService::new(repository.clone()),
            bookings: bookings::BookingsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            reports: reports::ReportsService::new(repository.clone()),
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
