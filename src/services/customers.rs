//! Customer service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{CreateCustomer, Customer, CustomerQuery, UpdateCustomer},
        PageRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CustomersService {
    repository: Repository,
}

impl CustomersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(
        &self,
        query: &CustomerQuery,
    ) -> AppResult<(Vec<Customer>, i64, PageRequest)> {
        let page = PageRequest::new(query.page, query.per_page);
        let (customers, total) = self
            .repository
            .customers_list(query.search.as_deref(), page)
            .await?;
        Ok((customers, total, page))
    }

    pub async fn get(&self, id: i32) -> AppResult<Customer> {
        self.repository.customers_get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        data.validate()?;
        match (&data.name, &data.phone_number) {
            (Some(name), Some(phone)) => {
                self.repository
                    .customers_create(name, phone, data.notes.as_deref())
                    .await
            }
            _ => Err(AppError::Validation(
                "Customer name and phone number are required".to_string(),
            )),
        }
    }

    pub async fn update(&self, id: i32, data: &UpdateCustomer) -> AppResult<Customer> {
        data.validate()?;
        self.repository.customers_update(id, data).await
    }

    /// Delete a customer; bookings are kept as walk-ins
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.customers_delete(id).await?;
        tracing::info!("Customer deleted: id={}", id);
        Ok(())
    }
}
