//! Booking engine: validation, totals, persistence and listing

use crate::{
    error::AppResult,
    models::{
        booking::{
            BookingDetails, BookingExportRow, BookingFilter, BookingQuery, BookingSort,
            CreateBooking, ReferenceReport, UpdateBooking,
        },
        user::AuthContext,
        PageRequest,
    },
    repository::Repository,
};

/// References a booking request points at
struct RequestedRefs<'a> {
    invoice_number: Option<&'a str>,
    category_id: Option<i32>,
    time_slot_id: Option<i32>,
    customer_id: Option<i32>,
    item_ids: Vec<Option<i32>>,
}

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
}

impl BookingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Look up everything the request refers to, so validation can report it all at once
    async fn resolve_references(
        &self,
        refs: RequestedRefs<'_>,
        exclude_id: Option<i32>,
    ) -> AppResult<ReferenceReport> {
        let repo = &self.repository;

        let invoice_taken = match refs.invoice_number.map(str::trim).filter(|s| !s.is_empty()) {
            Some(invoice) => repo.bookings_invoice_taken(invoice, exclude_id).await?,
            None => false,
        };
        let category_missing = match refs.category_id {
            Some(id) => !repo.categories_exists(id).await?,
            None => false,
        };
        let time_slot_missing = match refs.time_slot_id {
            Some(id) => !repo.time_slots_exists(id).await?,
            None => false,
        };
        let customer_missing = match refs.customer_id {
            Some(id) => !repo.customers_exists(id).await?,
            None => false,
        };

        let ids: Vec<i32> = refs.item_ids.iter().flatten().copied().collect();
        let existing = repo.items_existing_ids(&ids).await?;
        let missing_items = refs
            .item_ids
            .iter()
            .enumerate()
            .filter_map(|(index, id)| match id {
                Some(id) if !existing.contains(id) => Some(index),
                _ => None,
            })
            .collect();

        Ok(ReferenceReport {
            invoice_taken,
            category_missing,
            time_slot_missing,
            customer_missing,
            missing_items,
        })
    }

    pub async fn get(&self, id: i32) -> AppResult<BookingDetails> {
        self.repository.bookings_get_by_id(id).await
    }

    /// Create a booking recorded by the acting staff member
    pub async fn create(
        &self,
        ctx: AuthContext,
        data: &CreateBooking,
    ) -> AppResult<BookingDetails> {
        let refs = self
            .resolve_references(
                RequestedRefs {
                    invoice_number: data.invoice_number.as_deref(),
                    category_id: data.category_id,
                    time_slot_id: data.time_slot_id,
                    customer_id: data.customer_id,
                    item_ids: data.item_ids(),
                },
                None,
            )
            .await?;
        let draft = data.check(&refs)?;

        let id = self.repository.bookings_create(&draft, ctx.user_id).await?;
        tracing::info!(
            "Booking created: id={} invoice={} total={} by user {}",
            id,
            draft.fields.invoice_number,
            draft.fields.totals.total_amount,
            ctx.user_id
        );
        self.repository.bookings_get_by_id(id).await
    }

    /// Apply a partial update; the balance is always recomputed
    pub async fn update(&self, id: i32, data: &UpdateBooking) -> AppResult<BookingDetails> {
        let current = self.repository.bookings_get_row(id).await?;
        let refs = self
            .resolve_references(
                RequestedRefs {
                    invoice_number: data.invoice_number.as_deref(),
                    category_id: data.category_id,
                    time_slot_id: data.time_slot_id,
                    customer_id: data.requested_customer(),
                    item_ids: data.item_ids(),
                },
                Some(id),
            )
            .await?;
        let draft = data.check(&current, &refs)?;

        self.repository.bookings_update(id, &draft).await?;
        tracing::info!(
            "Booking updated: id={} total={} remaining={}",
            id,
            draft.fields.totals.total_amount,
            draft.fields.totals.remaining_balance
        );
        self.repository.bookings_get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.bookings_delete(id).await?;
        tracing::info!("Booking deleted: id={}", id);
        Ok(())
    }

    pub async fn list(
        &self,
        query: &BookingQuery,
    ) -> AppResult<(Vec<BookingDetails>, i64, PageRequest)> {
        let filter = BookingFilter::from_query(query)?;
        let sort = BookingSort::parse(query.sort_by.as_deref(), query.sort_order.as_deref());
        let page = PageRequest::new(query.page, query.per_page);
        let (bookings, total) = self.repository.bookings_list(&filter, sort, page).await?;
        Ok((bookings, total, page))
    }

    /// Flattened rows for every booking matching the filters
    pub async fn export(&self, query: &BookingQuery) -> AppResult<Vec<BookingExportRow>> {
        let filter = BookingFilter::from_query(query)?;
        let bookings = self.repository.bookings_export(&filter).await?;
        tracing::debug!("Exporting {} bookings", bookings.len());
        Ok(bookings.iter().map(BookingExportRow::from).collect())
    }
}
