//! Data models for the booking server

pub mod booking;
pub mod calendar;
pub mod category;
pub mod customer;
pub mod item;
pub mod report;
pub mod time_slot;
pub mod user;

// Re-export commonly used types
pub use booking::{Booking, BookingDetails, PaymentStatus};
pub use category::Category;
pub use customer::Customer;
pub use item::Item;
pub use time_slot::TimeSlot;
pub use user::{Role, User};

/// Page size used when the caller does not ask for one
pub const DEFAULT_PER_PAGE: i64 = 15;
/// Largest page size a caller may request
pub const MAX_PER_PAGE: i64 = 100;

/// Largest amount a NUMERIC(10, 2) money column holds
pub fn max_amount() -> rust_decimal::Decimal {
    rust_decimal::Decimal::new(9_999_999_999, 2)
}

/// Normalized pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Page defaults to 1; page size defaults to 15 and is clamped to [1, 100]
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Sort direction accepted by list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than `asc` (case-insensitive) sorts descending
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// `%term%` pattern for ILIKE with LIKE wildcards in the term escaped
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
