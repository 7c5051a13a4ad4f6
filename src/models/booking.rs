//! Booking models, request validation, totals and list filters

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use super::{
    category::Category, customer::Customer, like_pattern, max_amount, time_slot::TimeSlot,
    user::UserRef, SortDirection,
};
use crate::error::FieldErrors;

/// Payment state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

// SQLx conversion for PaymentStatus (stored as TEXT)
impl sqlx::Type<Postgres> for PaymentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for PaymentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for PaymentStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Booking row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: i32,
    pub invoice_number: String,
    pub customer_id: Option<i32>,
    /// Contact number kept on the booking itself
    pub phone_number: String,
    pub notes: Option<String>,
    pub accessories: Option<String>,
    pub payment_status: PaymentStatus,
    /// Sum of the item prices captured at booking time
    pub total_amount: Decimal,
    pub deposit_amount: Decimal,
    /// total_amount - deposit_amount
    pub remaining_balance: Decimal,
    pub category_id: i32,
    pub booking_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub time_slot_id: i32,
    /// Staff member who recorded the booking
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item attached to a booking with the price agreed at the time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingItemLine {
    #[serde(skip)]
    pub booking_id: i32,
    /// Item id
    pub id: i32,
    pub name: String,
    pub price_at_booking: Decimal,
}

/// Booking with its related records
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub category: Option<Category>,
    pub time_slot: Option<TimeSlot>,
    pub customer: Option<Customer>,
    pub user: Option<UserRef>,
    pub items: Vec<BookingItemLine>,
}

/// One item line of a booking request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookingLineInput {
    /// Item id
    pub id: Option<i32>,
    /// Agreed price for this booking
    pub price: Option<Decimal>,
}

/// Create booking request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateBooking {
    pub invoice_number: Option<String>,
    pub customer_id: Option<i32>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub accessories: Option<String>,
    /// pending, partial or paid
    pub payment_status: Option<String>,
    pub deposit_amount: Option<Decimal>,
    pub category_id: Option<i32>,
    /// YYYY-MM-DD
    pub booking_date: Option<String>,
    /// YYYY-MM-DD, on or after booking_date
    pub return_date: Option<String>,
    pub time_slot_id: Option<i32>,
    pub items: Option<Vec<BookingLineInput>>,
}

/// Update booking request.
///
/// Absent fields keep their value; `customer_id`, `notes`, `accessories` and
/// `return_date` can be cleared with an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBooking {
    pub invoice_number: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>, nullable)]
    pub customer_id: Option<Option<i32>>,
    pub phone_number: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub notes: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub accessories: Option<Option<String>>,
    pub payment_status: Option<String>,
    pub deposit_amount: Option<Decimal>,
    pub category_id: Option<i32>,
    pub booking_date: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub return_date: Option<Option<String>>,
    pub time_slot_id: Option<i32>,
    /// Replaces the attached items and recomputes the total
    pub items: Option<Vec<BookingLineInput>>,
}

/// Outcome of the database lookups a booking request depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceReport {
    pub invoice_taken: bool,
    pub category_missing: bool,
    pub time_slot_missing: bool,
    pub customer_missing: bool,
    /// Positions in `items` whose id does not exist
    pub missing_items: Vec<usize>,
}

/// Validated item line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingLine {
    pub item_id: i32,
    pub price: Decimal,
}

/// Derived money fields of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingTotals {
    pub total_amount: Decimal,
    pub deposit_amount: Decimal,
    pub remaining_balance: Decimal,
}

impl BookingTotals {
    pub fn new(total_amount: Decimal, deposit_amount: Decimal) -> Self {
        let total_amount = money(total_amount);
        let deposit_amount = money(deposit_amount);
        Self {
            total_amount,
            deposit_amount,
            remaining_balance: total_amount - deposit_amount,
        }
    }

    /// Total of the given lines against a deposit
    pub fn from_lines(lines: &[BookingLine], deposit_amount: Decimal) -> Self {
        let total = lines.iter().map(|line| line.price).sum();
        Self::new(total, deposit_amount)
    }
}

/// Round to cents with a fixed scale of two
pub fn money(value: Decimal) -> Decimal {
    let mut value = value.round_dp(2);
    value.rescale(2);
    value
}

/// Every column of a booking row, as it will be written
#[derive(Debug, Clone, PartialEq)]
pub struct BookingFields {
    pub invoice_number: String,
    pub customer_id: Option<i32>,
    pub phone_number: String,
    pub notes: Option<String>,
    pub accessories: Option<String>,
    pub payment_status: PaymentStatus,
    pub category_id: i32,
    pub booking_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub time_slot_id: i32,
    pub totals: BookingTotals,
}

/// Validated booking write; `lines` is `None` when the item set is unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub fields: BookingFields,
    pub lines: Option<Vec<BookingLine>>,
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn date_field(errors: &mut FieldErrors, field: &str, value: &str) -> Option<NaiveDate> {
    let parsed = parse_date(value);
    if parsed.is_none() {
        errors.add(field, format!("The {} is not a valid date", field));
    }
    parsed
}

fn required<'a, T>(errors: &mut FieldErrors, field: &str, value: Option<&'a T>) -> Option<&'a T> {
    if value.is_none() {
        errors.add(field, format!("The {} field is required", field));
    }
    value
}

fn non_blank(errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("The {} field is required", field));
        None
    } else if value.chars().count() > 255 {
        errors.add(field, format!("The {} may not be greater than 255 characters", field));
        None
    } else {
        Some(value.to_string())
    }
}

fn payment_status_field(errors: &mut FieldErrors, value: &str) -> Option<PaymentStatus> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        errors.add("payment_status", "The selected payment_status is invalid");
    }
    parsed
}

fn deposit_field(errors: &mut FieldErrors, value: Decimal) -> Option<Decimal> {
    if value < Decimal::ZERO {
        errors.add("deposit_amount", "The deposit_amount must be at least 0");
        None
    } else if money(value) > max_amount() {
        errors.add(
            "deposit_amount",
            format!("The deposit_amount may not be greater than {}", max_amount()),
        );
        None
    } else {
        Some(value)
    }
}

fn check_references(errors: &mut FieldErrors, refs: &ReferenceReport) {
    if refs.invoice_taken {
        errors.add("invoice_number", "The invoice_number has already been taken");
    }
    if refs.customer_missing {
        errors.add("customer_id", "The selected customer_id is invalid");
    }
    if refs.category_missing {
        errors.add("category_id", "The selected category_id is invalid");
    }
    if refs.time_slot_missing {
        errors.add("time_slot_id", "The selected time_slot_id is invalid");
    }
}

/// Check every item line, reporting problems under `items.N.id` and `items.N.price`
fn check_lines(
    errors: &mut FieldErrors,
    items: &[BookingLineInput],
    missing: &[usize],
) -> Option<Vec<BookingLine>> {
    if items.is_empty() {
        errors.add("items", "The items field must have at least 1 item");
        return None;
    }

    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(items.len());
    let mut ok = true;

    for (index, input) in items.iter().enumerate() {
        let id_field = format!("items.{}.id", index);
        let price_field = format!("items.{}.price", index);

        match input.id {
            None => {
                errors.add(id_field, "The item id field is required");
                ok = false;
            }
            Some(_) if missing.contains(&index) => {
                errors.add(id_field, "The selected item is invalid");
                ok = false;
            }
            Some(id) if !seen.insert(id) => {
                errors.add(id_field, "The item has already been added to this booking");
                ok = false;
            }
            Some(_) => {}
        }

        match input.price {
            None => {
                errors.add(price_field, "The item price field is required");
                ok = false;
            }
            Some(price) if price < Decimal::ZERO => {
                errors.add(price_field, "The item price must be at least 0");
                ok = false;
            }
            Some(price) if money(price) > max_amount() => {
                errors.add(
                    price_field,
                    format!("The item price may not be greater than {}", max_amount()),
                );
                ok = false;
            }
            Some(_) => {}
        }

        if let (Some(item_id), Some(price)) = (input.id, input.price) {
            lines.push(BookingLine {
                item_id,
                price: money(price),
            });
        }
    }

    if !ok {
        return None;
    }
    let total: Decimal = lines.iter().map(|line| line.price).sum();
    if total > max_amount() {
        errors.add(
            "items",
            format!("The total of the items may not be greater than {}", max_amount()),
        );
        return None;
    }
    Some(lines)
}

fn check_return_date(
    errors: &mut FieldErrors,
    booking_date: Option<NaiveDate>,
    return_date: Option<NaiveDate>,
) {
    if let (Some(booking), Some(ret)) = (booking_date, return_date) {
        if ret < booking {
            errors.add(
                "return_date",
                "The return_date must be a date after or equal to booking_date",
            );
        }
    }
}

impl CreateBooking {
    /// Item ids in request order, as needed for the existence lookup
    pub fn item_ids(&self) -> Vec<Option<i32>> {
        self.items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|line| line.id)
            .collect()
    }

    /// Validate the whole request at once; every problem found is reported
    pub fn check(&self, refs: &ReferenceReport) -> Result<BookingDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let invoice_number = required(&mut errors, "invoice_number", self.invoice_number.as_ref())
            .and_then(|v| non_blank(&mut errors, "invoice_number", v));
        let phone_number = required(&mut errors, "phone_number", self.phone_number.as_ref())
            .and_then(|v| non_blank(&mut errors, "phone_number", v));
        let payment_status = required(&mut errors, "payment_status", self.payment_status.as_ref())
            .and_then(|v| payment_status_field(&mut errors, v));
        let deposit_amount = required(&mut errors, "deposit_amount", self.deposit_amount.as_ref())
            .and_then(|v| deposit_field(&mut errors, *v));
        let category_id = required(&mut errors, "category_id", self.category_id.as_ref()).copied();
        let time_slot_id =
            required(&mut errors, "time_slot_id", self.time_slot_id.as_ref()).copied();
        let booking_date = required(&mut errors, "booking_date", self.booking_date.as_ref())
            .and_then(|v| date_field(&mut errors, "booking_date", v));
        let return_date = match self.return_date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                date_field(&mut errors, "return_date", raw).map(Some)
            }
            _ => Some(None),
        };
        check_return_date(&mut errors, booking_date, return_date.flatten());
        check_references(&mut errors, refs);
        let lines = match self.items.as_deref() {
            None => {
                errors.add("items", "The items field is required");
                None
            }
            Some(items) => check_lines(&mut errors, items, &refs.missing_items),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        match (
            invoice_number,
            phone_number,
            payment_status,
            deposit_amount,
            category_id,
            time_slot_id,
            booking_date,
            return_date,
            lines,
        ) {
            (
                Some(invoice_number),
                Some(phone_number),
                Some(payment_status),
                Some(deposit_amount),
                Some(category_id),
                Some(time_slot_id),
                Some(booking_date),
                Some(return_date),
                Some(lines),
            ) => Ok(BookingDraft {
                fields: BookingFields {
                    invoice_number,
                    customer_id: self.customer_id,
                    phone_number,
                    notes: self.notes.clone(),
                    accessories: self.accessories.clone(),
                    payment_status,
                    category_id,
                    booking_date,
                    return_date,
                    time_slot_id,
                    totals: BookingTotals::from_lines(&lines, deposit_amount),
                },
                lines: Some(lines),
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateBooking {
    pub fn item_ids(&self) -> Vec<Option<i32>> {
        self.items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|line| line.id)
            .collect()
    }

    /// Customer id the request points at, if it sets one
    pub fn requested_customer(&self) -> Option<i32> {
        self.customer_id.flatten()
    }

    /// Merge the request into `current` and validate the effective booking.
    ///
    /// The total is recomputed only when `items` is supplied; the remaining
    /// balance is always recomputed from the effective total and deposit.
    pub fn check(
        &self,
        current: &Booking,
        refs: &ReferenceReport,
    ) -> Result<BookingDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let invoice_number = match &self.invoice_number {
            Some(v) => non_blank(&mut errors, "invoice_number", v),
            None => Some(current.invoice_number.clone()),
        };
        let phone_number = match &self.phone_number {
            Some(v) => non_blank(&mut errors, "phone_number", v),
            None => Some(current.phone_number.clone()),
        };
        let payment_status = match &self.payment_status {
            Some(v) => payment_status_field(&mut errors, v),
            None => Some(current.payment_status),
        };
        let deposit_amount = match self.deposit_amount {
            Some(v) => deposit_field(&mut errors, v),
            None => Some(current.deposit_amount),
        };
        let booking_date = match &self.booking_date {
            Some(v) => date_field(&mut errors, "booking_date", v),
            None => Some(current.booking_date),
        };
        let return_date = match &self.return_date {
            Some(Some(raw)) if !raw.trim().is_empty() => {
                date_field(&mut errors, "return_date", raw).map(Some)
            }
            Some(_) => Some(None),
            None => Some(current.return_date),
        };
        check_return_date(&mut errors, booking_date, return_date.flatten());
        check_references(&mut errors, refs);
        let lines = match self.items.as_deref() {
            Some(items) => check_lines(&mut errors, items, &refs.missing_items).map(Some),
            None => Some(None),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        match (
            invoice_number,
            phone_number,
            payment_status,
            deposit_amount,
            booking_date,
            return_date,
            lines,
        ) {
            (
                Some(invoice_number),
                Some(phone_number),
                Some(payment_status),
                Some(deposit_amount),
                Some(booking_date),
                Some(return_date),
                Some(lines),
            ) => {
                let totals = match &lines {
                    Some(lines) => BookingTotals::from_lines(lines, deposit_amount),
                    None => BookingTotals::new(current.total_amount, deposit_amount),
                };
                Ok(BookingDraft {
                    fields: BookingFields {
                        invoice_number,
                        customer_id: self.customer_id.unwrap_or(current.customer_id),
                        phone_number,
                        notes: self.notes.clone().unwrap_or_else(|| current.notes.clone()),
                        accessories: self
                            .accessories
                            .clone()
                            .unwrap_or_else(|| current.accessories.clone()),
                        payment_status,
                        category_id: self.category_id.unwrap_or(current.category_id),
                        booking_date,
                        return_date,
                        time_slot_id: self.time_slot_id.unwrap_or(current.time_slot_id),
                        totals,
                    },
                    lines,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Booking list and export filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookingQuery {
    /// Month (1-12); only applied together with `year`
    pub month: Option<u32>,
    pub year: Option<i32>,
    /// Exact booking date
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound on booking date
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on booking date
    pub date_to: Option<NaiveDate>,
    /// Only applied together with `week_end`
    pub week_start: Option<NaiveDate>,
    pub week_end: Option<NaiveDate>,
    pub category_id: Option<i32>,
    pub payment_status: Option<String>,
    pub time_slot_id: Option<i32>,
    /// Matches invoice number, booking phone, customer name or customer phone
    pub search: Option<String>,
    /// booking_date, created_at, invoice_number, total_amount, payment_amount or payment_status
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Predicates shared by the booking list and the export.
///
/// Expects the query to alias bookings as `b` and the left-joined customers as `c`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub month: Option<(NaiveDate, NaiveDate)>,
    pub date: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub week: Option<(NaiveDate, NaiveDate)>,
    pub category_id: Option<i32>,
    pub payment_status: Option<String>,
    pub time_slot_id: Option<i32>,
    pub search: Option<String>,
}

/// First day of the month and first day of the following month
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next))
}

impl BookingFilter {
    pub fn from_query(query: &BookingQuery) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let month = match (query.month, query.year) {
            (Some(month), Some(year)) => {
                let bounds = month_bounds(year, month);
                if bounds.is_none() {
                    errors.add("month", "The month must be between 1 and 12");
                }
                bounds
            }
            _ => None,
        };
        let week = match (query.week_start, query.week_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            month,
            date: query.date,
            date_from: query.date_from,
            date_to: query.date_to,
            week,
            category_id: query.category_id,
            payment_status: query.payment_status.clone().filter(|s| !s.is_empty()),
            time_slot_id: query.time_slot_id,
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    /// Append ` AND ...` conditions for every active filter
    pub fn push_conditions<'a>(&self, qb: &mut QueryBuilder<'a, Postgres>) {
        if let Some((first, next)) = self.month {
            qb.push(" AND b.booking_date >= ").push_bind(first);
            qb.push(" AND b.booking_date < ").push_bind(next);
        }
        if let Some(date) = self.date {
            qb.push(" AND b.booking_date = ").push_bind(date);
        }
        if let Some(from) = self.date_from {
            qb.push(" AND b.booking_date >= ").push_bind(from);
        }
        if let Some(to) = self.date_to {
            qb.push(" AND b.booking_date <= ").push_bind(to);
        }
        if let Some((start, end)) = self.week {
            qb.push(" AND b.booking_date BETWEEN ")
                .push_bind(start)
                .push(" AND ")
                .push_bind(end);
        }
        if let Some(category_id) = self.category_id {
            qb.push(" AND b.category_id = ").push_bind(category_id);
        }
        if let Some(status) = &self.payment_status {
            qb.push(" AND b.payment_status = ").push_bind(status.clone());
        }
        if let Some(time_slot_id) = self.time_slot_id {
            qb.push(" AND b.time_slot_id = ").push_bind(time_slot_id);
        }
        if let Some(search) = &self.search {
            let pattern = like_pattern(search);
            qb.push(" AND (b.invoice_number ILIKE ").push_bind(pattern.clone());
            qb.push(" OR b.phone_number ILIKE ").push_bind(pattern.clone());
            qb.push(" OR c.name ILIKE ").push_bind(pattern.clone());
            qb.push(" OR c.phone_number ILIKE ").push_bind(pattern);
            qb.push(")");
        }
    }
}

/// Allow-listed booking sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSort {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Default for BookingSort {
    fn default() -> Self {
        Self {
            column: "booking_date",
            direction: SortDirection::Desc,
        }
    }
}

impl BookingSort {
    /// Unknown sort keys fall back to booking date, newest first
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let column = match sort_by {
            Some("booking_date") => "booking_date",
            Some("created_at") => "created_at",
            Some("invoice_number") => "invoice_number",
            Some("total_amount") | Some("payment_amount") => "total_amount",
            Some("payment_status") => "payment_status",
            _ => return Self::default(),
        };
        Self {
            column,
            direction: SortDirection::parse(sort_order),
        }
    }

    /// ORDER BY body (without the keyword)
    pub fn order_by(&self) -> String {
        let dir = self.direction.as_sql();
        if self.column == "booking_date" {
            format!("b.booking_date {}, b.time_slot_id ASC, b.id {}", dir, dir)
        } else {
            format!("b.{} {}, b.id {}", self.column, dir, dir)
        }
    }
}

/// Column headers of the booking export
pub const EXPORT_HEADERS: [&str; 15] = [
    "Invoice Number",
    "Customer Name",
    "Phone Number",
    "Items",
    "Category",
    "Booking Date",
    "Time Slot",
    "Return Date",
    "Payment Status",
    "Total Amount",
    "Deposit",
    "Balance",
    "Notes",
    "Accessories",
    "Created At",
];

/// Flattened booking for spreadsheet export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingExportRow {
    pub invoice_number: String,
    pub customer_name: String,
    pub phone_number: String,
    pub items: String,
    pub category: String,
    pub booking_date: String,
    pub time_slot: String,
    pub return_date: String,
    pub payment_status: String,
    pub total_amount: String,
    pub deposit_amount: String,
    pub remaining_balance: String,
    pub notes: String,
    pub accessories: String,
    pub created_at: String,
}

impl From<&BookingDetails> for BookingExportRow {
    fn from(details: &BookingDetails) -> Self {
        let booking = &details.booking;
        Self {
            invoice_number: booking.invoice_number.clone(),
            customer_name: details
                .customer
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Walk-in".to_string()),
            phone_number: details
                .customer
                .as_ref()
                .map(|c| c.phone_number.clone())
                .unwrap_or_else(|| booking.phone_number.clone()),
            items: details
                .items
                .iter()
                .map(|line| line.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            category: details
                .category
                .as_ref()
                .map(|c| c.name_en.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            booking_date: booking.booking_date.format("%Y-%m-%d").to_string(),
            time_slot: details
                .time_slot
                .as_ref()
                .map(TimeSlot::label)
                .unwrap_or_else(|| "N/A".to_string()),
            return_date: booking
                .return_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            payment_status: booking.payment_status.to_string(),
            total_amount: money(booking.total_amount).to_string(),
            deposit_amount: money(booking.deposit_amount).to_string(),
            remaining_balance: money(booking.remaining_balance).to_string(),
            notes: booking.notes.clone().unwrap_or_default(),
            accessories: booking.accessories.clone().unwrap_or_default(),
            created_at: booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl BookingExportRow {
    fn values(&self) -> [&str; 15] {
        [
            &self.invoice_number,
            &self.customer_name,
            &self.phone_number,
            &self.items,
            &self.category,
            &self.booking_date,
            &self.time_slot,
            &self.return_date,
            &self.payment_status,
            &self.total_amount,
            &self.deposit_amount,
            &self.remaining_balance,
            &self.notes,
            &self.accessories,
            &self.created_at,
        ]
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(values: &[&str]) -> String {
    let mut line = values.iter().map(|v| csv_field(v)).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

/// Render rows as CSV with a header line
pub fn write_csv(rows: &[BookingExportRow]) -> String {
    let mut out = csv_line(&EXPORT_HEADERS);
    for row in rows {
        out.push_str(&csv_line(&row.values()));
    }
    out
}

/// Attachment name for an export started at `now`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("bookings_{}.csv", now.format("%Y-%m-%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn line(id: i32, price: Decimal) -> BookingLineInput {
        BookingLineInput {
            id: Some(id),
            price: Some(price),
        }
    }

    fn valid_create() -> CreateBooking {
        CreateBooking {
            invoice_number: Some("INV-001".to_string()),
            customer_id: None,
            phone_number: Some("0500000000".to_string()),
            notes: None,
            accessories: Some("Veil".to_string()),
            payment_status: Some("partial".to_string()),
            deposit_amount: Some(dec("30")),
            category_id: Some(1),
            booking_date: Some("2026-01-15".to_string()),
            return_date: Some("2026-01-17".to_string()),
            time_slot_id: Some(2),
            items: Some(vec![line(10, dec("100.00")), line(11, dec("50.00"))]),
        }
    }

    fn stored(draft: &BookingDraft) -> Booking {
        let f = &draft.fields;
        Booking {
            id: 1,
            invoice_number: f.invoice_number.clone(),
            customer_id: f.customer_id,
            phone_number: f.phone_number.clone(),
            notes: f.notes.clone(),
            accessories: f.accessories.clone(),
            payment_status: f.payment_status,
            total_amount: f.totals.total_amount,
            deposit_amount: f.totals.deposit_amount,
            remaining_balance: f.totals.remaining_balance,
            category_id: f.category_id,
            booking_date: f.booking_date,
            return_date: f.return_date,
            time_slot_id: f.time_slot_id,
            user_id: Some(1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn create_computes_totals_from_lines() {
        let draft = valid_create().check(&ReferenceReport::default()).unwrap();
        let totals = draft.fields.totals;
        assert_eq!(totals.total_amount.to_string(), "150.00");
        assert_eq!(totals.remaining_balance.to_string(), "120.00");
        assert_eq!(draft.lines.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn create_reports_every_violation() {
        let mut request = valid_create();
        request.phone_number = None;
        request.payment_status = Some("refunded".to_string());
        request.deposit_amount = Some(dec("-1"));
        request.return_date = Some("2026-01-10".to_string());
        request.items = Some(vec![
            line(10, dec("-5")),
            BookingLineInput { id: None, price: None },
            line(10, dec("5")),
        ]);
        let refs = ReferenceReport {
            invoice_taken: true,
            category_missing: true,
            time_slot_missing: true,
            customer_missing: false,
            missing_items: vec![],
        };

        let errors = request.check(&refs).unwrap_err();
        for field in [
            "invoice_number",
            "phone_number",
            "payment_status",
            "deposit_amount",
            "return_date",
            "category_id",
            "time_slot_id",
            "items.0.price",
            "items.1.id",
            "items.1.price",
            "items.2.id",
        ] {
            assert!(errors.contains(field), "expected an error for {}", field);
        }
        assert!(!errors.contains("items.0.id"));
    }

    #[test]
    fn create_rejects_missing_or_empty_items() {
        let mut request = valid_create();
        request.items = Some(vec![]);
        assert!(request.check(&ReferenceReport::default()).unwrap_err().contains("items"));

        request.items = None;
        assert!(request.check(&ReferenceReport::default()).unwrap_err().contains("items"));

        let mut request = valid_create();
        let refs = ReferenceReport {
            missing_items: vec![1],
            ..Default::default()
        };
        let errors = request.check(&refs).unwrap_err();
        assert!(errors.contains("items.1.id"));
        request.booking_date = Some("15/01/2026".to_string());
        assert!(request.check(&ReferenceReport::default()).unwrap_err().contains("booking_date"));
    }

    #[test]
    fn amounts_beyond_column_range_are_field_errors() {
        let mut request = valid_create();
        request.deposit_amount = Some(dec("100000000"));
        request.items = Some(vec![line(10, dec("1000000000")), line(11, dec("5"))]);
        let errors = request.check(&ReferenceReport::default()).unwrap_err();
        assert!(errors.contains("deposit_amount"));
        assert!(errors.contains("items.0.price"));
        assert!(!errors.contains("items.1.price"));
        // Checks keep running past the money errors
        request.phone_number = Some("  ".to_string());
        assert!(request.check(&ReferenceReport::default()).unwrap_err().contains("phone_number"));

        let mut request = valid_create();
        request.items = Some(vec![line(10, dec("60000000")), line(11, dec("60000000"))]);
        let errors = request.check(&ReferenceReport::default()).unwrap_err();
        assert!(errors.contains("items"));
        assert!(!errors.contains("items.0.price"));

        let current = stored(&valid_create().check(&ReferenceReport::default()).unwrap());
        let update = UpdateBooking {
            items: Some(vec![line(10, dec("60000000")), line(11, dec("60000000"))]),
            deposit_amount: Some(dec("100000000")),
            ..Default::default()
        };
        let errors = update.check(&current, &ReferenceReport::default()).unwrap_err();
        assert!(errors.contains("items"));
        assert!(errors.contains("deposit_amount"));
    }

    #[test]
    fn invoice_number_is_stored_trimmed() {
        let mut request = valid_create();
        request.invoice_number = Some("  INV-002 ".to_string());
        let draft = request.check(&ReferenceReport::default()).unwrap();
        assert_eq!(draft.fields.invoice_number, "INV-002");

        let current = stored(&draft);
        let update = UpdateBooking {
            invoice_number: Some("INV-003\t".to_string()),
            ..Default::default()
        };
        let draft = update.check(&current, &ReferenceReport::default()).unwrap();
        assert_eq!(draft.fields.invoice_number, "INV-003");
    }

    #[test]
    fn deposit_above_total_leaves_negative_balance() {
        let mut request = valid_create();
        request.deposit_amount = Some(dec("200"));
        let draft = request.check(&ReferenceReport::default()).unwrap();
        assert_eq!(draft.fields.totals.remaining_balance, dec("-50.00"));
    }

    #[test]
    fn update_deposit_recomputes_balance_only() {
        let current = stored(&valid_create().check(&ReferenceReport::default()).unwrap());
        let request = UpdateBooking {
            deposit_amount: Some(dec("50")),
            ..Default::default()
        };
        let draft = request.check(&current, &ReferenceReport::default()).unwrap();
        assert!(draft.lines.is_none());
        assert_eq!(draft.fields.totals.total_amount.to_string(), "150.00");
        assert_eq!(draft.fields.totals.remaining_balance.to_string(), "100.00");
        assert_eq!(draft.fields.accessories.as_deref(), Some("Veil"));
    }

    #[test]
    fn update_items_replaces_total() {
        let current = stored(&valid_create().check(&ReferenceReport::default()).unwrap());
        let request = UpdateBooking {
            items: Some(vec![line(12, dec("80"))]),
            ..Default::default()
        };
        let draft = request.check(&current, &ReferenceReport::default()).unwrap();
        assert_eq!(draft.fields.totals.total_amount, dec("80.00"));
        assert_eq!(draft.fields.totals.remaining_balance, dec("50.00"));
        assert_eq!(draft.lines.unwrap(), vec![BookingLine { item_id: 12, price: dec("80.00") }]);
    }

    #[test]
    fn update_null_clears_nullable_fields() {
        let current = stored(&valid_create().check(&ReferenceReport::default()).unwrap());
        let request: UpdateBooking =
            serde_json::from_str(r#"{"accessories": null, "return_date": null}"#).unwrap();
        let draft = request.check(&current, &ReferenceReport::default()).unwrap();
        assert_eq!(draft.fields.accessories, None);
        assert_eq!(draft.fields.return_date, None);

        let untouched: UpdateBooking = serde_json::from_str("{}").unwrap();
        let draft = untouched.check(&current, &ReferenceReport::default()).unwrap();
        assert_eq!(draft.fields.accessories.as_deref(), Some("Veil"));
        assert!(draft.fields.return_date.is_some());
    }

    #[test]
    fn update_checks_return_date_against_effective_booking_date() {
        let current = stored(&valid_create().check(&ReferenceReport::default()).unwrap());
        let request = UpdateBooking {
            booking_date: Some("2026-01-20".to_string()),
            ..Default::default()
        };
        let errors = request.check(&current, &ReferenceReport::default()).unwrap_err();
        assert!(errors.contains("return_date"));
    }

    #[test]
    fn sort_falls_back_to_booking_date() {
        let sort = BookingSort::parse(Some("drop table"), Some("asc"));
        assert_eq!(sort, BookingSort::default());
        assert_eq!(sort.order_by(), "b.booking_date DESC, b.time_slot_id ASC, b.id DESC");

        let sort = BookingSort::parse(Some("payment_amount"), Some("asc"));
        assert_eq!(sort.column, "total_amount");
        assert_eq!(sort.order_by(), "b.total_amount ASC, b.id ASC");

        let sort = BookingSort::parse(Some("booking_date"), Some("asc"));
        assert!(sort.order_by().contains("b.time_slot_id ASC"));
    }

    #[test]
    fn filter_builds_conditions() {
        let query = BookingQuery {
            month: Some(12),
            year: Some(2025),
            category_id: Some(3),
            search: Some(" 050 ".to_string()),
            ..Default::default()
        };
        let filter = BookingFilter::from_query(&query).unwrap();
        assert_eq!(
            filter.month,
            Some((
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
            ))
        );

        let mut qb = QueryBuilder::<Postgres>::new("SELECT b.id FROM bookings b WHERE 1=1");
        filter.push_conditions(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("b.booking_date >= $1 AND b.booking_date < $2"));
        assert!(sql.contains("b.category_id = $3"));
        assert!(sql.contains("c.name ILIKE $6"));
        assert!(sql.contains("c.phone_number ILIKE $7)"));
    }

    #[test]
    fn filter_ignores_half_pairs_and_rejects_bad_month() {
        let query = BookingQuery {
            month: Some(5),
            week_start: NaiveDate::from_ymd_opt(2026, 1, 4),
            ..Default::default()
        };
        assert_eq!(BookingFilter::from_query(&query).unwrap(), BookingFilter::default());

        let query = BookingQuery {
            month: Some(13),
            year: Some(2025),
            ..Default::default()
        };
        assert!(BookingFilter::from_query(&query).unwrap_err().contains("month"));
    }

    #[test]
    fn export_row_uses_fallbacks_and_csv_quotes() {
        let draft = valid_create().check(&ReferenceReport::default()).unwrap();
        let mut booking = stored(&draft);
        booking.notes = Some("hem, then \"press\"".to_string());
        booking.created_at = Utc.with_ymd_and_hms(2026, 1, 10, 9, 5, 0).unwrap();
        let details = BookingDetails {
            booking,
            category: None,
            time_slot: Some(TimeSlot {
                id: 2,
                start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }),
            customer: None,
            user: None,
            items: vec![
                BookingItemLine {
                    booking_id: 1,
                    id: 10,
                    name: "Gown".into(),
                    price_at_booking: dec("100"),
                },
                BookingItemLine {
                    booking_id: 1,
                    id: 11,
                    name: "Shawl".into(),
                    price_at_booking: dec("50"),
                },
            ],
        };

        let row = BookingExportRow::from(&details);
        assert_eq!(row.customer_name, "Walk-in");
        assert_eq!(row.phone_number, "0500000000");
        assert_eq!(row.category, "N/A");
        assert_eq!(row.items, "Gown, Shawl");
        assert_eq!(row.time_slot, "10:00-11:00");
        assert_eq!(row.created_at, "2026-01-10 09:05:00");

        let csv = write_csv(&[row]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().map(|l| l.starts_with("Invoice Number,Customer Name")), Some(true));
        let data = lines.next().unwrap();
        assert!(data.starts_with(concat!(
            "INV-001,Walk-in,0500000000,\"Gown, Shawl\",N/A,2026-01-15,10:00-11:00,",
            "2026-01-17,partial,150.00,30.00,120.00,"
        )));
        assert!(data.contains("\"hem, then \"\"press\"\"\""));
    }

    #[test]
    fn export_filename_has_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(export_filename(now), "bookings_2026-03-04_050607.csv");
    }
}
