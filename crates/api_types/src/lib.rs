use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Error body returned by the server for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// One of `validation`, `not_found`, `conflict`, `store`.
    pub kind: String,
    pub error: String,
}

/// Distinguishes a missing field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub mod booking {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum PaymentStatus {
        Unpaid,
        DownPayment,
        Paid,
    }

    /// Request body for creating a booking.
    ///
    /// Money fields are whole rupiah. Rates left out are taken from the
    /// package, if any; costs left out count as zero.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingNew {
        pub customer_name: String,
        pub customer_phone: Option<String>,
        pub booking_date: Option<DateTime<FixedOffset>>,
        pub checkout_at: DateTime<FixedOffset>,
        pub checkin_at: DateTime<FixedOffset>,
        pub all_in_rate: Option<i64>,
        pub overtime_rate_per_hour: Option<i64>,
        pub fuel_cost: Option<i64>,
        pub driver_fee: Option<i64>,
        pub payment_status: Option<PaymentStatus>,
        pub note: Option<String>,
        pub vehicle_id: Option<Uuid>,
        pub driver_id: Option<Uuid>,
        pub package_id: Option<Uuid>,
    }

    /// Request body for a partial booking update.
    ///
    /// `package_id: null` detaches the package; leaving it out keeps it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookingUpdate {
        pub customer_name: Option<String>,
        pub customer_phone: Option<String>,
        pub booking_date: Option<DateTime<FixedOffset>>,
        pub checkout_at: Option<DateTime<FixedOffset>>,
        pub checkin_at: Option<DateTime<FixedOffset>>,
        pub all_in_rate: Option<i64>,
        pub overtime_rate_per_hour: Option<i64>,
        pub fuel_cost: Option<i64>,
        pub driver_fee: Option<i64>,
        pub note: Option<String>,
        pub vehicle_id: Option<Uuid>,
        pub driver_id: Option<Uuid>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub package_id: Option<Option<Uuid>>,
    }

    /// The status is a plain string so unknown values reach the engine and
    /// are rejected there with a validation error.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentStatusUpdate {
        pub payment_status: String,
    }

    /// Query string of `GET /bookings`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookingList {
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub vehicle_id: Option<Uuid>,
        pub driver_id: Option<Uuid>,
        pub payment_status: Option<PaymentStatus>,
        pub limit: Option<u64>,
        pub cursor: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FinancialsView {
        pub rental_hours: i64,
        pub overtime_hours: i64,
        pub overtime_fee: i64,
        pub total_revenue: i64,
        pub total_operational_cost: i64,
        pub gross_profit: i64,
    }

    /// A booking with its derived figures.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BookingView {
        pub id: Uuid,
        pub invoice_code: String,
        pub customer_name: String,
        pub customer_phone: Option<String>,
        pub booking_date: DateTime<FixedOffset>,
        pub checkout_at: DateTime<FixedOffset>,
        pub checkin_at: DateTime<FixedOffset>,
        pub all_in_rate: i64,
        pub overtime_rate_per_hour: i64,
        pub fuel_cost: i64,
        pub driver_fee: i64,
        pub base_duration_hours: Option<i64>,
        pub payment_status: PaymentStatus,
        pub note: Option<String>,
        pub vehicle_id: Uuid,
        pub driver_id: Uuid,
        pub package_id: Option<Uuid>,
        pub financials: FinancialsView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingListResponse {
        pub bookings: Vec<BookingView>,
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingCancelled {
        pub id: Uuid,
        pub invoice_code: String,
        pub vehicle_released: bool,
        pub driver_released: bool,
    }
}

pub mod fleet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VehicleNew {
        pub plate: String,
        pub brand: String,
        pub model: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DriverNew {
        pub name: String,
        pub phone: Option<String>,
    }

    /// Administrative availability change, e.g. `{"availability": "MAINTENANCE"}`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AvailabilityUpdate {
        pub availability: String,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub spent_at: DateTime<FixedOffset>,
        pub category: String,
        pub amount: i64,
        pub description: Option<String>,
        pub vehicle_id: Option<Uuid>,
    }

    /// Query string of `GET /expenses`. Both bounds or neither.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
    }
}

pub mod finance {
    use super::*;

    /// Booking-shaped input of the calculator endpoints.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RentalTerms {
        pub checkout_at: DateTime<FixedOffset>,
        pub checkin_at: DateTime<FixedOffset>,
        pub all_in_rate: Option<i64>,
        pub overtime_rate_per_hour: Option<i64>,
        pub fuel_cost: Option<i64>,
        pub driver_fee: Option<i64>,
        pub base_duration_hours: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ValidationView {
        pub valid: bool,
        pub violations: Vec<String>,
    }
}

pub mod pricing {
    use super::*;

    /// One pax band. Pax counts are floats so blank or garbled input is
    /// reported by the validator instead of failing deserialization.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PriceBand {
        pub min_pax: f64,
        pub max_pax: f64,
        pub price: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TierValidate {
        pub price_ranges: Vec<PriceBand>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BandErrorView {
        pub index: usize,
        pub message: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverlapView {
        pub first: usize,
        pub second: usize,
        pub first_range: (f64, f64),
        pub second_range: (f64, f64),
        pub message: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TierReportView {
        pub valid: bool,
        pub errors: Vec<BandErrorView>,
        pub overlaps: Vec<OverlapView>,
    }
}

pub mod stats {
    use super::*;

    /// Query string of `GET /stats/dashboard`.
    ///
    /// `from`/`to` are local calendar dates, both inclusive; when given they
    /// override the period window but the period still picks the bucket size.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DashboardQuery {
        pub period: Option<String>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    /// Query string of `GET /reports/summary`. Local dates, both inclusive.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReportQuery {
        pub from: NaiveDate,
        pub to: NaiveDate,
    }
}
