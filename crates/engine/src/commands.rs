//! Command structs for engine operations.
//!
//! These types group parameters for write operations (booking create/update,
//! package and expense maintenance), keeping call sites readable and avoiding
//! long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{HotelTier, ItineraryDay, Money, PackageKind, PaymentStatus};

/// Create a booking.
///
/// Missing money fields fall back to the package terms (all-in rate and
/// overtime rate) or to zero.
#[derive(Clone, Debug)]
pub struct NewBookingCmd {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    /// Defaults to the engine clock's "now".
    pub booking_date: Option<DateTime<Utc>>,
    pub checkout_at: DateTime<Utc>,
    pub checkin_at: DateTime<Utc>,
    pub all_in_rate: Option<Money>,
    pub overtime_rate_per_hour: Option<Money>,
    pub fuel_cost: Option<Money>,
    pub driver_fee: Option<Money>,
    pub payment_status: Option<PaymentStatus>,
    pub note: Option<String>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
}

impl NewBookingCmd {
    #[must_use]
    pub fn new(
        customer_name: impl Into<String>,
        checkout_at: DateTime<Utc>,
        checkin_at: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_phone: None,
            booking_date: None,
            checkout_at,
            checkin_at,
            all_in_rate: None,
            overtime_rate_per_hour: None,
            fuel_cost: None,
            driver_fee: None,
            payment_status: None,
            note: None,
            vehicle_id: None,
            driver_id: None,
            package_id: None,
        }
    }

    #[must_use]
    pub fn customer_phone(mut self, phone: impl Into<String>) -> Self {
        self.customer_phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn booking_date(mut self, booking_date: DateTime<Utc>) -> Self {
        self.booking_date = Some(booking_date);
        self
    }

    #[must_use]
    pub fn all_in_rate(mut self, amount: Money) -> Self {
        self.all_in_rate = Some(amount);
        self
    }

    #[must_use]
    pub fn overtime_rate_per_hour(mut self, amount: Money) -> Self {
        self.overtime_rate_per_hour = Some(amount);
        self
    }

    #[must_use]
    pub fn fuel_cost(mut self, amount: Money) -> Self {
        self.fuel_cost = Some(amount);
        self
    }

    #[must_use]
    pub fn driver_fee(mut self, amount: Money) -> Self {
        self.driver_fee = Some(amount);
        self
    }

    #[must_use]
    pub fn payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn vehicle_id(mut self, vehicle_id: Uuid) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }

    #[must_use]
    pub fn driver_id(mut self, driver_id: Uuid) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    #[must_use]
    pub fn package_id(mut self, package_id: Uuid) -> Self {
        self.package_id = Some(package_id);
        self
    }
}

/// Update an existing booking. `None` keeps the stored value.
///
/// Text fields set to an empty string are cleared. `package_id` is
/// `Some(None)` to detach the package.
#[derive(Clone, Debug, Default)]
pub struct UpdateBookingCmd {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub booking_date: Option<DateTime<Utc>>,
    pub checkout_at: Option<DateTime<Utc>>,
    pub checkin_at: Option<DateTime<Utc>>,
    pub all_in_rate: Option<Money>,
    pub overtime_rate_per_hour: Option<Money>,
    pub fuel_cost: Option<Money>,
    pub driver_fee: Option<Money>,
    pub note: Option<String>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub package_id: Option<Option<Uuid>>,
}

impl UpdateBookingCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.customer_phone.is_none()
            && self.booking_date.is_none()
            && self.checkout_at.is_none()
            && self.checkin_at.is_none()
            && self.all_in_rate.is_none()
            && self.overtime_rate_per_hour.is_none()
            && self.fuel_cost.is_none()
            && self.driver_fee.is_none()
            && self.note.is_none()
            && self.vehicle_id.is_none()
            && self.driver_id.is_none()
            && self.package_id.is_none()
    }

    #[must_use]
    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn customer_phone(mut self, phone: impl Into<String>) -> Self {
        self.customer_phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn booking_date(mut self, booking_date: DateTime<Utc>) -> Self {
        self.booking_date = Some(booking_date);
        self
    }

    #[must_use]
    pub fn checkout_at(mut self, checkout_at: DateTime<Utc>) -> Self {
        self.checkout_at = Some(checkout_at);
        self
    }

    #[must_use]
    pub fn checkin_at(mut self, checkin_at: DateTime<Utc>) -> Self {
        self.checkin_at = Some(checkin_at);
        self
    }

    #[must_use]
    pub fn all_in_rate(mut self, amount: Money) -> Self {
        self.all_in_rate = Some(amount);
        self
    }

    #[must_use]
    pub fn overtime_rate_per_hour(mut self, amount: Money) -> Self {
        self.overtime_rate_per_hour = Some(amount);
        self
    }

    #[must_use]
    pub fn fuel_cost(mut self, amount: Money) -> Self {
        self.fuel_cost = Some(amount);
        self
    }

    #[must_use]
    pub fn driver_fee(mut self, amount: Money) -> Self {
        self.driver_fee = Some(amount);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn vehicle_id(mut self, vehicle_id: Uuid) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }

    #[must_use]
    pub fn driver_id(mut self, driver_id: Uuid) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    #[must_use]
    pub fn package_id(mut self, package_id: Uuid) -> Self {
        self.package_id = Some(Some(package_id));
        self
    }

    #[must_use]
    pub fn clear_package(mut self) -> Self {
        self.package_id = Some(None);
        self
    }
}

/// Create or fully replace a service package.
#[derive(Clone, Debug)]
pub struct NewPackageCmd {
    pub name: String,
    pub kind: PackageKind,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub overtime_rate_per_hour: Option<Money>,
    pub base_duration_hours: Option<i64>,
    pub hotel_tiers: Vec<HotelTier>,
    pub itinerary: Vec<ItineraryDay>,
}

impl NewPackageCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PackageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            price: None,
            overtime_rate_per_hour: None,
            base_duration_hours: None,
            hotel_tiers: Vec::new(),
            itinerary: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn overtime_rate_per_hour(mut self, amount: Money) -> Self {
        self.overtime_rate_per_hour = Some(amount);
        self
    }

    #[must_use]
    pub fn base_duration_hours(mut self, hours: i64) -> Self {
        self.base_duration_hours = Some(hours);
        self
    }

    #[must_use]
    pub fn hotel_tier(mut self, tier: HotelTier) -> Self {
        self.hotel_tiers.push(tier);
        self
    }

    #[must_use]
    pub fn itinerary_day(mut self, day: ItineraryDay) -> Self {
        self.itinerary.push(day);
        self
    }
}

/// Record an operating expense.
#[derive(Clone, Debug)]
pub struct NewExpenseCmd {
    pub spent_at: DateTime<Utc>,
    pub category: String,
    pub amount: Money,
    pub description: Option<String>,
    pub vehicle_id: Option<Uuid>,
}

impl NewExpenseCmd {
    #[must_use]
    pub fn new(spent_at: DateTime<Utc>, category: impl Into<String>, amount: Money) -> Self {
        Self {
            spent_at,
            category: category.into(),
            amount,
            description: None,
            vehicle_id: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn vehicle_id(mut self, vehicle_id: Uuid) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }
}
