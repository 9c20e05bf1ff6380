//! Bookings ("transactions" in the back office) and their payment status.
//!
//! A booking stores only the raw terms it was made with. Revenue, cost and
//! profit are never stored; [`Booking::terms`] feeds them to
//! [`finance::compute`](crate::finance::compute) at read time.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money,
    finance::{self, FinancialSummary, RentalTerms},
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    DownPayment,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::DownPayment => "DOWN_PAYMENT",
            Self::Paid => "PAID",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "UNPAID" => Ok(Self::Unpaid),
            "DOWN_PAYMENT" => Ok(Self::DownPayment),
            "PAID" => Ok(Self::Paid),
            other => Err(EngineError::Validation(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub invoice_code: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub booking_date: DateTime<Utc>,
    pub checkout_at: DateTime<Utc>,
    pub checkin_at: DateTime<Utc>,
    pub all_in_rate: Money,
    pub overtime_rate_per_hour: Money,
    pub fuel_cost: Money,
    pub driver_fee: Money,
    /// Copied from the package when the booking was made.
    pub base_duration_hours: Option<i64>,
    pub payment_status: PaymentStatus,
    pub note: Option<String>,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub package_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn terms(&self) -> RentalTerms {
        RentalTerms {
            checkout_at: self.checkout_at,
            checkin_at: self.checkin_at,
            all_in_rate: Some(self.all_in_rate),
            overtime_rate_per_hour: Some(self.overtime_rate_per_hour),
            fuel_cost: Some(self.fuel_cost),
            driver_fee: Some(self.driver_fee),
            base_duration_hours: self.base_duration_hours,
        }
    }

    pub fn financials(&self) -> FinancialSummary {
        finance::compute(&self.terms())
    }
}

/// A booking removed by a cancellation, with the resources it released.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledBooking {
    pub booking: Booking,
    pub vehicle_released: bool,
    pub driver_released: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub invoice_code: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub booking_date: DateTimeUtc,
    pub checkout_at: DateTimeUtc,
    pub checkin_at: DateTimeUtc,
    pub all_in_rate: i64,
    pub overtime_rate_per_hour: i64,
    pub fuel_cost: i64,
    pub driver_fee: i64,
    pub base_duration_hours: Option<i64>,
    pub payment_status: String,
    pub note: Option<String>,
    pub vehicle_id: String,
    pub driver_id: String,
    pub package_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Booking {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "booking")?,
            invoice_code: model.invoice_code,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            booking_date: model.booking_date,
            checkout_at: model.checkout_at,
            checkin_at: model.checkin_at,
            all_in_rate: Money::new(model.all_in_rate),
            overtime_rate_per_hour: Money::new(model.overtime_rate_per_hour),
            fuel_cost: Money::new(model.fuel_cost),
            driver_fee: Money::new(model.driver_fee),
            base_duration_hours: model.base_duration_hours,
            payment_status: PaymentStatus::try_from(model.payment_status.as_str())?,
            note: model.note,
            vehicle_id: parse_uuid(&model.vehicle_id, "vehicle")?,
            driver_id: parse_uuid(&model.driver_id, "driver")?,
            package_id: parse_optional_uuid(model.package_id.as_deref(), "package")?,
            created_at: model.created_at,
        })
    }
}
