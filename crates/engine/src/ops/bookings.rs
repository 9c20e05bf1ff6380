use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    AssignmentGuard, Booking, CancelPolicy, CancelledBooking, DriverAvailability, EngineError,
    Money, NewBookingCmd, PaymentStatus, ReassignPolicy, ResultEngine, ServicePackage,
    UpdateBookingCmd, VehicleAvailability, bookings, drivers,
    finance::FinancialSummary,
    invoice::invoice_code,
    util::{
        apply_optional_text_patch, ensure_not_negative, normalize_optional_text,
        normalize_required_name,
    },
    vehicles,
};

use super::{Engine, with_tx};

/// Filters for listing bookings.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC and
/// applied to the booking date.
#[derive(Clone, Debug, Default)]
pub struct BookingListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
}

fn validate_list_filter(filter: &BookingListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::Validation(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

trait ApplyBookingFilters: QueryFilter + Sized {
    fn apply_booking_filters(self, filter: &BookingListFilter) -> Self;
}

impl<T> ApplyBookingFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_booking_filters(mut self, filter: &BookingListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(bookings::Column::BookingDate.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(bookings::Column::BookingDate.lt(to));
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            self = self.filter(bookings::Column::VehicleId.eq(vehicle_id.to_string()));
        }
        if let Some(driver_id) = filter.driver_id {
            self = self.filter(bookings::Column::DriverId.eq(driver_id.to_string()));
        }
        if let Some(status) = filter.payment_status {
            self = self.filter(bookings::Column::PaymentStatus.eq(status.as_str()));
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct BookingsCursor {
    booking_date: DateTime<Utc>,
    booking_id: String,
}

impl BookingsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::Validation("invalid bookings cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::Validation("invalid bookings cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::Validation("invalid bookings cursor".to_string()))
    }
}

fn ensure_time_order(checkout_at: DateTime<Utc>, checkin_at: DateTime<Utc>) -> ResultEngine<()> {
    if checkin_at <= checkout_at {
        return Err(EngineError::Validation(
            "check-in must be after check-out".to_string(),
        ));
    }
    Ok(())
}

fn ensure_money_fields(fields: [(Option<Money>, &str); 4]) -> ResultEngine<()> {
    for (value, label) in fields {
        if let Some(value) = value {
            ensure_not_negative(value, label)?;
        }
    }
    Ok(())
}

/// Rates a booking takes from its package when the caller leaves them out.
struct PackageTerms {
    attached: bool,
    all_in_rate: Option<Money>,
    overtime_rate_per_hour: Option<Money>,
    base_duration_hours: Option<i64>,
}

impl PackageTerms {
    fn of(package: Option<&ServicePackage>) -> Self {
        let rates = package.and_then(ServicePackage::flat_rates);
        Self {
            attached: package.is_some(),
            all_in_rate: rates.map(|(price, _)| price),
            overtime_rate_per_hour: rates.map(|(_, overtime)| overtime),
            base_duration_hours: package.and_then(ServicePackage::base_duration_hours),
        }
    }

    /// All-in and overtime rates of a booking under these terms. Explicit
    /// values win over the package's flat rates; a package without flat rates
    /// needs an explicit all-in rate.
    fn rates(
        &self,
        all_in_rate: Option<Money>,
        overtime_rate_per_hour: Option<Money>,
    ) -> ResultEngine<(Money, Money)> {
        let all_in_rate = match (all_in_rate, self.all_in_rate) {
            (Some(rate), _) | (None, Some(rate)) => rate,
            (None, None) if self.attached => {
                return Err(EngineError::Validation(
                    "all-in rate is required for tour packages".to_string(),
                ));
            }
            (None, None) => Money::ZERO,
        };
        let overtime_rate_per_hour = overtime_rate_per_hour
            .or(self.overtime_rate_per_hour)
            .unwrap_or_default();
        Ok((all_in_rate, overtime_rate_per_hour))
    }
}

fn ensure_vehicle_ready(vehicle: &crate::Vehicle) -> ResultEngine<()> {
    if vehicle.availability != VehicleAvailability::Ready {
        return Err(EngineError::Unavailable(format!(
            "vehicle {} is {}",
            vehicle.plate,
            vehicle.availability.as_str()
        )));
    }
    Ok(())
}

fn ensure_driver_ready(driver: &crate::Driver) -> ResultEngine<()> {
    if driver.availability != DriverAvailability::Ready {
        return Err(EngineError::Unavailable(format!(
            "driver {} is {}",
            driver.name,
            driver.availability.as_str()
        )));
    }
    Ok(())
}

impl Engine {
    /// Creates a booking and claims its vehicle and driver in one batch.
    ///
    /// The vehicle goes `ON_TRIP` when the checkout is not in the future and
    /// `BOOKED` otherwise; the driver goes `ON_TRIP`. A clashing invoice code
    /// is reported as [`EngineError::ExistingKey`] and nothing is written.
    pub async fn create_booking(&self, cmd: NewBookingCmd) -> ResultEngine<Booking> {
        let customer_name = normalize_required_name(&cmd.customer_name, "customer name")?;
        let vehicle_id = cmd
            .vehicle_id
            .ok_or_else(|| EngineError::Validation("vehicle is required".to_string()))?;
        let driver_id = cmd
            .driver_id
            .ok_or_else(|| EngineError::Validation("driver is required".to_string()))?;
        ensure_time_order(cmd.checkout_at, cmd.checkin_at)?;
        ensure_money_fields([
            (cmd.all_in_rate, "all-in rate"),
            (cmd.overtime_rate_per_hour, "overtime rate per hour"),
            (cmd.fuel_cost, "fuel cost"),
            (cmd.driver_fee, "driver fee"),
        ])?;

        let now = self.clock.now();
        let invoice_code = invoice_code(&self.invoice_prefix, now, self.timezone);

        with_tx!(self, |db_tx| {
            let vehicle = self.require_vehicle(&db_tx, vehicle_id).await?;
            let driver = self.require_driver(&db_tx, driver_id).await?;
            let package = match cmd.package_id {
                Some(id) => Some(self.require_package(&db_tx, id).await?),
                None => None,
            };
            if self.assignment_guard == AssignmentGuard::RequireReady {
                ensure_vehicle_ready(&vehicle)?;
                ensure_driver_ready(&driver)?;
            }

            let terms = PackageTerms::of(package.as_ref());
            let (all_in_rate, overtime_rate_per_hour) =
                terms.rates(cmd.all_in_rate, cmd.overtime_rate_per_hour)?;

            let model = bookings::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                invoice_code: ActiveValue::Set(invoice_code.clone()),
                customer_name: ActiveValue::Set(customer_name),
                customer_phone: ActiveValue::Set(normalize_optional_text(
                    cmd.customer_phone.as_deref(),
                )),
                booking_date: ActiveValue::Set(cmd.booking_date.unwrap_or(now)),
                checkout_at: ActiveValue::Set(cmd.checkout_at),
                checkin_at: ActiveValue::Set(cmd.checkin_at),
                all_in_rate: ActiveValue::Set(all_in_rate.amount()),
                overtime_rate_per_hour: ActiveValue::Set(overtime_rate_per_hour.amount()),
                fuel_cost: ActiveValue::Set(cmd.fuel_cost.unwrap_or_default().amount()),
                driver_fee: ActiveValue::Set(cmd.driver_fee.unwrap_or_default().amount()),
                base_duration_hours: ActiveValue::Set(terms.base_duration_hours),
                payment_status: ActiveValue::Set(
                    cmd.payment_status.unwrap_or_default().as_str().to_string(),
                ),
                note: ActiveValue::Set(normalize_optional_text(cmd.note.as_deref())),
                vehicle_id: ActiveValue::Set(vehicle_id.to_string()),
                driver_id: ActiveValue::Set(driver_id.to_string()),
                package_id: ActiveValue::Set(cmd.package_id.map(|id| id.to_string())),
                created_at: ActiveValue::Set(now),
            };
            let inserted = model.insert(&db_tx).await.map_err(|err| {
                match EngineError::from_write(err, "booking") {
                    EngineError::ExistingKey(_) => {
                        tracing::warn!(invoice = %invoice_code, "duplicate invoice code");
                        EngineError::ExistingKey(invoice_code.clone())
                    }
                    other => other,
                }
            })?;

            let vehicle_state = VehicleAvailability::for_checkout(cmd.checkout_at, now);
            vehicles::availability_update(vehicle_id, vehicle_state)
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "vehicle"))?;
            drivers::availability_update(driver_id, DriverAvailability::OnTrip)
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "driver"))?;

            let booking = Booking::try_from(inserted)?;
            tracing::info!(
                booking = %booking.id,
                invoice = %booking.invoice_code,
                vehicle = %vehicle_id,
                vehicle_state = vehicle_state.as_str(),
                driver = %driver_id,
                "booking created"
            );
            Ok(booking)
        })
    }

    /// Updates a booking with a partial set of fields.
    ///
    /// Under [`ReassignPolicy::DoesNotTouchAvailability`] only the booking row
    /// changes. Under [`ReassignPolicy::TransferAvailability`] a replaced
    /// vehicle or driver is released and the new one claimed in the same
    /// batch.
    pub async fn update_booking(&self, id: Uuid, cmd: UpdateBookingCmd) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            let existing = self.require_booking(&db_tx, id).await?;
            if cmd.is_empty() {
                return Ok(existing);
            }

            let customer_name = match cmd.customer_name.as_deref() {
                Some(name) => normalize_required_name(name, "customer name")?,
                None => existing.customer_name.clone(),
            };
            let checkout_at = cmd.checkout_at.unwrap_or(existing.checkout_at);
            let checkin_at = cmd.checkin_at.unwrap_or(existing.checkin_at);
            ensure_time_order(checkout_at, checkin_at)?;
            ensure_money_fields([
                (cmd.all_in_rate, "all-in rate"),
                (cmd.overtime_rate_per_hour, "overtime rate per hour"),
                (cmd.fuel_cost, "fuel cost"),
                (cmd.driver_fee, "driver fee"),
            ])?;

            let vehicle_id = cmd.vehicle_id.unwrap_or(existing.vehicle_id);
            let driver_id = cmd.driver_id.unwrap_or(existing.driver_id);
            let new_vehicle = if vehicle_id != existing.vehicle_id {
                Some(self.require_vehicle(&db_tx, vehicle_id).await?)
            } else {
                None
            };
            let new_driver = if driver_id != existing.driver_id {
                Some(self.require_driver(&db_tx, driver_id).await?)
            } else {
                None
            };

            // Attaching a package applies all of its terms like a create does.
            // Detaching keeps the agreed rates and drops the base duration.
            let kept_rates = (
                cmd.all_in_rate.unwrap_or(existing.all_in_rate),
                cmd.overtime_rate_per_hour
                    .unwrap_or(existing.overtime_rate_per_hour),
            );
            let (package_id, base_duration_hours, (all_in_rate, overtime_rate_per_hour)) =
                match cmd.package_id {
                    None => (existing.package_id, existing.base_duration_hours, kept_rates),
                    Some(None) => (None, None, kept_rates),
                    Some(Some(package_id)) => {
                        let package = self.require_package(&db_tx, package_id).await?;
                        let terms = PackageTerms::of(Some(&package));
                        let rates = terms.rates(cmd.all_in_rate, cmd.overtime_rate_per_hour)?;
                        (Some(package_id), terms.base_duration_hours, rates)
                    }
                };

            if self.reassign_policy == ReassignPolicy::TransferAvailability {
                self.transfer_resources(
                    &db_tx,
                    &existing,
                    new_vehicle.as_ref(),
                    new_driver.as_ref(),
                    checkout_at,
                )
                .await?;
            }

            let model = bookings::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                customer_name: ActiveValue::Set(customer_name),
                customer_phone: ActiveValue::Set(apply_optional_text_patch(
                    existing.customer_phone.clone(),
                    cmd.customer_phone.as_deref(),
                )),
                booking_date: ActiveValue::Set(cmd.booking_date.unwrap_or(existing.booking_date)),
                checkout_at: ActiveValue::Set(checkout_at),
                checkin_at: ActiveValue::Set(checkin_at),
                all_in_rate: ActiveValue::Set(all_in_rate.amount()),
                overtime_rate_per_hour: ActiveValue::Set(overtime_rate_per_hour.amount()),
                fuel_cost: ActiveValue::Set(cmd.fuel_cost.unwrap_or(existing.fuel_cost).amount()),
                driver_fee: ActiveValue::Set(
                    cmd.driver_fee.unwrap_or(existing.driver_fee).amount(),
                ),
                base_duration_hours: ActiveValue::Set(base_duration_hours),
                note: ActiveValue::Set(apply_optional_text_patch(
                    existing.note.clone(),
                    cmd.note.as_deref(),
                )),
                vehicle_id: ActiveValue::Set(vehicle_id.to_string()),
                driver_id: ActiveValue::Set(driver_id.to_string()),
                package_id: ActiveValue::Set(package_id.map(|id| id.to_string())),
                ..Default::default()
            };
            let updated = model
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "booking"))?;

            tracing::info!(booking = %id, "booking updated");
            Booking::try_from(updated)
        })
    }

    async fn transfer_resources(
        &self,
        db_tx: &DatabaseTransaction,
        existing: &Booking,
        new_vehicle: Option<&crate::Vehicle>,
        new_driver: Option<&crate::Driver>,
        checkout_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if self.assignment_guard == AssignmentGuard::RequireReady {
            new_vehicle.map(ensure_vehicle_ready).transpose()?;
            new_driver.map(ensure_driver_ready).transpose()?;
        }

        if let Some(vehicle) = new_vehicle {
            self.release_vehicle(db_tx, existing.vehicle_id).await?;
            let state = VehicleAvailability::for_checkout(checkout_at, self.clock.now());
            vehicles::availability_update(vehicle.id, state)
                .update(db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "vehicle"))?;
            tracing::info!(
                booking = %existing.id,
                from = %existing.vehicle_id,
                to = %vehicle.id,
                "vehicle transferred"
            );
        }
        if let Some(driver) = new_driver {
            self.release_driver(db_tx, existing.driver_id).await?;
            drivers::availability_update(driver.id, DriverAvailability::OnTrip)
                .update(db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "driver"))?;
            tracing::info!(
                booking = %existing.id,
                from = %existing.driver_id,
                to = %driver.id,
                "driver transferred"
            );
        }
        Ok(())
    }

    /// Puts a vehicle back to `READY`, honoring the cancel policy. Returns
    /// whether the state changed.
    async fn release_vehicle(&self, db_tx: &DatabaseTransaction, id: Uuid) -> ResultEngine<bool> {
        if self.cancel_policy == CancelPolicy::PreserveOutOfService {
            let vehicle = self.require_vehicle(db_tx, id).await?;
            if vehicle.availability.is_out_of_service() {
                return Ok(false);
            }
        }
        vehicles::availability_update(id, VehicleAvailability::Ready)
            .update(db_tx)
            .await
            .map_err(|err| EngineError::from_write(err, "vehicle"))?;
        Ok(true)
    }

    async fn release_driver(&self, db_tx: &DatabaseTransaction, id: Uuid) -> ResultEngine<bool> {
        if self.cancel_policy == CancelPolicy::PreserveOutOfService {
            let driver = self.require_driver(db_tx, id).await?;
            if driver.availability.is_out_of_service() {
                return Ok(false);
            }
        }
        drivers::availability_update(id, DriverAvailability::Ready)
            .update(db_tx)
            .await
            .map_err(|err| EngineError::from_write(err, "driver"))?;
        Ok(true)
    }

    /// Deletes a booking and releases its vehicle and driver in one batch.
    pub async fn cancel_booking(&self, id: Uuid) -> ResultEngine<CancelledBooking> {
        with_tx!(self, |db_tx| {
            let booking = self.require_booking(&db_tx, id).await?;
            let deleted = bookings::Entity::delete_by_id(id.to_string())
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("booking not exists".to_string()));
            }

            let vehicle_released = self.release_vehicle(&db_tx, booking.vehicle_id).await?;
            let driver_released = self.release_driver(&db_tx, booking.driver_id).await?;
            tracing::info!(
                booking = %id,
                invoice = %booking.invoice_code,
                vehicle_released,
                driver_released,
                "booking cancelled"
            );
            Ok(CancelledBooking {
                booking,
                vehicle_released,
                driver_released,
            })
        })
    }

    /// Changes only the payment status. Unknown statuses are rejected before
    /// anything is written.
    pub async fn set_payment_status(&self, id: Uuid, status: &str) -> ResultEngine<Booking> {
        let status = PaymentStatus::try_from(status.trim())?;
        let model = bookings::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            payment_status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        let updated = model
            .update(&self.database)
            .await
            .map_err(|err| EngineError::from_write(err, "booking"))?;
        tracing::info!(booking = %id, status = status.as_str(), "payment status changed");
        Booking::try_from(updated)
    }

    /// Return a booking.
    pub async fn booking(&self, id: Uuid) -> ResultEngine<Booking> {
        let model = bookings::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("booking not exists".to_string()))?;
        Booking::try_from(model)
    }

    /// Financial summary of a stored booking, computed from its raw terms.
    pub async fn booking_financials(&self, id: Uuid) -> ResultEngine<FinancialSummary> {
        Ok(self.booking(id).await?.financials())
    }

    /// Lists bookings with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(booking_date DESC, id DESC)`.
    pub async fn bookings_page(
        &self,
        limit: u64,
        cursor: Option<&str>,
        filter: &BookingListFilter,
    ) -> ResultEngine<(Vec<Booking>, Option<String>)> {
        validate_list_filter(filter)?;
        if limit == 0 {
            return Err(EngineError::Validation(
                "limit must be at least 1".to_string(),
            ));
        }

        let mut query = bookings::Entity::find()
            .order_by_desc(bookings::Column::BookingDate)
            .order_by_desc(bookings::Column::Id)
            .limit(limit.saturating_add(1));
        if let Some(cursor) = cursor {
            let cursor = BookingsCursor::decode(cursor)?;
            query = query.filter(
                Condition::any()
                    .add(bookings::Column::BookingDate.lt(cursor.booking_date))
                    .add(
                        Condition::all()
                            .add(bookings::Column::BookingDate.eq(cursor.booking_date))
                            .add(bookings::Column::Id.lt(cursor.booking_id)),
                    ),
            );
        }
        query = query.apply_booking_filters(filter);

        let rows = query.all(&self.database).await?;
        let has_more = rows.len() > limit as usize;
        let items = rows
            .into_iter()
            .take(limit as usize)
            .map(Booking::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let next_cursor = if has_more {
            items
                .last()
                .map(|b| BookingsCursor {
                    booking_date: b.booking_date,
                    booking_id: b.id.to_string(),
                })
                .map(|c| c.encode())
                .transpose()?
        } else {
            None
        };
        Ok((items, next_cursor))
    }

    /// Bookings whose booking date falls in `[from, to)`, oldest first.
    pub(in crate::ops) async fn bookings_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<Vec<Booking>> {
        bookings::Entity::find()
            .filter(bookings::Column::BookingDate.gte(from))
            .filter(bookings::Column::BookingDate.lt(to))
            .order_by_asc(bookings::Column::BookingDate)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn require_booking(
        &self,
        db_tx: &DatabaseTransaction,
        id: Uuid,
    ) -> ResultEngine<Booking> {
        let model = bookings::Entity::find_by_id(id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("booking not exists".to_string()))?;
        Booking::try_from(model)
    }
}
