//! Fleet vehicles and their availability state.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// Availability of a vehicle.
///
/// `Booked` and `OnTrip` are only reached through bookings; administrators can
/// only move a vehicle between `Ready` and `Maintenance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleAvailability {
    Ready,
    Booked,
    OnTrip,
    Maintenance,
}

impl VehicleAvailability {
    pub const ALL: [VehicleAvailability; 4] = [
        Self::Ready,
        Self::Booked,
        Self::OnTrip,
        Self::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Booked => "BOOKED",
            Self::OnTrip => "ON_TRIP",
            Self::Maintenance => "MAINTENANCE",
        }
    }

    /// State a vehicle takes when a booking claims it: already on the road
    /// if the checkout instant is not in the future.
    pub fn for_checkout(checkout_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if checkout_at <= now {
            Self::OnTrip
        } else {
            Self::Booked
        }
    }

    pub fn is_out_of_service(self) -> bool {
        self == Self::Maintenance
    }
}

impl TryFrom<&str> for VehicleAvailability {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "READY" => Ok(Self::Ready),
            "BOOKED" => Ok(Self::Booked),
            "ON_TRIP" => Ok(Self::OnTrip),
            "MAINTENANCE" => Ok(Self::Maintenance),
            other => Err(EngineError::Validation(format!(
                "invalid vehicle availability: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub brand: String,
    pub model_name: String,
    pub availability: VehicleAvailability,
}

impl Vehicle {
    /// Short human label used in reports, e.g. `B 1234 XY (Toyota Avanza)`.
    pub fn label(&self) -> String {
        format!("{} ({} {})", self.plate, self.brand, self.model_name)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub plate: String,
    pub brand: String,
    pub model_name: String,
    pub availability: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Vehicle {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "vehicle")?,
            plate: model.plate,
            brand: model.brand,
            model_name: model.model_name,
            availability: VehicleAvailability::try_from(model.availability.as_str())?,
        })
    }
}

/// Active model touching only the availability column.
pub(crate) fn availability_update(id: Uuid, availability: VehicleAvailability) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        availability: ActiveValue::Set(availability.as_str().to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn checkout_in_the_past_or_now_means_on_trip() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        assert_eq!(
            VehicleAvailability::for_checkout(now, now),
            VehicleAvailability::OnTrip
        );
        assert_eq!(
            VehicleAvailability::for_checkout(now - chrono::Duration::hours(1), now),
            VehicleAvailability::OnTrip
        );
        assert_eq!(
            VehicleAvailability::for_checkout(now + chrono::Duration::seconds(1), now),
            VehicleAvailability::Booked
        );
    }

    #[test]
    fn availability_round_trips_through_storage_strings() {
        for state in VehicleAvailability::ALL {
            assert_eq!(VehicleAvailability::try_from(state.as_str()), Ok(state));
        }
        assert!(VehicleAvailability::try_from("ready").is_err());
    }
}
