//! Drivers and their availability state.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// Availability of a driver. `OnTrip` is only reached through bookings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverAvailability {
    Ready,
    OnTrip,
    OffDuty,
}

impl DriverAvailability {
    pub const ALL: [DriverAvailability; 3] = [Self::Ready, Self::OnTrip, Self::OffDuty];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::OnTrip => "ON_TRIP",
            Self::OffDuty => "OFF_DUTY",
        }
    }

    pub fn is_out_of_service(self) -> bool {
        self == Self::OffDuty
    }
}

impl TryFrom<&str> for DriverAvailability {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "READY" => Ok(Self::Ready),
            "ON_TRIP" => Ok(Self::OnTrip),
            "OFF_DUTY" => Ok(Self::OffDuty),
            other => Err(EngineError::Validation(format!(
                "invalid driver availability: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub availability: DriverAvailability,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "drivers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub availability: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Driver {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "driver")?,
            name: model.name,
            phone: model.phone,
            availability: DriverAvailability::try_from(model.availability.as_str())?,
        })
    }
}

/// Active model touching only the availability column.
pub(crate) fn availability_update(id: Uuid, availability: DriverAvailability) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        availability: ActiveValue::Set(availability.as_str().to_string()),
        ..Default::default()
    }
}
