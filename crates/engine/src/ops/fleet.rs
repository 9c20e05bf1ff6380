use uuid::Uuid;

use sea_orm::{ActiveValue, QueryOrder, prelude::*};

use crate::{
    Driver, DriverAvailability, EngineError, ResultEngine, Vehicle, VehicleAvailability, drivers,
    util::{normalize_optional_text, normalize_required_name},
    vehicles,
};

use super::Engine;

/// Plates are compared upper-cased with single spaces: `b 1234  xy` is `B 1234 XY`.
fn normalize_plate(plate: &str) -> ResultEngine<String> {
    let plate = normalize_required_name(plate, "plate")?;
    Ok(plate
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase())
}

impl Engine {
    /// Registers a vehicle, `READY`.
    pub async fn new_vehicle(&self, plate: &str, brand: &str, model: &str) -> ResultEngine<Vehicle> {
        let plate = normalize_plate(plate)?;
        let vehicle = vehicles::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            plate: ActiveValue::Set(plate.clone()),
            brand: ActiveValue::Set(normalize_required_name(brand, "brand")?),
            model_name: ActiveValue::Set(normalize_required_name(model, "model")?),
            availability: ActiveValue::Set(VehicleAvailability::Ready.as_str().to_string()),
            created_at: ActiveValue::Set(self.clock.now()),
        }
        .insert(&self.database)
        .await
        .map_err(|err| match EngineError::from_write(err, "vehicle") {
            EngineError::ExistingKey(_) => EngineError::ExistingKey(plate),
            other => other,
        })?;
        Vehicle::try_from(vehicle)
    }

    /// All vehicles, by plate.
    pub async fn vehicles(&self) -> ResultEngine<Vec<Vehicle>> {
        vehicles::Entity::find()
            .order_by_asc(vehicles::Column::Plate)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Vehicle::try_from)
            .collect()
    }

    pub async fn vehicle(&self, id: Uuid) -> ResultEngine<Vehicle> {
        let model = vehicles::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("vehicle not exists".to_string()))?;
        Vehicle::try_from(model)
    }

    /// Administrative toggle between `READY` and `MAINTENANCE`.
    ///
    /// `BOOKED` and `ON_TRIP` can only be reached through bookings.
    pub async fn set_vehicle_availability(
        &self,
        id: Uuid,
        availability: VehicleAvailability,
    ) -> ResultEngine<Vehicle> {
        if !matches!(
            availability,
            VehicleAvailability::Ready | VehicleAvailability::Maintenance
        ) {
            return Err(EngineError::Validation(format!(
                "vehicles can only be set to READY or MAINTENANCE, not {}",
                availability.as_str()
            )));
        }
        let updated = vehicles::availability_update(id, availability)
            .update(&self.database)
            .await
            .map_err(|err| EngineError::from_write(err, "vehicle"))?;
        tracing::info!(vehicle = %id, availability = availability.as_str(), "vehicle availability set");
        Vehicle::try_from(updated)
    }

    /// Removes a vehicle no booking or expense refers to.
    pub async fn delete_vehicle(&self, id: Uuid) -> ResultEngine<()> {
        let result = vehicles::Entity::delete_by_id(id.to_string())
            .exec(&self.database)
            .await
            .map_err(|err| EngineError::from_write(err, "vehicle"))?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("vehicle not exists".to_string()));
        }
        Ok(())
    }

    /// Registers a driver, `READY`.
    pub async fn new_driver(&self, name: &str, phone: Option<&str>) -> ResultEngine<Driver> {
        let driver = drivers::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            name: ActiveValue::Set(normalize_required_name(name, "driver name")?),
            phone: ActiveValue::Set(normalize_optional_text(phone)),
            availability: ActiveValue::Set(DriverAvailability::Ready.as_str().to_string()),
            created_at: ActiveValue::Set(self.clock.now()),
        }
        .insert(&self.database)
        .await
        .map_err(|err| EngineError::from_write(err, "driver"))?;
        Driver::try_from(driver)
    }

    /// All drivers, by name.
    pub async fn drivers(&self) -> ResultEngine<Vec<Driver>> {
        drivers::Entity::find()
            .order_by_asc(drivers::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Driver::try_from)
            .collect()
    }

    pub async fn driver(&self, id: Uuid) -> ResultEngine<Driver> {
        let model = drivers::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("driver not exists".to_string()))?;
        Driver::try_from(model)
    }

    /// Administrative toggle between `READY` and `OFF_DUTY`.
    pub async fn set_driver_availability(
        &self,
        id: Uuid,
        availability: DriverAvailability,
    ) -> ResultEngine<Driver> {
        if availability == DriverAvailability::OnTrip {
            return Err(EngineError::Validation(
                "drivers can only be set to READY or OFF_DUTY, not ON_TRIP".to_string(),
            ));
        }
        let updated = drivers::availability_update(id, availability)
            .update(&self.database)
            .await
            .map_err(|err| EngineError::from_write(err, "driver"))?;
        tracing::info!(driver = %id, availability = availability.as_str(), "driver availability set");
        Driver::try_from(updated)
    }

    /// Removes a driver no booking refers to.
    pub async fn delete_driver(&self, id: Uuid) -> ResultEngine<()> {
        let result = drivers::Entity::delete_by_id(id.to_string())
            .exec(&self.database)
            .await
            .map_err(|err| EngineError::from_write(err, "driver"))?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("driver not exists".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plates_are_canonicalized() {
        assert_eq!(normalize_plate(" b 1234  xy ").unwrap(), "B 1234 XY");
        assert!(normalize_plate("   ").is_err());
    }
}
