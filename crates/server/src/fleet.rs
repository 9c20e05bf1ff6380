//! Vehicles and drivers API endpoints.

use api_types::fleet::{AvailabilityUpdate, DriverNew, VehicleNew};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Driver, DriverAvailability, Vehicle, VehicleAvailability};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn vehicle_new(
    State(state): State<ServerState>,
    Json(payload): Json<VehicleNew>,
) -> Result<(StatusCode, Json<Vehicle>), ServerError> {
    let vehicle = state
        .engine
        .new_vehicle(&payload.plate, &payload.brand, &payload.model)
        .await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn list_vehicles(
    State(state): State<ServerState>,
) -> Result<Json<Vec<Vehicle>>, ServerError> {
    Ok(Json(state.engine.vehicles().await?))
}

pub async fn set_vehicle_availability(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvailabilityUpdate>,
) -> Result<Json<Vehicle>, ServerError> {
    let availability = VehicleAvailability::try_from(payload.availability.trim())?;
    let vehicle = state
        .engine
        .set_vehicle_availability(id, availability)
        .await?;
    Ok(Json(vehicle))
}

pub async fn delete_vehicle(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_vehicle(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn driver_new(
    State(state): State<ServerState>,
    Json(payload): Json<DriverNew>,
) -> Result<(StatusCode, Json<Driver>), ServerError> {
    let driver = state
        .engine
        .new_driver(&payload.name, payload.phone.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

pub async fn list_drivers(
    State(state): State<ServerState>,
) -> Result<Json<Vec<Driver>>, ServerError> {
    Ok(Json(state.engine.drivers().await?))
}

pub async fn set_driver_availability(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvailabilityUpdate>,
) -> Result<Json<Driver>, ServerError> {
    let availability = DriverAvailability::try_from(payload.availability.trim())?;
    let driver = state.engine.set_driver_availability(id, availability).await?;
    Ok(Json(driver))
}

pub async fn delete_driver(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_driver(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
