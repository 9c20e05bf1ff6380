//! Service package API endpoints.
//!
//! Bodies are taken as raw JSON and normalized by the engine, so the alternate
//! key spellings and localized kind labels used by older forms keep working.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{ServicePackage, normalize};
use serde_json::Value;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<ServicePackage>), ServerError> {
    let cmd = normalize::package_from_json(&payload)?;
    let package = state.engine.new_package(cmd).await?;
    Ok((StatusCode::CREATED, Json(package)))
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<ServicePackage>>, ServerError> {
    Ok(Json(state.engine.packages().await?))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServicePackage>, ServerError> {
    Ok(Json(state.engine.package(id).await?))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<ServicePackage>, ServerError> {
    let cmd = normalize::package_from_json(&payload)?;
    Ok(Json(state.engine.update_package(id, cmd).await?))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_package(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
