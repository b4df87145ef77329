use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::dtos::devices::{CreateDeviceRequest, DeviceListQuery, UpdateDeviceRequest};
use crate::error::AppError;
use crate::models::Device;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn create_device(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), AppError> {
    if state.db.find_device_by_name(&payload.name).await?.is_some() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Device '{}' already exists",
            payload.name
        )));
    }

    let device = state.db.create_device(&payload).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceListQuery>,
) -> Result<Json<Vec<Device>>, AppError> {
    let devices = state.db.list_devices(&query).await?;
    Ok(Json(devices))
}

pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Device>, AppError> {
    let device = state
        .db
        .find_device_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Device not found")))?;
    Ok(Json(device))
}

pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateDeviceRequest>,
) -> Result<Json<Device>, AppError> {
    let device = state.db.update_device(id, &payload).await?;
    Ok(Json(device))
}

pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.db.delete_device(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
