use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::dtos::credentials::{
    CreatePinRequest, PinValidationResponse, UpdatePinRequest, ValidatePinRequest,
    VerifyPinRequest,
};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::{AccessPin, AccessType, NewLog};
use crate::services::validation;
use crate::utils::ValidatedJson;
use crate::{AppState, PRIMARY_DEVICE_ID};

#[derive(Debug, Deserialize)]
pub struct PinListQuery {
    pub id_user: Option<i64>,
}

pub async fn create_pin(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePinRequest>,
) -> Result<(StatusCode, Json<AccessPin>), AppError> {
    let user = state
        .db
        .find_user_by_id(payload.id_user)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    // One active PIN per user, checked at creation.
    if payload.status
        && state
            .db
            .find_active_pin_for_user(user.id)
            .await?
            .is_some()
    {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "User already has an active PIN"
        )));
    }

    let pin = state
        .db
        .create_access_pin(user.id, &payload.pin_code, payload.status)
        .await?;

    state
        .db
        .append_log(
            NewLog::new(
                PRIMARY_DEVICE_ID,
                AccessType::Remote,
                format!("Access PIN created for user: {}", user.username),
            )
            .with_user(user.id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(pin)))
}

pub async fn list_pins(
    State(state): State<AppState>,
    Query(query): Query<PinListQuery>,
) -> Result<Json<Vec<AccessPin>>, AppError> {
    let pins = state.db.list_access_pins(query.id_user).await?;
    Ok(Json(pins))
}

pub async fn get_pin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AccessPin>, AppError> {
    let pin = state
        .db
        .find_access_pin_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Access PIN not found")))?;
    Ok(Json(pin))
}

pub async fn update_pin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdatePinRequest>,
) -> Result<Json<AccessPin>, AppError> {
    let pin = state
        .db
        .update_access_pin(id, payload.pin_code.as_deref(), payload.status)
        .await?;
    Ok(Json(pin))
}

pub async fn delete_pin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.db.delete_access_pin(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Unauthenticated validation endpoint hit by the entry keypad.
pub async fn validate_pin(
    State(state): State<AppState>,
    Json(payload): Json<ValidatePinRequest>,
) -> Result<Json<PinValidationResponse>, AppError> {
    let result =
        validation::validate_pin(&state.db, &state.registry, &state.whatsapp, &payload.pin_code)
            .await?;
    Ok(Json(result))
}

/// Re-authenticate the caller's own PIN before a sensitive change.
pub async fn verify_pin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<VerifyPinRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    validation::verify_pin(&state.db, user.id, &payload.pin_code).await?;
    Ok(Json(serde_json::json!({ "valid": true })))
}
