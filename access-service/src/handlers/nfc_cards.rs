use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::warn;

use crate::dtos::credentials::{
    CreateNfcCardRequest, NfcRegistrationRequest, NfcValidationResponse, UpdateNfcCardRequest,
    ValidateNfcRequest,
};
use crate::error::AppError;
use crate::models::{AccessType, NewLog, NfcCard};
use crate::services::messages::OutboundMessage;
use crate::services::validation;
use crate::utils::ValidatedJson;
use crate::{AppState, PRIMARY_DEVICE_ID};

#[derive(Debug, Deserialize)]
pub struct CardListQuery {
    pub id_user: Option<i64>,
}

pub async fn create_card(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateNfcCardRequest>,
) -> Result<(StatusCode, Json<NfcCard>), AppError> {
    let user = state
        .db
        .find_user_by_id(payload.id_user)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let card = state
        .db
        .create_nfc_card(&payload.card_uid, user.id, &payload.card_name, payload.status)
        .await?;

    state
        .db
        .append_log(
            NewLog::new(
                PRIMARY_DEVICE_ID,
                AccessType::Remote,
                format!("NFC card registered: {}", card.card_name),
            )
            .with_user(user.id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn list_cards(
    State(state): State<AppState>,
    Query(query): Query<CardListQuery>,
) -> Result<Json<Vec<NfcCard>>, AppError> {
    let cards = state.db.list_nfc_cards(query.id_user).await?;
    Ok(Json(cards))
}

pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NfcCard>, AppError> {
    let card = state
        .db
        .find_nfc_card_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("NFC card not found")))?;
    Ok(Json(card))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateNfcCardRequest>,
) -> Result<Json<NfcCard>, AppError> {
    let card = state
        .db
        .update_nfc_card(id, payload.card_name.as_deref(), payload.status)
        .await?;
    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.db.delete_nfc_card(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Unauthenticated validation endpoint hit by the reader hardware.
/// A rejected credential is a normal outcome, not an HTTP error.
pub async fn validate_card(
    State(state): State<AppState>,
    Json(payload): Json<ValidateNfcRequest>,
) -> Result<Json<NfcValidationResponse>, AppError> {
    let result =
        validation::validate_nfc(&state.db, &state.registry, &state.whatsapp, &payload.card_uid)
            .await?;
    Ok(Json(result))
}

/// Put the primary device's reader into enrollment mode. The device replies
/// over its channel with `nfc_card_registered` once a card is presented.
pub async fn register_card(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NfcRegistrationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = state
        .db
        .find_user_by_id(payload.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let delivered = state.registry.send_to_device(
        PRIMARY_DEVICE_ID,
        &OutboundMessage::NfcRegistration {
            user_id: user.id,
            user_name: user.name.clone(),
            card_name: payload.card_name.clone(),
            message: "Present the card to the reader".to_string(),
        },
    );

    if !delivered {
        warn!(user_id = user.id, "Card enrollment requested while reader offline");
        return Err(AppError::InternalError(anyhow::anyhow!(
            "Reader device is not connected"
        )));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Reader waiting for card"
    })))
}
