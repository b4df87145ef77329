use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::dtos::actions::{
    AccessLogResponse, ActionListQuery, CreateActionRequest, DeviceAccessLogRequest,
    UpdateActionRequest,
};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::{AccessType, DeviceAction, NewLog};
use crate::services::messages::{ActionStatus, OutboundMessage};
use crate::utils::ValidatedJson;
use crate::AppState;

/// Create a remote command for a device: persist first, then best-effort
/// push over the device channel, then audit. The record commits even when
/// the device is unreachable.
pub async fn create_action(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateActionRequest>,
) -> Result<(StatusCode, Json<DeviceAction>), AppError> {
    let device = state
        .db
        .find_device_by_id(payload.id_device)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Device not found")))?;

    let action = state.db.create_action(device.id, &payload.action).await?;

    let delivered = state.registry.send_to_device(
        device.id,
        &OutboundMessage::ActionExecute {
            action_id: action.id,
            id_device: device.id,
            action_type: action.action.clone(),
            timestamp: action.created_at,
        },
    );

    state
        .db
        .append_log(
            NewLog::new(
                device.id,
                AccessType::Remote,
                format!("Action requested: {}", action.action),
            )
            .with_user(user.id)
            .with_action(action.id),
        )
        .await?;

    if matches!(action.action.as_str(), "DOOR_OPEN" | "GARAGE_OPEN") {
        let target = if action.action == "DOOR_OPEN" {
            "MAIN DOOR"
        } else {
            "GARAGE"
        };
        state.whatsapp.notify_access(&user.name, "Remote", Some(target));
    }

    info!(
        action_id = action.id,
        device_id = device.id,
        delivered = delivered,
        "Action created"
    );

    Ok((StatusCode::CREATED, Json(action)))
}

pub async fn list_actions(
    State(state): State<AppState>,
    Query(query): Query<ActionListQuery>,
) -> Result<Json<Vec<DeviceAction>>, AppError> {
    let actions = state.db.list_actions(&query).await?;
    Ok(Json(actions))
}

pub async fn get_action(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeviceAction>, AppError> {
    let action = state
        .db
        .find_action_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Action not found")))?;
    Ok(Json(action))
}

pub async fn update_action_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateActionRequest>,
) -> Result<Json<DeviceAction>, AppError> {
    let executed = payload.executed.unwrap_or(true);
    let action = state.db.set_action_executed(id, executed).await?;

    let event = if executed {
        "Action executed successfully"
    } else {
        "Action marked as not executed"
    };
    state
        .db
        .append_log(
            NewLog::new(action.id_device, AccessType::Remote, event)
                .with_user(user.id)
                .with_action(action.id),
        )
        .await?;

    state.registry.send_to_device(
        action.id_device,
        &OutboundMessage::ActionUpdated {
            action_id: action.id,
            id_device: action.id_device,
            status: ActionStatus::from_executed(executed),
        },
    );

    Ok(Json(action))
}

pub async fn delete_action(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.db.delete_action(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Device-originated confirmation that a physical action completed.
/// Unauthenticated: the embedded device cannot hold a session token.
pub async fn confirm_action_execution(
    State(state): State<AppState>,
    Path(action_id): Path<i64>,
) -> Result<Json<DeviceAction>, AppError> {
    let action = state.db.set_action_executed(action_id, true).await?;

    state
        .db
        .append_log(
            NewLog::new(
                action.id_device,
                AccessType::Remote,
                format!("Action confirmed by device: {}", action.action),
            )
            .with_action(action.id),
        )
        .await?;

    state.registry.broadcast(&OutboundMessage::ActionConfirmed {
        action_id: action.id,
        id_device: action.id_device,
        action_type: action.action.clone(),
        status: ActionStatus::Executed,
    });

    info!(action_id = action.id, "Action confirmed by device");

    Ok(Json(action))
}

/// Event report pushed by a device over plain HTTP. Unauthenticated for the
/// same reason as action confirmation.
pub async fn device_access_log(
    State(state): State<AppState>,
    Json(payload): Json<DeviceAccessLogRequest>,
) -> Result<Json<AccessLogResponse>, AppError> {
    let access_type = AccessType::from_string(payload.access_type.as_deref().unwrap_or("local"));
    let user_name = payload.user_name.as_deref().unwrap_or("Unknown");
    let event = payload
        .action
        .clone()
        .unwrap_or_else(|| format!("Device event - user: {}", user_name));

    let mut entry = NewLog::new(payload.id_device, access_type, event);
    if let Some(id_user) = payload.id_user.filter(|id| *id > 0) {
        entry = entry.with_user(id_user);
    }
    state.db.append_log(entry).await?;

    let notification_sent = state.whatsapp.is_enabled();
    state
        .whatsapp
        .notify_access(user_name, access_type.as_str(), None);

    Ok(Json(AccessLogResponse {
        success: true,
        message: "Event recorded".to_string(),
        notification_sent,
    }))
}
