use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::dtos::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, VerifyResponse,
};
use crate::dtos::users::UserSummary;
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::{AccessType, NewLog, SanitizedUser};
use crate::services::messages::OutboundMessage;
use crate::utils::{
    hash_password, password_strength_error, verify_password, Password, PasswordHashString,
    ValidatedJson,
};
use crate::{AppState, PRIMARY_DEVICE_ID};

fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<SanitizedUser>), AppError> {
    if state
        .db
        .find_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Username already registered"
        )));
    }
    if state.db.find_user_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict(anyhow::anyhow!("Email already registered")));
    }

    if let Some(reason) = password_strength_error(&payload.password) {
        return Err(AppError::BadRequest(anyhow::anyhow!(reason)));
    }

    let hash = hash_password(&Password::new(payload.password))?;
    let user = state
        .db
        .create_user(
            &payload.name,
            &payload.username,
            hash.as_str(),
            &payload.email,
            payload.status,
        )
        .await?;

    state
        .db
        .append_log(
            NewLog::new(
                PRIMARY_DEVICE_ID,
                AccessType::Remote,
                format!("User registered: {}", user.username),
            )
            .with_user(user.id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .db
        .find_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid username or password")))?;

    if !user.status {
        return Err(AppError::Unauthorized(anyhow::anyhow!("User disabled")));
    }

    let password = Password::new(payload.password);
    let stored = PasswordHashString::new(user.password.clone());
    if verify_password(&password, &stored).is_err() {
        warn!(username = %user.username, "Failed login attempt");
        state
            .db
            .append_log(
                NewLog::new(
                    PRIMARY_DEVICE_ID,
                    AccessType::Security,
                    format!("Failed login attempt: {}", user.username),
                )
                .with_user(user.id),
            )
            .await?;
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid username or password"
        )));
    }

    let (token, expires_at) = state.jwt.generate_access_token(&user)?;
    state.db.insert_token(user.id, &token, expires_at).await?;
    state.db.touch_last_connection(user.id).await?;

    state
        .db
        .append_log(
            NewLog::new(
                PRIMARY_DEVICE_ID,
                AccessType::Remote,
                format!("User logged in: {}", user.username),
            )
            .with_user(user.id),
        )
        .await?;

    info!(user_id = user.id, username = %user.username, "User logged in");

    state.whatsapp.notify_access(&user.name, "Login Web", None);
    state.registry.send_to_device(
        PRIMARY_DEVICE_ID,
        &OutboundMessage::Login {
            success: true,
            token: token.clone(),
            user: UserSummary::from(&user),
        },
    );

    Ok(Json(LoginResponse {
        success: true,
        message: format!("Welcome {}", user.name),
        access_token: token,
        token_type: "bearer".to_string(),
        expires_at,
        user: UserSummary::from(&user),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = bearer_token(&headers)?;

    if !state.db.revoke_token(&token).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Session not found")));
    }

    state
        .db
        .append_log(
            NewLog::new(
                PRIMARY_DEVICE_ID,
                AccessType::Remote,
                format!("User logged out: {}", user.username),
            )
            .with_user(user.id),
        )
        .await?;

    Ok(Json(json!({ "success": true, "message": "Logged out" })))
}

pub async fn verify(CurrentUser(user): CurrentUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: UserSummary::from(&user),
    })
}

pub async fn refresh(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> Result<Json<LoginResponse>, AppError> {
    let old_token = bearer_token(&headers)?;
    state.db.revoke_token(&old_token).await?;

    let (token, expires_at) = state.jwt.generate_access_token(&user)?;
    state.db.insert_token(user.id, &token, expires_at).await?;

    state
        .db
        .append_log(
            NewLog::new(
                PRIMARY_DEVICE_ID,
                AccessType::Remote,
                format!("Token refreshed: {}", user.username),
            )
            .with_user(user.id),
        )
        .await?;

    state.registry.send_to_device(
        PRIMARY_DEVICE_ID,
        &OutboundMessage::TokenRefreshed {
            user_id: user.id,
            new_token: token.clone(),
        },
    );

    Ok(Json(LoginResponse {
        success: true,
        message: "Token refreshed".to_string(),
        access_token: token,
        token_type: "bearer".to_string(),
        expires_at,
        user: UserSummary::from(&user),
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let current = Password::new(payload.current_password);
    let stored = PasswordHashString::new(user.password.clone());
    if verify_password(&current, &stored).is_err() {
        state
            .db
            .append_log(
                NewLog::new(
                    PRIMARY_DEVICE_ID,
                    AccessType::Security,
                    format!("Failed password change attempt: {}", user.username),
                )
                .with_user(user.id),
            )
            .await?;
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Current password is incorrect"
        )));
    }

    if let Some(reason) = password_strength_error(&payload.new_password) {
        return Err(AppError::BadRequest(anyhow::anyhow!(reason)));
    }

    let hash = hash_password(&Password::new(payload.new_password))?;
    state.db.set_user_password(user.id, hash.as_str()).await?;

    // All sessions end when the password changes.
    state.db.revoke_user_tokens(user.id).await?;

    state
        .db
        .append_log(
            NewLog::new(
                PRIMARY_DEVICE_ID,
                AccessType::Security,
                format!("Password changed: {}", user.username),
            )
            .with_user(user.id),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password changed, please log in again"
    })))
}
