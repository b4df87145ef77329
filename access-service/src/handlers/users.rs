use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::dtos::users::UpdateUserRequest;
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::SanitizedUser;
use crate::utils::{hash_password, password_strength_error, Password, ValidatedJson};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<SanitizedUser>>, AppError> {
    let users = state.db.list_users(query.limit, query.offset).await?;
    Ok(Json(users.into_iter().map(SanitizedUser::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SanitizedUser>, AppError> {
    let user = state
        .db
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;
    Ok(Json(user.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<SanitizedUser>, AppError> {
    // A user may only edit their own account.
    if caller.id != id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Cannot modify another user's account"
        )));
    }

    let password_hash = match payload.password {
        Some(password) => {
            if let Some(reason) = password_strength_error(&password) {
                return Err(AppError::BadRequest(anyhow::anyhow!(reason)));
            }
            Some(hash_password(&Password::new(password))?)
        }
        None => None,
    };

    let user = state
        .db
        .update_user(
            id,
            payload.name.as_deref(),
            payload.email.as_deref(),
            password_hash.as_ref().map(|h| h.as_str()),
            payload.status,
        )
        .await?;

    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if caller.id != id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Cannot delete another user's account"
        )));
    }

    state.db.soft_delete_user(id).await?;
    state.db.revoke_user_tokens(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
