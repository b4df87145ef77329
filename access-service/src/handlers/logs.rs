use axum::{
    extract::{Query, State},
    Json,
};

use crate::dtos::logs::{LogListQuery, LogPage};
use crate::error::AppError;
use crate::AppState;

/// Paginated, filterable view over the append-only audit trail.
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogListQuery>,
) -> Result<Json<LogPage>, AppError> {
    let limit = query.limit.clamp(1, 100);
    let page = query.page.max(1);

    let (total, data) = state.db.list_logs(&query).await?;
    let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

    Ok(Json(LogPage {
        total,
        page,
        limit,
        pages,
        data,
    }))
}
