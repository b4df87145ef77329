use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// PIN credential. A user holds at most one active PIN at a time, enforced
/// at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessPin {
    pub id: i64,
    pub id_user: i64,
    pub pin_code: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
