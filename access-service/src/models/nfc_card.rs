use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// NFC card credential. `card_uid` is globally unique across all cards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NfcCard {
    pub id: i64,
    pub card_uid: String,
    pub id_user: i64,
    pub card_name: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
