use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Physical access-control unit. Device id 1 is the primary system: its
/// `nfc_reader_active` flag is the global credential-validation kill switch.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub direction: Option<String>,
    pub nfc_reader_active: bool,
    pub emergency_mode: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
