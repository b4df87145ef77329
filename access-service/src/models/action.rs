use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Remote command targeted at one device, e.g. `DOOR_OPEN` or `GARAGE_OPEN`.
/// `executed` flips to true when the device confirms physical execution.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceAction {
    pub id: i64,
    pub id_device: i64,
    pub action: String,
    pub executed: bool,
    pub created_at: DateTime<Utc>,
}
