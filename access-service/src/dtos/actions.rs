use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActionRequest {
    pub id_device: i64,
    #[validate(length(min = 1, max = 100))]
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActionRequest {
    pub executed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ActionListQuery {
    pub id_device: Option<i64>,
    pub executed: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Event report pushed by a device over plain HTTP when its channel is down.
#[derive(Debug, Deserialize)]
pub struct DeviceAccessLogRequest {
    #[serde(default = "default_device_id")]
    pub id_device: i64,
    #[serde(default)]
    pub id_user: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub access_type: Option<String>,
}

fn default_device_id() -> i64 {
    crate::PRIMARY_DEVICE_ID
}

#[derive(Debug, Serialize)]
pub struct AccessLogResponse {
    pub success: bool,
    pub message: String,
    pub notification_sent: bool,
}
