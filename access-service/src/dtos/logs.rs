use serde::Deserialize;
use serde::Serialize;

use crate::models::AccessLog;

#[derive(Debug, Deserialize)]
pub struct LogListQuery {
    pub id_device: Option<i64>,
    pub event_contains: Option<String>,
    pub access_type: Option<String>,
    pub id_action: Option<i64>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct LogPage {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
    pub data: Vec<AccessLog>,
}
