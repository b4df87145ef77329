use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeviceRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub status: Option<String>,
    #[validate(length(max = 15))]
    pub direction: Option<String>,
    pub nfc_reader_active: Option<bool>,
    pub emergency_mode: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDeviceRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    pub status: Option<String>,
    #[validate(length(max = 15))]
    pub direction: Option<String>,
    pub nfc_reader_active: Option<bool>,
    pub emergency_mode: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceListQuery {
    pub status: Option<String>,
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
