use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{AccessPin, NfcCard, SanitizedUser};

// ---------------------------------------------------------------------------
// NFC cards
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNfcCardRequest {
    #[validate(length(min = 4, max = 255))]
    pub card_uid: String,
    pub id_user: i64,
    #[validate(length(min = 1, max = 255))]
    pub card_name: String,
    #[serde(default = "default_true")]
    pub status: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNfcCardRequest {
    #[validate(length(min = 1, max = 255))]
    pub card_name: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateNfcRequest {
    pub card_uid: String,
}

#[derive(Debug, Serialize)]
pub struct NfcValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<NfcCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SanitizedUser>,
    pub message: String,
}

impl NfcValidationResponse {
    pub fn rejected(message: impl Into<String>) -> Self {
        NfcValidationResponse {
            valid: false,
            card: None,
            user: None,
            message: message.into(),
        }
    }
}

/// Ask the primary device to wait for a card to enroll.
#[derive(Debug, Deserialize, Validate)]
pub struct NfcRegistrationRequest {
    pub user_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub card_name: String,
}

// ---------------------------------------------------------------------------
// Access PINs
// ---------------------------------------------------------------------------

fn validate_pin_digits(pin: &str) -> Result<(), ValidationError> {
    if pin.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("pin_digits"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePinRequest {
    pub id_user: i64,
    #[validate(
        length(equal = 6, message = "PIN must be exactly 6 digits"),
        custom(function = validate_pin_digits, message = "PIN must contain only digits")
    )]
    pub pin_code: String,
    #[serde(default = "default_true")]
    pub status: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePinRequest {
    #[validate(
        length(equal = 6, message = "PIN must be exactly 6 digits"),
        custom(function = validate_pin_digits, message = "PIN must contain only digits")
    )]
    pub pin_code: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ValidatePinRequest {
    pub pin_code: String,
}

#[derive(Debug, Serialize)]
pub struct PinValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<AccessPin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SanitizedUser>,
    pub message: String,
}

impl PinValidationResponse {
    pub fn rejected(message: impl Into<String>) -> Self {
        PinValidationResponse {
            valid: false,
            pin: None,
            user: None,
            message: message.into(),
        }
    }
}

/// Re-authentication of the caller's own PIN before a sensitive change.
#[derive(Debug, Deserialize)]
pub struct VerifyPinRequest {
    pub pin_code: String,
}

fn default_true() -> bool {
    true
}
