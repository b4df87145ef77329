//! Wire protocol for the device/dashboard websocket channels.
//!
//! Every frame is a json object tagged by `type`. Both directions are closed
//! unions: a frame whose `type` is unknown fails deserialization and is
//! logged at the channel boundary instead of being passed through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dtos::users::UserSummary;

/// Execution state reported alongside action notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Executed,
    Pending,
}

impl ActionStatus {
    pub fn from_executed(executed: bool) -> Self {
        if executed {
            ActionStatus::Executed
        } else {
            ActionStatus::Pending
        }
    }
}

/// Registry-initiated messages pushed to device or dashboard channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// PIN validation outcome for the entry keypad.
    PinAccess {
        valid: bool,
        user_name: String,
        message: String,
    },
    /// NFC validation outcome for the reader, symmetric with `PinAccess`.
    NfcAccess {
        valid: bool,
        user_name: String,
        message: String,
    },
    /// Wait-for-card prompt during card enrollment.
    NfcRegistration {
        user_id: i64,
        user_name: String,
        card_name: String,
        message: String,
    },
    Login {
        success: bool,
        token: String,
        user: UserSummary,
    },
    TokenRefreshed {
        user_id: i64,
        new_token: String,
    },
    ActionExecute {
        action_id: i64,
        id_device: i64,
        action_type: String,
        timestamp: DateTime<Utc>,
    },
    ActionUpdated {
        action_id: i64,
        id_device: i64,
        status: ActionStatus,
    },
    /// Broadcast to dashboard channels once a device confirms execution.
    ActionConfirmed {
        action_id: i64,
        id_device: i64,
        action_type: String,
        status: ActionStatus,
    },
    AuthResponse {
        success: bool,
        message: String,
    },
    NfcRegistrationSuccess {
        success: bool,
        message: String,
    },
}

/// Device-originated messages read off a channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Auth {
        token: Option<String>,
    },
    NfcCardRegistered {
        card_uid: String,
        user_id: i64,
        #[serde(default)]
        card_name: Option<String>,
    },
    AccessLog {
        #[serde(default)]
        id_user: Option<i64>,
        #[serde(default)]
        user_name: Option<String>,
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        access_type: Option<String>,
    },
    ActionConfirmed {
        action_id: i64,
    },
}
