use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of event recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Nfc,
    Pin,
    Remote,
    Local,
    Security,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Nfc => "nfc",
            AccessType::Pin => "pin",
            AccessType::Remote => "remote",
            AccessType::Local => "local",
            AccessType::Security => "security",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "nfc" => AccessType::Nfc,
            "pin" => AccessType::Pin,
            "local" => AccessType::Local,
            "security" => AccessType::Security,
            _ => AccessType::Remote,
        }
    }
}

/// Append-only audit entry. The service never updates or deletes these rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessLog {
    pub id: i64,
    pub event: String,
    pub id_device: i64,
    pub id_user: Option<i64>,
    pub id_action: Option<i64>,
    pub access_type: String,
    pub timestamp: DateTime<Utc>,
}

/// Audit entry awaiting insertion.
#[derive(Debug, Clone)]
pub struct NewLog {
    pub event: String,
    pub id_device: i64,
    pub id_user: Option<i64>,
    pub id_action: Option<i64>,
    pub access_type: AccessType,
}

impl NewLog {
    pub fn new(id_device: i64, access_type: AccessType, event: impl Into<String>) -> Self {
        NewLog {
            event: event.into(),
            id_device,
            id_user: None,
            id_action: None,
            access_type,
        }
    }

    pub fn with_user(mut self, id_user: i64) -> Self {
        self.id_user = Some(id_user);
        self
    }

    pub fn with_action(mut self, id_action: i64) -> Self {
        self.id_action = Some(id_action);
        self
    }
}
