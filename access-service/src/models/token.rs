use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Server-side mirror of an issued JWT. A bearer token is valid only while
/// the signature verifies AND this row is active and unexpired, which makes
/// revocation (logout, password change) effective before cryptographic
/// expiry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionToken {
    pub id: i64,
    pub id_user: i64,
    pub token: String,
    pub status_token: bool,
    pub date_token: DateTime<Utc>,
    pub expiration: DateTime<Utc>,
}
