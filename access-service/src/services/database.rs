//! Database service for the access-control backend.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;
use std::time::Duration;
use tracing::{info, instrument};

use crate::dtos::actions::ActionListQuery;
use crate::dtos::devices::{CreateDeviceRequest, DeviceListQuery, UpdateDeviceRequest};
use crate::dtos::logs::LogListQuery;
use crate::error::AppError;
use crate::models::{AccessLog, AccessPin, Device, DeviceAction, NewLog, NfcCard, SessionToken, User};

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 100;

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        info!(max_connections = max_connections, "Connecting to SQLite");

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("SQLite connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    pub async fn create_user(
        &self,
        name: &str,
        username: &str,
        password_hash: &str,
        email: &str,
        status: bool,
    ) -> Result<User, AppError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, username, password, email, status, deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, FALSE, ?, ?)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Username or email already registered"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
        })?;

        info!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND deleted = FALSE")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? AND deleted = FALSE")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? AND deleted = FALSE")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    pub async fn list_users(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE deleted = FALSE ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(clamp_limit(limit))
        .bind(offset.unwrap_or(0).max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn update_user(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
        status: Option<bool>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                password = COALESCE(?, password),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ? AND deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update user: {}", e)),
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;
        Ok(user)
    }

    pub async fn soft_delete_user(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET deleted = TRUE, status = FALSE, updated_at = ? WHERE id = ? AND deleted = FALSE",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
        }
        Ok(())
    }

    pub async fn touch_last_connection(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_connection = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_user_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password = ?, updated_at = ? WHERE id = ? AND deleted = FALSE")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Session tokens
    // -------------------------------------------------------------------------

    pub async fn insert_token(
        &self,
        id_user: i64,
        token: &str,
        expiration: DateTime<Utc>,
    ) -> Result<SessionToken, AppError> {
        let row = sqlx::query_as::<_, SessionToken>(
            r#"
            INSERT INTO tokens (id_user, token, status_token, date_token, expiration)
            VALUES (?, ?, TRUE, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id_user)
        .bind(token)
        .bind(Utc::now())
        .bind(expiration)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// A token is accepted only while its mirror row is active and unexpired.
    pub async fn find_active_token(&self, token: &str) -> Result<Option<SessionToken>, AppError> {
        let row = sqlx::query_as::<_, SessionToken>(
            "SELECT * FROM tokens WHERE token = ? AND status_token = TRUE AND expiration > ?",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Returns false when no active row matched the token.
    pub async fn revoke_token(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE tokens SET status_token = FALSE WHERE token = ? AND status_token = TRUE")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn revoke_user_tokens(&self, id_user: i64) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE tokens SET status_token = FALSE WHERE id_user = ? AND status_token = TRUE")
            .bind(id_user)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // -------------------------------------------------------------------------
    // Devices
    // -------------------------------------------------------------------------

    pub async fn create_device(&self, input: &CreateDeviceRequest) -> Result<Device, AppError> {
        let now = Utc::now();
        let device = sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (name, status, direction, nfc_reader_active, emergency_mode, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.status.as_deref().unwrap_or("offline"))
        .bind(input.direction.as_deref())
        .bind(input.nfc_reader_active.unwrap_or(true))
        .bind(input.emergency_mode.unwrap_or(false))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Device '{}' already exists", input.name))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create device: {}", e)),
        })?;

        info!(device_id = device.id, name = %device.name, "Device created");
        Ok(device)
    }

    pub async fn find_device_by_id(&self, id: i64) -> Result<Option<Device>, AppError> {
        let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }

    pub async fn find_device_by_name(&self, name: &str) -> Result<Option<Device>, AppError> {
        let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }

    pub async fn list_devices(&self, filter: &DeviceListQuery) -> Result<Vec<Device>, AppError> {
        let mut builder = QueryBuilder::new("SELECT * FROM devices WHERE 1=1");
        if let Some(status) = &filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(name) = &filter.name {
            builder.push(" AND name LIKE ").push_bind(format!("%{}%", name));
        }
        builder
            .push(" ORDER BY id LIMIT ")
            .push_bind(clamp_limit(filter.limit))
            .push(" OFFSET ")
            .push_bind(filter.offset.unwrap_or(0).max(0));

        let devices = builder.build_query_as::<Device>().fetch_all(&self.pool).await?;
        Ok(devices)
    }

    pub async fn update_device(&self, id: i64, input: &UpdateDeviceRequest) -> Result<Device, AppError> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            UPDATE devices
            SET name = COALESCE(?, name),
                status = COALESCE(?, status),
                direction = COALESCE(?, direction),
                nfc_reader_active = COALESCE(?, nfc_reader_active),
                emergency_mode = COALESCE(?, emergency_mode),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.name.as_deref())
        .bind(input.status.as_deref())
        .bind(input.direction.as_deref())
        .bind(input.nfc_reader_active)
        .bind(input.emergency_mode)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Device name already in use"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update device: {}", e)),
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Device not found")))?;
        Ok(device)
    }

    pub async fn delete_device(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Device not found")));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // NFC cards
    // -------------------------------------------------------------------------

    pub async fn create_nfc_card(
        &self,
        card_uid: &str,
        id_user: i64,
        card_name: &str,
        status: bool,
    ) -> Result<NfcCard, AppError> {
        let now = Utc::now();
        let card = sqlx::query_as::<_, NfcCard>(
            r#"
            INSERT INTO nfc_cards (card_uid, id_user, card_name, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(card_uid)
        .bind(id_user)
        .bind(card_name)
        .bind(status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Card UID already registered"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create NFC card: {}", e)),
        })?;

        info!(card_id = card.id, user_id = card.id_user, "NFC card created");
        Ok(card)
    }

    pub async fn find_nfc_card_by_id(&self, id: i64) -> Result<Option<NfcCard>, AppError> {
        let card = sqlx::query_as::<_, NfcCard>("SELECT * FROM nfc_cards WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    pub async fn find_nfc_card_by_uid(&self, card_uid: &str) -> Result<Option<NfcCard>, AppError> {
        let card = sqlx::query_as::<_, NfcCard>("SELECT * FROM nfc_cards WHERE card_uid = ?")
            .bind(card_uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    pub async fn find_enabled_card_by_uid(&self, card_uid: &str) -> Result<Option<NfcCard>, AppError> {
        let card =
            sqlx::query_as::<_, NfcCard>("SELECT * FROM nfc_cards WHERE card_uid = ? AND status = TRUE")
                .bind(card_uid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(card)
    }

    pub async fn list_nfc_cards(&self, id_user: Option<i64>) -> Result<Vec<NfcCard>, AppError> {
        let cards = match id_user {
            Some(id_user) => {
                sqlx::query_as::<_, NfcCard>("SELECT * FROM nfc_cards WHERE id_user = ? ORDER BY id")
                    .bind(id_user)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, NfcCard>("SELECT * FROM nfc_cards ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(cards)
    }

    pub async fn update_nfc_card(
        &self,
        id: i64,
        card_name: Option<&str>,
        status: Option<bool>,
    ) -> Result<NfcCard, AppError> {
        let card = sqlx::query_as::<_, NfcCard>(
            r#"
            UPDATE nfc_cards
            SET card_name = COALESCE(?, card_name),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(card_name)
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("NFC card not found")))?;
        Ok(card)
    }

    pub async fn delete_nfc_card(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM nfc_cards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("NFC card not found")));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Access PINs
    // -------------------------------------------------------------------------

    pub async fn create_access_pin(
        &self,
        id_user: i64,
        pin_code: &str,
        status: bool,
    ) -> Result<AccessPin, AppError> {
        let now = Utc::now();
        let pin = sqlx::query_as::<_, AccessPin>(
            r#"
            INSERT INTO access_pins (id_user, pin_code, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id_user)
        .bind(pin_code)
        .bind(status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(pin_id = pin.id, user_id = pin.id_user, "Access PIN created");
        Ok(pin)
    }

    pub async fn find_access_pin_by_id(&self, id: i64) -> Result<Option<AccessPin>, AppError> {
        let pin = sqlx::query_as::<_, AccessPin>("SELECT * FROM access_pins WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(pin)
    }

    pub async fn find_enabled_pin_by_code(&self, pin_code: &str) -> Result<Option<AccessPin>, AppError> {
        let pin = sqlx::query_as::<_, AccessPin>(
            "SELECT * FROM access_pins WHERE pin_code = ? AND status = TRUE",
        )
        .bind(pin_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pin)
    }

    pub async fn find_active_pin_for_user(&self, id_user: i64) -> Result<Option<AccessPin>, AppError> {
        let pin = sqlx::query_as::<_, AccessPin>(
            "SELECT * FROM access_pins WHERE id_user = ? AND status = TRUE",
        )
        .bind(id_user)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pin)
    }

    pub async fn list_access_pins(&self, id_user: Option<i64>) -> Result<Vec<AccessPin>, AppError> {
        let pins = match id_user {
            Some(id_user) => {
                sqlx::query_as::<_, AccessPin>("SELECT * FROM access_pins WHERE id_user = ? ORDER BY id")
                    .bind(id_user)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, AccessPin>("SELECT * FROM access_pins ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(pins)
    }

    pub async fn update_access_pin(
        &self,
        id: i64,
        pin_code: Option<&str>,
        status: Option<bool>,
    ) -> Result<AccessPin, AppError> {
        let pin = sqlx::query_as::<_, AccessPin>(
            r#"
            UPDATE access_pins
            SET pin_code = COALESCE(?, pin_code),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(pin_code)
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Access PIN not found")))?;
        Ok(pin)
    }

    pub async fn delete_access_pin(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM access_pins WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Access PIN not found")));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Device actions
    // -------------------------------------------------------------------------

    pub async fn create_action(&self, id_device: i64, action: &str) -> Result<DeviceAction, AppError> {
        let row = sqlx::query_as::<_, DeviceAction>(
            r#"
            INSERT INTO actions_devices (id_device, action, executed, created_at)
            VALUES (?, ?, FALSE, ?)
            RETURNING *
            "#,
        )
        .bind(id_device)
        .bind(action)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(action_id = row.id, device_id = row.id_device, action = %row.action, "Action created");
        Ok(row)
    }

    pub async fn find_action_by_id(&self, id: i64) -> Result<Option<DeviceAction>, AppError> {
        let action = sqlx::query_as::<_, DeviceAction>("SELECT * FROM actions_devices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(action)
    }

    pub async fn set_action_executed(&self, id: i64, executed: bool) -> Result<DeviceAction, AppError> {
        let action = sqlx::query_as::<_, DeviceAction>(
            "UPDATE actions_devices SET executed = ? WHERE id = ? RETURNING *",
        )
        .bind(executed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Action not found")))?;
        Ok(action)
    }

    pub async fn list_actions(&self, filter: &ActionListQuery) -> Result<Vec<DeviceAction>, AppError> {
        let mut builder = QueryBuilder::new("SELECT * FROM actions_devices WHERE 1=1");
        if let Some(id_device) = filter.id_device {
            builder.push(" AND id_device = ").push_bind(id_device);
        }
        if let Some(executed) = filter.executed {
            builder.push(" AND executed = ").push_bind(executed);
        }
        builder
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(clamp_limit(filter.limit))
            .push(" OFFSET ")
            .push_bind(filter.offset.unwrap_or(0).max(0));

        let actions = builder
            .build_query_as::<DeviceAction>()
            .fetch_all(&self.pool)
            .await?;
        Ok(actions)
    }

    pub async fn delete_action(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM actions_devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Action not found")));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Audit log (append only)
    // -------------------------------------------------------------------------

    pub async fn append_log(&self, entry: NewLog) -> Result<AccessLog, AppError> {
        let log = sqlx::query_as::<_, AccessLog>(
            r#"
            INSERT INTO logs (event, id_device, id_user, id_action, access_type, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&entry.event)
        .bind(entry.id_device)
        .bind(entry.id_user)
        .bind(entry.id_action)
        .bind(entry.access_type.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(log)
    }

    /// Returns the total matching row count alongside the requested page.
    pub async fn list_logs(&self, filter: &LogListQuery) -> Result<(i64, Vec<AccessLog>), AppError> {
        let limit = filter.limit.clamp(1, 100);
        let page = filter.page.max(1);
        let offset = (page - 1) * limit;

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM logs WHERE 1=1");
        push_log_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::new("SELECT * FROM logs WHERE 1=1");
        push_log_filters(&mut builder, filter);
        builder
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let logs = builder.build_query_as::<AccessLog>().fetch_all(&self.pool).await?;
        Ok((total, logs))
    }
}

fn push_log_filters<'a>(builder: &mut QueryBuilder<'a, sqlx::Sqlite>, filter: &'a LogListQuery) {
    if let Some(id_device) = filter.id_device {
        builder.push(" AND id_device = ").push_bind(id_device);
    }
    if let Some(event) = &filter.event_contains {
        builder.push(" AND event LIKE ").push_bind(format!("%{}%", event));
    }
    if let Some(access_type) = &filter.access_type {
        builder.push(" AND access_type = ").push_bind(access_type);
    }
    if let Some(id_action) = filter.id_action {
        builder.push(" AND id_action = ").push_bind(id_action);
    }
}
