use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

use crate::config::Settings;
use crate::error::AppResult;
use crate::password;

/// Why schema creation failed at startup.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("database unreachable: {0}")]
    Unreachable(#[source] sqlx::Error),
    #[error("database rejected schema statement: {0}")]
    Rejected(#[source] sqlx::Error),
    #[error("schema creation failed: {0}")]
    Other(#[source] sqlx::Error),
}

impl SchemaError {
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaError::Unreachable(_) => "unreachable",
            SchemaError::Rejected(_) => "rejected",
            SchemaError::Other(_) => "other",
        }
    }
}

impl From<sqlx::Error> for SchemaError {
    fn from(err: sqlx::Error) -> Self {
        let unreachable = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_) => true,
            // SQLITE_CANTOPEN and its extended codes
            sqlx::Error::Database(db_err) => {
                db_err.code().and_then(|c| c.parse::<i32>().ok()).map(|c| c & 0xff == 14).unwrap_or(false)
            }
            _ => false,
        };
        match err {
            _ if unreachable => SchemaError::Unreachable(err),
            sqlx::Error::Database(_) => SchemaError::Rejected(err),
            _ => SchemaError::Other(err),
        }
    }
}

/// Builds the connection pool without opening a connection.
///
/// A malformed URL fails here; an unreachable database only shows up on first
/// use. The pool holds at most `pool_size + max_overflow` connections.
pub fn connect_lazy(settings: &Settings) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&settings.database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));

    Ok(SqlitePoolOptions::new()
        .max_connections(settings.database_max_connections())
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy_with(options))
}

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'admin',
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
    )"#,
    r#"CREATE TABLE IF NOT EXISTS shipments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tracking_number TEXT NOT NULL UNIQUE COLLATE NOCASE,
        status TEXT NOT NULL DEFAULT 'BOOKED',
        origin TEXT NOT NULL,
        destination TEXT NOT NULL,
        current_location TEXT NULL,
        sender_name TEXT NULL,
        recipient_name TEXT NULL,
        recipient_email TEXT NULL,
        weight_kg REAL NULL,
        description TEXT NULL,
        sending_date TEXT NULL,
        estimated_delivery TEXT NULL,
        actual_delivery TEXT NULL,
        front_image TEXT NULL,
        rear_image TEXT NULL,
        qr_code TEXT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
        updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
    )"#,
    r#"CREATE TABLE IF NOT EXISTS shipment_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        shipment_id INTEGER NOT NULL,
        status TEXT NOT NULL,
        location TEXT NULL,
        description TEXT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
        FOREIGN KEY(shipment_id) REFERENCES shipments(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS interventions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        shipment_id INTEGER NOT NULL,
        kind TEXT NOT NULL CHECK (kind IN ('customs', 'security', 'damage', 'delay')),
        reason TEXT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
        resolved_at TEXT NULL,
        FOREIGN KEY(shipment_id) REFERENCES shipments(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS communications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        shipment_id INTEGER NOT NULL,
        direction TEXT NOT NULL DEFAULT 'outbound',
        channel TEXT NOT NULL DEFAULT 'email',
        recipient TEXT NULL,
        subject TEXT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
        FOREIGN KEY(shipment_id) REFERENCES shipments(id) ON DELETE CASCADE
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_shipments_status_created ON shipments(status, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_events_shipment ON shipment_events(shipment_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_interventions_shipment ON interventions(shipment_id, active)",
    "CREATE INDEX IF NOT EXISTS idx_communications_shipment ON communications(shipment_id, created_at DESC)",
];

/// Creates every declared table and index. Safe to run repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), SchemaError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Inserts the bootstrap admin account unless a user with that name exists.
/// Returns whether a row was created.
pub async fn seed_admin(pool: &SqlitePool, settings: &Settings) -> AppResult<bool> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
        .bind(&settings.admin_username)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let plain = settings.admin_password.clone();
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain)).await??;

    let result = sqlx::query(
        "INSERT OR IGNORE INTO users (username, email, password_hash, role) VALUES (?, ?, ?, 'admin')",
    )
    .bind(&settings.admin_username)
    .bind(&settings.admin_email)
    .bind(hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
