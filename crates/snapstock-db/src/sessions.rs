//! Database operations for `scan_sessions`.
//!
//! Sessions are superseded, never deleted: issuing a new session simply
//! abandons the old row, and the grace-window lookup ages stale rows out of
//! resolvability (a lookup past `expires_at` + 2h behaves exactly like "not
//! found").

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scan_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanSessionRow {
    pub id: Uuid,
    pub shop: String,
    /// `PENDING` or `COMPLETED`; see `snapstock_core::ScanSessionStatus`.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Creates a new PENDING session for `shop` expiring `ttl` from now.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_session(
    pool: &PgPool,
    shop: &str,
    ttl: Duration,
) -> Result<ScanSessionRow, DbError> {
    let id = Uuid::new_v4();
    let expires_at = Utc::now() + ttl;

    let row = sqlx::query_as::<_, ScanSessionRow>(
        "INSERT INTO scan_sessions (id, shop, status, expires_at) \
         VALUES ($1, $2, 'PENDING', $3) \
         RETURNING id, shop, status, created_at, expires_at",
    )
    .bind(id)
    .bind(shop)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a session by id, applying the 2-hour grace window: a row whose
/// expiry is more than 2 hours in the past resolves to [`DbError::NotFound`]
/// regardless of its stored status.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for unknown or grace-expired ids, or
/// [`DbError::Sqlx`] on query failure.
pub async fn find_resolvable_session(pool: &PgPool, id: Uuid) -> Result<ScanSessionRow, DbError> {
    let row = sqlx::query_as::<_, ScanSessionRow>(
        "SELECT id, shop, status, created_at, expires_at \
         FROM scan_sessions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    if !snapstock_core::session::is_resolvable(row.expires_at, Utc::now()) {
        return Err(DbError::NotFound);
    }

    Ok(row)
}

/// Fetches a session by id with no grace-window check. The publish path uses
/// this: there the session is only a pointer to its shop, and a draft must
/// stay publishable after the capture handoff has aged out.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for unknown ids, or [`DbError::Sqlx`] on
/// query failure.
pub async fn get_session(pool: &PgPool, id: Uuid) -> Result<ScanSessionRow, DbError> {
    sqlx::query_as::<_, ScanSessionRow>(
        "SELECT id, shop, status, created_at, expires_at \
         FROM scan_sessions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Flips a session to COMPLETED. Idempotent: completing an already-completed
/// session is not an error.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such session exists, or
/// [`DbError::Sqlx`] on query failure.
pub async fn complete_session(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE scan_sessions SET status = 'COMPLETED' WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
