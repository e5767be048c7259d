//! Database operations for `shop_settings` (plan state per shop).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `shop_settings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopSettingsRow {
    pub shop: String,
    /// `FREE`, `PRO`, or `UNLIMITED`; see `snapstock_core::PlanTier`.
    pub plan: String,
    pub scan_count: i64,
    pub bonus_scans: i64,
    pub billing_cycle_start: DateTime<Utc>,
    pub currency_code: String,
    pub country_code: String,
    /// Admin API access token captured at install time. Absent until the
    /// shop completes OAuth (which lives outside this system).
    pub access_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetches a shop's settings, creating a FREE-tier row on first contact.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn get_or_create_shop_settings(
    pool: &PgPool,
    shop: &str,
) -> Result<ShopSettingsRow, DbError> {
    let row = sqlx::query_as::<_, ShopSettingsRow>(
        "INSERT INTO shop_settings (shop, plan) VALUES ($1, 'FREE') \
         ON CONFLICT (shop) DO UPDATE SET updated_at = NOW() \
         RETURNING shop, plan, scan_count, bonus_scans, billing_cycle_start, \
                   currency_code, country_code, access_token, created_at, updated_at",
    )
    .bind(shop)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Atomically increments the shop's scan counter. Concurrent batch scans rely
/// on this being a single `UPDATE`, not a read-modify-write.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no settings row exists, or
/// [`DbError::Sqlx`] on query failure.
pub async fn increment_scan_count(pool: &PgPool, shop: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE shop_settings SET scan_count = scan_count + 1, updated_at = NOW() \
         WHERE shop = $1",
    )
    .bind(shop)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Lazy billing-cycle reset: zeroes the scan counter and restarts the cycle.
/// Called when `snapstock_core::plans::cycle_needs_reset` says the stored
/// cycle has lapsed.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no settings row exists, or
/// [`DbError::Sqlx`] on query failure.
pub async fn reset_billing_cycle(pool: &PgPool, shop: &str) -> Result<ShopSettingsRow, DbError> {
    sqlx::query_as::<_, ShopSettingsRow>(
        "UPDATE shop_settings \
         SET scan_count = 0, billing_cycle_start = NOW(), updated_at = NOW() \
         WHERE shop = $1 \
         RETURNING shop, plan, scan_count, bonus_scans, billing_cycle_start, \
                   currency_code, country_code, access_token, created_at, updated_at",
    )
    .bind(shop)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Stores the currency/country context discovered from the platform's shop
/// query (best-effort refresh on first scan).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no settings row exists, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_shop_context(
    pool: &PgPool,
    shop: &str,
    currency_code: &str,
    country_code: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE shop_settings \
         SET currency_code = $2, country_code = $3, updated_at = NOW() \
         WHERE shop = $1",
    )
    .bind(shop)
    .bind(currency_code)
    .bind(country_code)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
