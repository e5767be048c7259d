//! Database operations for `scanned_products`.

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use snapstock_core::{ProductStatus, ScannedProduct, VariantOptionSet};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `scanned_products` table.
///
/// `tags` is stored comma-joined; `image_urls` and `variants` are jsonb.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScannedProductRow {
    pub id: i64,
    pub session_id: Uuid,
    pub title: String,
    pub description_html: String,
    pub product_type: String,
    pub tags: String,
    pub estimated_weight_grams: i64,
    pub price: String,
    /// `DRAFT` or `PUBLISHED`; see `snapstock_core::ProductStatus`.
    pub status: String,
    pub sku: Option<String>,
    pub track_inventory: bool,
    pub inventory_quantity: Option<i64>,
    pub image_urls: serde_json::Value,
    pub variants: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScannedProductRow {
    /// Converts the row into the wire-contract [`ScannedProduct`].
    ///
    /// Unparseable jsonb columns degrade to empty collections rather than
    /// erroring — a half-written row should still render on the dashboard.
    #[must_use]
    pub fn into_product(self) -> ScannedProduct {
        let image_urls: Vec<String> =
            serde_json::from_value(self.image_urls).unwrap_or_default();
        let variants: Option<VariantOptionSet> = self
            .variants
            .and_then(|v| serde_json::from_value(v).ok());
        let status = ProductStatus::parse(&self.status).unwrap_or(ProductStatus::Draft);

        ScannedProduct {
            title: self.title,
            description_html: self.description_html,
            product_type: self.product_type,
            tags: self
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToString::to_string)
                .collect(),
            estimated_weight: self.estimated_weight_grams,
            price: self.price,
            status,
            sku: self.sku,
            inventory_quantity: self.inventory_quantity,
            track_inventory: self.track_inventory,
            image_urls,
            variants,
        }
    }
}

/// Field set for inserting a freshly-scanned product.
#[derive(Debug, Clone)]
pub struct NewScannedProduct {
    pub title: String,
    pub description_html: String,
    pub product_type: String,
    pub tags: Vec<String>,
    pub estimated_weight_grams: i64,
    pub price: String,
    pub sku: String,
    pub track_inventory: bool,
    pub inventory_quantity: i64,
    pub image_urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// scanned_products operations
// ---------------------------------------------------------------------------

/// Inserts a product under `session_id` in DRAFT status (batch mode appends).
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_scanned_product(
    pool: &PgPool,
    session_id: Uuid,
    product: &NewScannedProduct,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO scanned_products \
             (session_id, title, description_html, product_type, tags, \
              estimated_weight_grams, price, status, sku, track_inventory, \
              inventory_quantity, image_urls) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'DRAFT', $8, $9, $10, $11::jsonb) \
         RETURNING id",
    )
    .bind(session_id)
    .bind(&product.title)
    .bind(&product.description_html)
    .bind(&product.product_type)
    .bind(product.tags.join(", "))
    .bind(product.estimated_weight_grams)
    .bind(&product.price)
    .bind(&product.sku)
    .bind(product.track_inventory)
    .bind(product.inventory_quantity)
    .bind(json!(product.image_urls))
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Single-capture mode: deletes any existing products for the session, then
/// inserts the new one. Runs in a transaction so a poll never observes an
/// empty session mid-replace.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn replace_for_session(
    pool: &PgPool,
    session_id: Uuid,
    product: &NewScannedProduct,
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM scanned_products WHERE session_id = $1")
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO scanned_products \
             (session_id, title, description_html, product_type, tags, \
              estimated_weight_grams, price, status, sku, track_inventory, \
              inventory_quantity, image_urls) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'DRAFT', $8, $9, $10, $11::jsonb) \
         RETURNING id",
    )
    .bind(session_id)
    .bind(&product.title)
    .bind(&product.description_html)
    .bind(&product.product_type)
    .bind(product.tags.join(", "))
    .bind(product.estimated_weight_grams)
    .bind(&product.price)
    .bind(&product.sku)
    .bind(product.track_inventory)
    .bind(product.inventory_quantity)
    .bind(json!(product.image_urls))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id)
}

/// Number of products accumulated under a session (the batch counter).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_for_session(pool: &PgPool, session_id: Uuid) -> Result<i64, DbError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM scanned_products WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// The most recently added product for a session, by explicit insertion-id
/// order rather than fetch order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_for_session(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<ScannedProductRow>, DbError> {
    let row = sqlx::query_as::<_, ScannedProductRow>(
        "SELECT id, session_id, title, description_html, product_type, tags, \
                estimated_weight_grams, price, status, sku, track_inventory, \
                inventory_quantity, image_urls, variants, created_at, updated_at \
         FROM scanned_products WHERE session_id = $1 \
         ORDER BY id DESC LIMIT 1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Recent scans across all of a shop's sessions, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_for_shop(
    pool: &PgPool,
    shop: &str,
    limit: i64,
) -> Result<Vec<ScannedProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ScannedProductRow>(
        "SELECT p.id, p.session_id, p.title, p.description_html, p.product_type, p.tags, \
                p.estimated_weight_grams, p.price, p.status, p.sku, p.track_inventory, \
                p.inventory_quantity, p.image_urls, p.variants, p.created_at, p.updated_at \
         FROM scanned_products p \
         JOIN scan_sessions s ON s.id = p.session_id \
         WHERE s.shop = $1 AND p.status IN ('DRAFT', 'PUBLISHED') \
         ORDER BY p.created_at DESC \
         LIMIT $2",
    )
    .bind(shop)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches one product by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such row exists, or [`DbError::Sqlx`]
/// on query failure.
pub async fn get_scanned_product(pool: &PgPool, id: i64) -> Result<ScannedProductRow, DbError> {
    sqlx::query_as::<_, ScannedProductRow>(
        "SELECT id, session_id, title, description_html, product_type, tags, \
                estimated_weight_grams, price, status, sku, track_inventory, \
                inventory_quantity, image_urls, variants, created_at, updated_at \
         FROM scanned_products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Replaces a product's variant option set.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such row exists, or [`DbError::Sqlx`]
/// on query failure.
pub async fn update_product_variants(
    pool: &PgPool,
    id: i64,
    variants: &VariantOptionSet,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scanned_products SET variants = $2::jsonb, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(json!(variants))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Flips a product DRAFT → PUBLISHED after a successful remote create.
///
/// The WHERE clause only matches DRAFT rows, so the transition is one-way and
/// a double publish surfaces as [`DbError::AlreadyPublished`].
///
/// # Errors
///
/// Returns [`DbError::AlreadyPublished`] if the row exists but is not DRAFT,
/// [`DbError::NotFound`] if it does not exist, or [`DbError::Sqlx`] on query
/// failure.
pub async fn mark_published(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scanned_products SET status = 'PUBLISHED', updated_at = NOW() \
         WHERE id = $1 AND status = 'DRAFT'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM scanned_products WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;
        return Err(if exists {
            DbError::AlreadyPublished { id }
        } else {
            DbError::NotFound
        });
    }

    Ok(())
}

/// Deletes one draft (explicit user discard).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such row exists, or [`DbError::Sqlx`]
/// on query failure.
pub async fn delete_scanned_product(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM scanned_products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Removes every trace of a shop (shop-redact): products via their sessions,
/// the sessions themselves, and the shop settings row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn purge_shop_data(pool: &PgPool, shop: &str) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM scanned_products \
         WHERE session_id IN (SELECT id FROM scan_sessions WHERE shop = $1)",
    )
    .bind(shop)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM scan_sessions WHERE shop = $1")
        .bind(shop)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM shop_settings WHERE shop = $1")
        .bind(shop)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
