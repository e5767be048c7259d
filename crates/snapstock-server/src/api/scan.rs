//! The mobile scan action: the unauthenticated endpoint the capture client
//! submits to. Responses are flat JSON in the shape the capture state
//! machine consumes (`success` / `error` / `newSessionId` / `batchCount`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use snapstock_ai::{AiError, ScanOptions};
use snapstock_core::{generate_sku, ScannedProduct};
use snapstock_db::{NewScannedProduct, ScanSessionRow, ShopSettingsRow};
use snapstock_shopify::client::AdminApi as _;
use snapstock_shopify::GraphqlAdminClient;

use super::{effective_settings, plan_or_free, AppState};

/// Default stock applied to freshly scanned products; the merchant adjusts
/// on the dashboard before publishing.
const DEFAULT_INVENTORY_QUANTITY: i64 = 10;

#[derive(Debug, Deserialize)]
pub(super) struct ScanRequest {
    intent: Option<String>,
    image: Option<String>,
    #[serde(default)]
    batch_add: bool,
}

fn flat_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// `POST /api/v1/mobile/{session_id}/scan`
pub(super) async fn mobile_scan(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<ScanRequest>,
) -> Response {
    let Ok(session_id) = session_id.parse::<Uuid>() else {
        return flat_error(StatusCode::NOT_FOUND, "Session not found");
    };

    let session = match snapstock_db::find_resolvable_session(&state.pool, session_id).await {
        Ok(session) => session,
        Err(snapstock_db::DbError::NotFound) => {
            return flat_error(StatusCode::NOT_FOUND, "Session not found");
        }
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            return flat_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Database unavailable. Please try again in a moment.",
            );
        }
    };

    if body.intent.as_deref() == Some("new_session") {
        return new_session(&state, &session).await;
    }

    let is_batch_add = body.batch_add || body.intent.as_deref() == Some("batch_add");

    let settings = match effective_settings(&state.pool, &session.shop).await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, shop = %session.shop, "settings lookup failed");
            return flat_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again.",
            );
        }
    };

    let plan = plan_or_free(&settings.plan);
    if settings.scan_count >= plan.scan_allowance(settings.bonus_scans) {
        return flat_error(StatusCode::FORBIDDEN, "Scan limit reached. Please upgrade.");
    }

    let (currency, country) = shop_context(&state, &settings).await;

    // Image validation happens before any AI call: user-input errors are
    // local and specific.
    let Some(image) = body.image else {
        return flat_error(StatusCode::BAD_REQUEST, "No image provided");
    };
    if image.len() < 50 {
        return flat_error(
            StatusCode::BAD_REQUEST,
            "Image data too small. Try taking a new photo.",
        );
    }
    let (data_url, mime_type) = match normalize_image_field(&image) {
        Ok(parts) => parts,
        Err(message) => return flat_error(StatusCode::BAD_REQUEST, message),
    };

    let Some(analyzer) = &state.analyzer else {
        tracing::error!("scan requested but no AI API key is configured");
        return flat_error(StatusCode::INTERNAL_SERVER_ERROR, "AI API Key missing");
    };

    let options = ScanOptions {
        currency,
        country,
        // OCR adds seconds; the mobile proxy budget cannot afford it.
        skip_ocr: true,
    };
    let product = match analyzer.analyze_image(&data_url, &mime_type, &options).await {
        Ok(product) => product,
        Err(AiError::InvalidImage) => {
            return flat_error(
                StatusCode::BAD_REQUEST,
                "Image data too small. Please take a clear photo and try again.",
            );
        }
        Err(err @ AiError::Auth) => {
            return flat_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "unexpected AI failure escaped the fallback policy");
            return flat_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again.",
            );
        }
    };

    let record = new_record(&product, &data_url);

    if is_batch_add {
        if let Err(e) = snapstock_db::insert_scanned_product(&state.pool, session_id, &record).await
        {
            tracing::error!(error = %e, "batch insert failed");
            return flat_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again.",
            );
        }
        bump_scan_count(&state, &session.shop).await;

        let batch_count = snapstock_db::count_for_session(&state.pool, session_id)
            .await
            .unwrap_or(0);
        tracing::info!(session_id = %session_id, batch_count, "batch scan stored");
        return Json(json!({ "success": true, "batchAdded": true, "batchCount": batch_count }))
            .into_response();
    }

    // Single-capture mode: replace, complete the session, count the scan.
    if let Err(e) = snapstock_db::replace_for_session(&state.pool, session_id, &record).await {
        tracing::error!(error = %e, "scan store failed");
        return flat_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong. Please try again.",
        );
    }
    if let Err(e) = snapstock_db::complete_session(&state.pool, session_id).await {
        tracing::warn!(error = %e, session_id = %session_id, "failed to complete session");
    }
    bump_scan_count(&state, &session.shop).await;

    let mut response_product = product;
    response_product.sku = Some(record.sku.clone());
    response_product.inventory_quantity = Some(record.inventory_quantity);
    response_product.track_inventory = record.track_inventory;

    tracing::info!(session_id = %session_id, title = %response_product.title, "scan stored");
    Json(json!({ "success": true, "product": response_product })).into_response()
}

/// The "scan next product" path: issue a fresh session (fresh id, 1 hour
/// expiry) under the same shop. The old session is simply abandoned.
async fn new_session(state: &AppState, current: &ScanSessionRow) -> Response {
    match snapstock_db::create_session(
        &state.pool,
        &current.shop,
        snapstock_core::session::mobile_session_ttl(),
    )
    .await
    {
        Ok(session) => {
            tracing::info!(old = %current.id, new = %session.id, "session superseded");
            Json(json!({ "newSessionId": session.id })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "new session creation failed");
            flat_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again.",
            )
        }
    }
}

/// Currency/country context for price estimation. The stored default (USD)
/// triggers a best-effort refresh from the platform's shop query when an
/// access token is available; failure leaves the defaults in place.
async fn shop_context(state: &AppState, settings: &ShopSettingsRow) -> (String, String) {
    let mut currency = settings.currency_code.clone();
    let mut country = settings.country_code.clone();

    if currency == "USD" {
        if let Some(token) = &settings.access_token {
            match GraphqlAdminClient::new(
                &settings.shop,
                token,
                &state.config.shopify_api_version,
                state.config.platform_request_timeout_secs,
            ) {
                Ok(client) => match client.shop_info().await {
                    Ok(info) => {
                        currency = info.currency_code;
                        if let Some(code) = info.country_code {
                            country = code;
                        }
                        if let Err(e) = snapstock_db::update_shop_context(
                            &state.pool,
                            &settings.shop,
                            &currency,
                            &country,
                        )
                        .await
                        {
                            tracing::warn!(error = %e, "failed to store shop context");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "shop context fetch failed"),
                },
                Err(e) => tracing::warn!(error = %e, "admin client construction failed"),
            }
        }
    }

    (currency, country)
}

/// Splits an image field (raw base64 or a full data URL) into the stored
/// data URL and its mime type.
fn normalize_image_field(image: &str) -> Result<(String, String), &'static str> {
    if image.starts_with("data:") {
        let Some(comma) = image.find(',') else {
            return Err("Invalid image format. Try again.");
        };
        let mime_type = image[..comma]
            .strip_prefix("data:")
            .and_then(|s| s.split(';').next())
            .unwrap_or("image/jpeg")
            .to_string();
        Ok((image.to_string(), mime_type))
    } else {
        let mime_type = "image/jpeg".to_string();
        Ok((format!("data:{mime_type};base64,{image}"), mime_type))
    }
}

fn new_record(product: &ScannedProduct, data_url: &str) -> NewScannedProduct {
    let sku = generate_sku(&product.title, Utc::now().timestamp_millis());
    NewScannedProduct {
        title: product.title.clone(),
        description_html: product.description_html.clone(),
        product_type: product.product_type.clone(),
        tags: product.tags.clone(),
        estimated_weight_grams: product.estimated_weight,
        price: product.price.clone(),
        sku,
        track_inventory: true,
        inventory_quantity: DEFAULT_INVENTORY_QUANTITY,
        // The scanned image itself; web image search is a dashboard-side
        // enrichment, not part of the mobile path.
        image_urls: vec![data_url.to_string()],
    }
}

async fn bump_scan_count(state: &AppState, shop: &str) {
    if let Err(e) = snapstock_db::increment_scan_count(&state.pool, shop).await {
        tracing::warn!(error = %e, shop, "failed to increment scan count");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_image_field_parses_data_url() {
        let (data_url, mime) =
            normalize_image_field("data:image/png;base64,QUJDQUJD").expect("parse");
        assert_eq!(mime, "image/png");
        assert!(data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn normalize_image_field_wraps_raw_base64() {
        let (data_url, mime) = normalize_image_field("QUJDQUJD").expect("parse");
        assert_eq!(mime, "image/jpeg");
        assert_eq!(data_url, "data:image/jpeg;base64,QUJDQUJD");
    }

    #[test]
    fn normalize_image_field_rejects_data_url_without_comma() {
        assert!(normalize_image_field("data:image/png;base64QUJD").is_err());
    }
}
