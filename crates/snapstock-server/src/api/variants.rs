//! Variant text parsing: deterministic first, model fallback, persisted onto
//! the target product. Public — the mobile voice step posts here, flat
//! responses in the shape the capture client consumes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use snapstock_ai::parse_deterministic;
use snapstock_core::VariantOptionSet;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ParseVariantsRequest {
    transcript: Option<String>,
    product_id: Option<i64>,
    session_id: Option<String>,
}

fn flat_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// `POST /api/v1/variants/parse`
pub(super) async fn parse_variants(
    State(state): State<AppState>,
    Json(body): Json<ParseVariantsRequest>,
) -> Response {
    let Some(transcript) = body
        .transcript
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return flat_error(StatusCode::BAD_REQUEST, "Missing transcript");
    };
    if body.product_id.is_none() && body.session_id.is_none() {
        return flat_error(StatusCode::BAD_REQUEST, "Missing productId or sessionId");
    }

    // Deterministic parse wins whenever it matches, so dictated quantities
    // are captured exactly; only unmatched transcripts reach the model.
    let options: VariantOptionSet = match parse_deterministic(transcript) {
        Some(set) => set.normalized(),
        None => {
            let Some(analyzer) = &state.analyzer else {
                return flat_error(StatusCode::INTERNAL_SERVER_ERROR, "AI API Key missing");
            };
            match analyzer.parse_variant_text(transcript).await {
                Ok(set) => set,
                Err(e) => {
                    tracing::error!(error = %e, "variant parsing failed");
                    return flat_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to parse variants",
                    );
                }
            }
        }
    };

    // Resolve the target product: an explicit id, or the session's latest.
    let product_id = match body.product_id {
        Some(id) => id,
        None => {
            let Some(session_id) = body
                .session_id
                .as_deref()
                .and_then(|raw| raw.parse::<Uuid>().ok())
            else {
                return flat_error(StatusCode::NOT_FOUND, "Product not found for this session");
            };
            match snapstock_db::latest_for_session(&state.pool, session_id).await {
                Ok(Some(row)) => row.id,
                Ok(None) => {
                    return flat_error(
                        StatusCode::NOT_FOUND,
                        "Product not found for this session",
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "latest product lookup failed");
                    return flat_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Product not found or database error",
                    );
                }
            }
        }
    };

    if let Err(e) = snapstock_db::update_product_variants(&state.pool, product_id, &options).await {
        tracing::error!(error = %e, product_id, "failed to store variants");
        return flat_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Product not found or database error",
        );
    }

    Json(json!({ "success": true, "variants": options })).into_response()
}
