//! Publishing a reviewed draft to the merchant's store, and draft discard.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use snapstock_shopify::{GraphqlAdminClient, ProductPublisher, ShopifyError};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PublishData {
    product_id: String,
    admin_url: String,
}

/// `POST /api/v1/products/{id}/publish` — runs the publish protocol, then
/// flips the row DRAFT → PUBLISHED. The flip is the only re-submission
/// guard; the protocol itself is not idempotent.
pub(super) async fn publish_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = snapstock_db::get_scanned_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if row.status == "PUBLISHED" {
        return Err(ApiError::new(
            req_id.0,
            "already_published",
            "This product has already been published.",
        ));
    }

    let session = snapstock_db::get_session(&state.pool, row.session_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let settings = snapstock_db::get_or_create_shop_settings(&state.pool, &session.shop)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let Some(access_token) = settings.access_token else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "Shopify access token missing for this shop; reinstall the app.",
        ));
    };

    let client = GraphqlAdminClient::new(
        &session.shop,
        &access_token,
        &state.config.shopify_api_version,
        state.config.platform_request_timeout_secs,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "admin client construction failed");
        ApiError::new(
            req_id.0.clone(),
            "internal_error",
            "Could not reach the store. Please try again.",
        )
    })?;

    let publisher = ProductPublisher::new(client, Some(session.shop.clone()));
    let published = publisher
        .publish(&row.into_product())
        .await
        .map_err(|e| map_publish_error(req_id.0.clone(), &e))?;

    if let Err(e) = snapstock_db::mark_published(&state.pool, product_id).await {
        // The remote product exists; losing the flip must not report failure.
        tracing::warn!(error = %e, product_id, "failed to flip product to PUBLISHED");
    }

    tracing::info!(product_id, remote_id = %published.product_id, "product published");

    Ok(Json(ApiResponse {
        data: PublishData {
            product_id: published.product_id,
            admin_url: published.admin_url,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Platform user errors surface verbatim as validation failures the merchant
/// can act on; transport-level failures become a generic gateway error.
fn map_publish_error(request_id: String, error: &ShopifyError) -> ApiError {
    match error {
        ShopifyError::UserErrors { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        other => {
            tracing::error!(error = %other, "publish failed");
            ApiError::new(
                request_id,
                "platform_error",
                "Publishing failed. Please try again.",
            )
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteData {
    deleted: bool,
}

/// `DELETE /api/v1/products/{id}` — explicit draft discard.
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    snapstock_db::delete_scanned_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: DeleteData { deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}
