//! The shop-wide recent-scans feed the dashboard polls alongside the
//! per-session endpoint.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::sessions::PolledProduct;
use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

const DEFAULT_FEED_LIMIT: i64 = 20;
const FULL_FEED_LIMIT: i64 = 250;

#[derive(Debug, Deserialize)]
pub(super) struct RecentScansQuery {
    shop: Option<String>,
    #[serde(default)]
    all: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RecentScansData {
    recent_scans: Vec<PolledProduct>,
}

/// `GET /api/v1/scans/recent?shop=…&all=true`
pub(super) async fn list_recent_scans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RecentScansQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(shop) = query.shop.filter(|s| !s.trim().is_empty()) else {
        return Err(ApiError::new(req_id.0, "bad_request", "missing shop"));
    };

    let limit = if query.all {
        FULL_FEED_LIMIT
    } else {
        DEFAULT_FEED_LIMIT
    };

    let rows = snapstock_db::list_recent_for_shop(&state.pool, &shop, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let recent_scans = rows
        .into_iter()
        .map(|row| PolledProduct {
            id: row.id,
            product: row.into_product(),
        })
        .collect();

    Ok(Json(ApiResponse {
        data: RecentScansData { recent_scans },
        meta: ResponseMeta::new(req_id.0),
    }))
}
