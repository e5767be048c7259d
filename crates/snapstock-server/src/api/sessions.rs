//! Session handoff endpoints: dashboard creation and desktop polling.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use snapstock_core::{ScanSessionStatus, ScannedProduct};

use super::{effective_settings, map_db_error, plan_or_free, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct CreateSessionRequest {
    shop: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateSessionData {
    session_id: Uuid,
    shop: String,
    expires_at: DateTime<Utc>,
    plan: String,
    scan_count: i64,
    limit: i64,
}

/// `POST /api/v1/sessions` — creates a fresh PENDING session for the shop,
/// refused with an upgrade prompt when the scan allowance is exhausted.
pub(super) async fn create_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = body.shop.trim().to_string();
    if shop.is_empty() {
        return Err(ApiError::new(req_id.0, "bad_request", "missing shop"));
    }

    let settings = effective_settings(&state.pool, &shop)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let plan = plan_or_free(&settings.plan);
    let allowance = plan.scan_allowance(settings.bonus_scans);
    if settings.scan_count >= allowance {
        return Err(ApiError::new(
            req_id.0,
            "upgrade_required",
            "Scan limit reached. Please upgrade.",
        ));
    }

    let session = snapstock_db::create_session(
        &state.pool,
        &shop,
        snapstock_core::session::dashboard_session_ttl(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(shop = %shop, session_id = %session.id, "scan session created");

    Ok(Json(ApiResponse {
        data: CreateSessionData {
            session_id: session.id,
            shop,
            expires_at: session.expires_at,
            plan: plan.as_str().to_string(),
            scan_count: settings.scan_count,
            limit: allowance,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct PollSessionData {
    status: ScanSessionStatus,
    product: Option<PolledProduct>,
}

/// The latest product plus its row id (the dashboard needs the id for
/// variant edits and publishing).
#[derive(Debug, Serialize)]
pub(super) struct PolledProduct {
    pub id: i64,
    #[serde(flatten)]
    pub product: ScannedProduct,
}

/// `GET /api/v1/sessions/{id}` — status plus the most recently added
/// product. Unknown, malformed, and grace-expired ids are all the same 404.
pub(super) async fn poll_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let Ok(session_id) = session_id.parse::<Uuid>() else {
        return Err(ApiError::new(req_id.0, "not_found", "Session not found"));
    };

    let session = snapstock_db::find_resolvable_session(&state.pool, session_id)
        .await
        .map_err(|e| match e {
            snapstock_db::DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", "Session not found")
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    let product = snapstock_db::latest_for_session(&state.pool, session_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .map(|row| PolledProduct {
            id: row.id,
            product: row.into_product(),
        });

    // A stored status this code can't parse is a data bug, not a 500 for
    // the polling client; report it as still pending.
    let status = ScanSessionStatus::parse(&session.status).unwrap_or_else(|e| {
        tracing::error!(error = %e, session_id = %session_id, "bad stored session status");
        ScanSessionStatus::Pending
    });

    Ok(Json(ApiResponse {
        data: PollSessionData { status, product },
        meta: ResponseMeta::new(req_id.0),
    }))
}
