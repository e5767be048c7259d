mod publish;
mod recent;
mod scan;
mod sessions;
mod variants;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use snapstock_ai::ScanAnalyzer;
use snapstock_core::{AppConfig, PlanTier};
use snapstock_db::ShopSettingsRow;

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Absent when no AI key is configured; AI-backed endpoints report a
    /// configuration error instead of failing at startup.
    pub analyzer: Option<Arc<ScanAnalyzer>>,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" | "already_published" => StatusCode::CONFLICT,
            "upgrade_required" => StatusCode::FORBIDDEN,
            "platform_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &snapstock_db::DbError) -> ApiError {
    if matches!(error, snapstock_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Loads (or creates) a shop's settings, applying the lazy billing-cycle
/// reset before any allowance check.
pub(super) async fn effective_settings(
    pool: &PgPool,
    shop: &str,
) -> Result<ShopSettingsRow, snapstock_db::DbError> {
    let settings = snapstock_db::get_or_create_shop_settings(pool, shop).await?;
    if snapstock_core::plans::cycle_needs_reset(settings.billing_cycle_start, Utc::now()) {
        tracing::info!(shop, "billing cycle lapsed; resetting scan counter");
        return snapstock_db::reset_billing_cycle(pool, shop).await;
    }
    Ok(settings)
}

/// Parses a stored plan string, downgrading unknown tiers to FREE with a
/// warning (a gating path must not 500 because billing wrote a bad value).
pub(super) fn plan_or_free(raw: &str) -> PlanTier {
    PlanTier::parse(raw).unwrap_or_else(|_| {
        tracing::warn!(plan = raw, "unknown plan tier; treating as FREE");
        PlanTier::Free
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

/// Dashboard routes: bearer-authenticated.
fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/sessions", post(sessions::create_session))
        .route("/api/v1/scans/recent", get(recent::list_recent_scans))
        .route(
            "/api/v1/products/{product_id}/publish",
            post(publish::publish_product),
        )
        .route(
            "/api/v1/products/{product_id}",
            axum::routing::delete(publish::delete_product),
        )
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        )))
}

/// Mobile + polling routes: the session id is the credential.
fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/sessions/{session_id}", get(sessions::poll_session))
        .route("/api/v1/mobile/{session_id}/scan", post(scan::mobile_scan))
        .route("/api/v1/variants/parse", post(variants::parse_variants))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    Router::new()
        .merge(public_router())
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match snapstock_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}
