mod checks;
mod records;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sladash_core::CheckKind;
use sladash_prober::Checker;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::{
    limit_triggers, request_id, require_bearer_auth, AuthState, RequestId, TriggerLimit,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Shared with the scheduler so both see the same run guard.
    pub checker: Arc<Checker>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

/// Success envelope: `{data, meta}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn new(data: T, request_id: String) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    ValidationError,
    Conflict,
    RateLimited,
    InternalError,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Error envelope: `{error{code, message}, meta}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// `false` on check triggers that aborted before producing a report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

impl ApiError {
    pub fn new(request_id: String, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: None,
            error: ErrorBody {
                code,
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id),
        }
    }

    #[must_use]
    pub fn failed_check(mut self) -> Self {
        self.success = Some(false);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.error.code.status(), Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &sladash_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, ErrorCode::InternalError, "database query failed")
}

/// Assembles the HTTP API.
///
/// Everything but `/api/v1/health` sits behind bearer auth. The two trigger
/// routes are additionally limited per check kind.
pub fn build_app(state: AppState, auth: AuthState, triggers: TriggerLimit) -> Router {
    let protected = Router::new()
        .route(
            "/api/v1/checks/serviceability",
            post(checks::run_serviceability_check).layer(from_fn_with_state(
                (triggers.clone(), CheckKind::Serviceability),
                limit_triggers,
            )),
        )
        .route(
            "/api/v1/checks/availability",
            post(checks::run_availability_check).layer(from_fn_with_state(
                (triggers, CheckKind::Availability),
                limit_triggers,
            )),
        )
        .route("/api/v1/serviceability", get(records::list_serviceability))
        .route("/api/v1/availability", get(records::list_availability))
        .route_layer(from_fn_with_state(auth, require_bearer_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ]);

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(cors).layer(from_fn(request_id)))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

/// 200 when the database answers, 503 `degraded` otherwise.
async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> (StatusCode, Json<ApiResponse<HealthData>>) {
    let (status, data) = match sladash_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            HealthData {
                status: "ok",
                database: "ok",
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthData {
                    status: "degraded",
                    database: "unavailable",
                },
            )
        }
    };
    (status, ApiResponse::new(data, req_id.0))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
