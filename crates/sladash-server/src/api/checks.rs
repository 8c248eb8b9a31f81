//! Check triggers: run a serviceability or availability check on demand.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use sladash_core::CheckKind;
use sladash_db::PgRecordStore;
use sladash_prober::{CheckReport, CheckRequest, PipelineError};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ErrorCode};

const API_SOURCE: &str = "api";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CheckBody {
    pub test_mode: bool,
    pub return_full_data: bool,
    /// Location names (serviceability) or item ids (availability).
    pub units: Option<Vec<String>>,
    pub batch_size: Option<usize>,
}

impl CheckBody {
    fn into_request(self) -> CheckRequest {
        CheckRequest {
            explicit_unit_ids: self.units,
            test_mode: self.test_mode,
            return_full_data: self.return_full_data,
            batch_size: self.batch_size,
            ..CheckRequest::new(API_SOURCE)
        }
    }
}

pub(super) async fn run_serviceability_check(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CheckBody>,
) -> Result<Json<ApiResponse<CheckReport>>, ApiError> {
    run(state, req_id, CheckKind::Serviceability, body).await
}

pub(super) async fn run_availability_check(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CheckBody>,
) -> Result<Json<ApiResponse<CheckReport>>, ApiError> {
    run(state, req_id, CheckKind::Availability, body).await
}

async fn run(
    state: AppState,
    req_id: RequestId,
    kind: CheckKind,
    body: CheckBody,
) -> Result<Json<ApiResponse<CheckReport>>, ApiError> {
    let request = body.into_request();
    let store = PgRecordStore::new(state.pool.clone());

    let report = state
        .checker
        .run_check(kind, &request, &store)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(report, req_id.0))
}

fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    let api_error = match error {
        PipelineError::AlreadyRunning { .. } => {
            ApiError::new(request_id, ErrorCode::Conflict, error.to_string())
        }
        PipelineError::InvalidRequest(reason) => {
            ApiError::new(request_id, ErrorCode::ValidationError, reason.clone())
        }
        PipelineError::UnitLoad(_) => {
            tracing::error!(error = %error, "check aborted: unit list could not be loaded");
            ApiError::new(request_id, ErrorCode::InternalError, error.to_string())
        }
    };
    api_error.failed_check()
}
