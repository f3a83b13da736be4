//! REST API handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use perfprof_core::{PerformanceProfile, ProfileError, WorkloadDefinition};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// HTTP status for each engine error class.
pub fn status_for(err: &ProfileError) -> StatusCode {
    match err {
        ProfileError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ProfileError::Fetch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ProfileError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ProfileError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Profile request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateProfileRequest {
    pub workload_definition: Option<WorkloadDefinition>,
}

/// Profile response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateProfileResponse {
    pub performance_profile: PerformanceProfile,
}

// ── Profile ────────────────────────────────────────────────────

/// POST /api/v1/profile
pub async fn generate_profile(
    State(state): State<ApiState>,
    Json(req): Json<GenerateProfileRequest>,
) -> impl IntoResponse {
    let Some(workload) = req.workload_definition else {
        return error_response(
            "request and workload_definition must be provided",
            StatusCode::BAD_REQUEST,
        )
        .into_response();
    };

    let cancel = state.shutdown.child_token();
    match state.engine.generate_profile(&workload, &cancel).await {
        Ok(profile) => {
            info!(entries = profile.entries.len(), "profile request served");
            ApiResponse::ok(GenerateProfileResponse {
                performance_profile: profile,
            })
            .into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            if e.is_client_error() {
                warn!(error = %e, status = status.as_u16(), "rejected profile request");
            } else {
                error!(error = %e, status = status.as_u16(), "profile request failed");
            }
            error_response(&e.to_string(), status).into_response()
        }
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("serving")
}
