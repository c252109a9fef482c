//! API routes for cabled
//!
//! Every error leaves as `{success: false, message, error_code, stage}` so
//! clients can branch on `error_code` instead of the message text.

use crate::server::AppState;
use crate::store::{DesignRecord, DEFAULT_LIST_LIMIT};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use cable_common::{
    DesignId, EngineError, InputError, OperatorAction, Provenance, Stage, StageError,
    ValidationFailure, ValidationOutcome, ValidationRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

type AppStateArc = Arc<AppState>;

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<OperatorAction>,
}

impl ErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code: code.to_string(),
            stage: None,
            action: None,
        }
    }
}

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody::new(code, message)))
}

/// HTTP status for a failed validation.
pub fn status_for(failure: &ValidationFailure) -> StatusCode {
    match &failure.error {
        StageError::Input(InputError::NotFound(_)) => StatusCode::NOT_FOUND,
        StageError::Input(InputError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        StageError::Input(_) => StatusCode::BAD_REQUEST,
        StageError::Engine(EngineError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        StageError::Engine(EngineError::Unreachable(_))
        | StageError::Engine(EngineError::QuotaExceeded(_)) => StatusCode::SERVICE_UNAVAILABLE,
        StageError::Engine(EngineError::MalformedTransport(_)) => StatusCode::BAD_GATEWAY,
        StageError::Parse(_) | StageError::Aggregation(_) => StatusCode::BAD_GATEWAY,
    }
}

fn failure_response(failure: ValidationFailure) -> ApiError {
    let body = ErrorBody {
        success: false,
        message: failure.error.to_string(),
        error_code: failure.code().to_string(),
        stage: Some(failure.stage),
        action: Some(failure.operator_action()),
    };
    (status_for(&failure), Json(body))
}

// ============================================================================
// Design Routes
// ============================================================================

pub fn design_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/design/validate", post(validate_design))
        .route("/design/list", get(list_designs))
        .route("/design/:id", get(get_design))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub message: String,
    pub input_type: Provenance,
    pub data: ValidationOutcome,
}

async fn validate_design(
    State(state): State<AppStateArc>,
    payload: Result<Json<ValidationRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        let mut body = ErrorBody::new("INPUT_MALFORMED_REQUEST", rejection.body_text());
        body.stage = Some(Stage::Normalizing);
        body.action = Some(OperatorAction::FixInput);
        (StatusCode::BAD_REQUEST, Json(body))
    })?;

    let outcome = state
        .controller
        .validate(request)
        .await
        .map_err(failure_response)?;

    Ok(Json(ValidateResponse {
        success: true,
        message: "Validation completed successfully".to_string(),
        input_type: outcome.provenance(),
        data: outcome,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<DesignRecord>,
    pub count: usize,
    pub total: usize,
}

async fn list_designs(
    State(state): State<AppStateArc>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let store_error = |e: anyhow::Error| {
        error!("  Design list failed: {:#}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            "Failed to read cable designs",
        )
    };

    let data = state.store.list(query.skip, limit).map_err(store_error)?;
    let total = state.store.count().map_err(store_error)?;

    Ok(Json(ListResponse {
        success: true,
        count: data.len(),
        total,
        data,
    }))
}

#[derive(Debug, Serialize)]
pub struct DesignResponse {
    pub success: bool,
    pub data: DesignRecord,
}

async fn get_design(
    State(state): State<AppStateArc>,
    Path(id): Path<DesignId>,
) -> Result<Json<DesignResponse>, ApiError> {
    if id < 1 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INPUT_INVALID_ID",
            InputError::InvalidId(id).to_string(),
        ));
    }

    match state.store.get(id) {
        Ok(Some(data)) => Ok(Json(DesignResponse {
            success: true,
            data,
        })),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "INPUT_NOT_FOUND",
            InputError::NotFound(id).to_string(),
        )),
        Err(e) => {
            error!("  Design {} lookup failed: {:#}", id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Failed to read cable design",
            ))
        }
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
    pub uptime_secs: u64,
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    info!("  Health check");
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.controller.engine_name(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
