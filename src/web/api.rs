//! Defines the Axum API routes and handlers.

use crate::catalog::InMemoryPartCatalog;
use crate::print_job::PrintJobManager;
use crate::query::{JobFilter, JobRow};
use crate::web::models::{ActiveCountResponse, ErrorResponse, JobListParams};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use queue_shared::{JobAction, JobId, JobPatch, NewJob, PrintJobError};
use std::sync::Arc;

pub struct AppStateInner {
    pub manager: PrintJobManager,
    pub catalog: Arc<InMemoryPartCatalog>,
}
pub type AppState = Arc<AppStateInner>;

/// Creates the Axum router with all the API endpoints.
pub fn create_router(manager: PrintJobManager, catalog: Arc<InMemoryPartCatalog>) -> Router {
    create_router_with_state(Arc::new(AppStateInner { manager, catalog }))
}

pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/parts", get(list_parts))
        .route("/api/v1/jobs", get(list_jobs).post(create_job))
        .route("/api/v1/jobs/active-count", get(active_count))
        .route("/api/v1/jobs/{id}", get(get_job).patch(edit_job).delete(delete_job))
        .route("/api/v1/jobs/{id}/{action}", post(apply_action))
        .with_state(state)
}

/// Helper to create a JSON error response with a message and status code
fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Maps the controller's error taxonomy onto HTTP.
fn job_error(err: PrintJobError) -> Response {
    let message = err.to_string();
    match err {
        PrintJobError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new("Validation failed").with_fields(errors.iter())),
        )
            .into_response(),
        PrintJobError::CapacityExceeded { limit } => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                limit: Some(limit),
                ..ErrorResponse::new(message)
            }),
        )
            .into_response(),
        PrintJobError::InvalidTransition { action, state } => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                action: Some(action),
                state: Some(state),
                ..ErrorResponse::new(message)
            }),
        )
            .into_response(),
        PrintJobError::NotFound(_) => json_error(&message, StatusCode::NOT_FOUND),
    }
}

/// Body that failed to parse as the expected JSON. Keeps axum's status
/// (400 syntax, 415 content type, 422 shape) but answers with `ErrorResponse`.
fn body_error(rejection: JsonRejection) -> Response {
    tracing::warn!("Rejected request body: {}", rejection.body_text());
    json_error(&rejection.body_text(), rejection.status())
}

fn parse_id(raw: &str) -> Result<JobId, Response> {
    raw.parse()
        .map_err(|_| json_error(&format!("Invalid job id '{}'", raw), StatusCode::BAD_REQUEST))
}

async fn health() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "result": "ok" }))).into_response()
}

/// GET /api/v1/parts
async fn list_parts(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(state.catalog.list())).into_response()
}

/// GET /api/v1/jobs?status=&operatorId=
async fn list_jobs(State(state): State<AppState>, Query(params): Query<JobListParams>) -> Response {
    let filter = match JobFilter::parse(params.status.as_deref(), params.operator_id.as_deref()) {
        Ok(filter) => filter,
        Err(e) => return job_error(e),
    };
    let view = state.manager.view(&filter).await;
    (StatusCode::OK, Json(view)).into_response()
}

/// POST /api/v1/jobs
async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<NewJob>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return body_error(rejection),
    };
    match state.manager.create_job(payload).await {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(e) => job_error(e),
    }
}

/// GET /api/v1/jobs/active-count
async fn active_count(State(state): State<AppState>) -> Response {
    let response = ActiveCountResponse {
        active_count: state.manager.active_count().await,
        limit: state.manager.capacity(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /api/v1/jobs/{id}
async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.manager.get_job(id).await {
        Some(job) => (StatusCode::OK, Json(JobRow::new(job, state.manager.now()))).into_response(),
        None => job_error(PrintJobError::NotFound(id)),
    }
}

/// PATCH /api/v1/jobs/{id}
async fn edit_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    patch: Result<Json<JobPatch>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Json(patch) = match patch {
        Ok(patch) => patch,
        Err(rejection) => return body_error(rejection),
    };
    match state.manager.edit_job(id, patch).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => job_error(e),
    }
}

/// DELETE /api/v1/jobs/{id}
async fn delete_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.manager.delete_job(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => job_error(e),
    }
}

/// POST /api/v1/jobs/{id}/{action} -- pause, resume, cancel or complete
async fn apply_action(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let action: JobAction = match action.parse() {
        Ok(action) => action,
        Err(e) => return json_error(&e, StatusCode::BAD_REQUEST),
    };
    match state.manager.apply_action(id, action).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => job_error(e),
    }
}
