use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::models::profile::ProfileIssue;
use crate::stages::FailureKind;
use crate::workflow::WorkflowError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid user profile")]
    InvalidProfile(Vec<ProfileIssue>),

    #[error("Workflow error: {0}")]
    Workflow(WorkflowError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::ThreadNotFound(id) => AppError::NotFound(format!("thread {id}")),
            WorkflowError::Checkpoint(e) => AppError::Checkpoint(e),
            other => AppError::Workflow(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::InvalidProfile(issues) => (
                StatusCode::BAD_REQUEST,
                "INVALID_PROFILE",
                "The user profile failed validation".to_string(),
                Some(json!({ "issues": issues })),
            ),
            AppError::Workflow(e) => workflow_response(e),
            AppError::Checkpoint(e) => {
                tracing::error!("Checkpoint error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CHECKPOINT_ERROR",
                    "The conversation store is unavailable".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let (Some(Value::Object(extra)), Some(obj)) = (details, error.as_object_mut()) {
            obj.extend(extra);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Stage failures carry the thread id and last completed node so the caller
/// can inspect or discard the run.
fn workflow_response(err: &WorkflowError) -> (StatusCode, &'static str, String, Option<Value>) {
    match err {
        WorkflowError::Stage {
            thread_id,
            node,
            last_completed_node,
            source,
        } => {
            tracing::error!("Workflow stage failed: {err}");
            let (status, code) = match source.kind() {
                FailureKind::SchemaValidation => (StatusCode::BAD_GATEWAY, "SCHEMA_VALIDATION_FAILED"),
                FailureKind::Infrastructure => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
                FailureKind::Defect => (StatusCode::INTERNAL_SERVER_ERROR, "STAGE_FAILED"),
            };
            (
                status,
                code,
                format!("Stage '{node}' failed: {source}"),
                Some(json!({
                    "thread_id": thread_id,
                    "failed_node": node,
                    "last_completed_node": last_completed_node,
                    "retryable": err.is_infrastructure(),
                })),
            )
        }
        WorkflowError::RoutingUndefined {
            thread_id,
            node,
            last_completed_node,
            reason,
        } => {
            tracing::error!("Workflow routing undefined: {err}");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ROUTING_UNDEFINED",
                reason.to_string(),
                Some(json!({
                    "thread_id": thread_id,
                    "routing_node": node,
                    "last_completed_node": last_completed_node,
                })),
            )
        }
        WorkflowError::NotResumable { thread_id, status } => (
            StatusCode::CONFLICT,
            "NOT_RESUMABLE",
            err.to_string(),
            Some(json!({ "thread_id": thread_id, "status": status })),
        ),
        WorkflowError::ThreadNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string(), None),
        WorkflowError::Checkpoint(e) => {
            tracing::error!("Checkpoint error: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "CHECKPOINT_ERROR",
                "The conversation store is unavailable".to_string(),
                None,
            )
        }
    }
}
