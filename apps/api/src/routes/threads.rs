use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkpoint::{Checkpoint, RunStatus};
use crate::errors::AppError;
use crate::models::conversation::{ConversationState, Message};
use crate::models::profile::UserProfile;
use crate::state::AppState;
use crate::workflow::RunOutcome;

#[derive(Debug, Deserialize)]
pub struct StartThreadRequest {
    pub thread_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub user_profile: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub thread_id: String,
    pub status: RunStatus,
    pub waiting_for: Option<String>,
    /// Latest assistant message.
    pub reply: Option<String>,
    pub intent: Option<String>,
    pub document_link: Option<String>,
    pub generated_letter: Option<String>,
    pub error: Option<String>,
    pub messages: Vec<Message>,
}

impl ThreadResponse {
    fn new(thread_id: String, status: RunStatus, waiting_for: Option<String>, state: ConversationState) -> Self {
        Self {
            thread_id,
            status,
            waiting_for,
            reply: state.latest_assistant_message().map(|m| m.content.clone()),
            intent: state.intent.as_ref().map(|i| i.as_str().to_string()),
            document_link: state.document_link,
            generated_letter: state.generated_letter,
            error: None,
            messages: state.messages,
        }
    }
}

impl From<RunOutcome> for ThreadResponse {
    fn from(outcome: RunOutcome) -> Self {
        ThreadResponse::new(outcome.thread_id, outcome.status, outcome.waiting_for, outcome.state)
    }
}

impl From<Checkpoint> for ThreadResponse {
    fn from(checkpoint: Checkpoint) -> Self {
        let waiting_for = match checkpoint.status {
            RunStatus::Interrupted => checkpoint.next_node,
            _ => None,
        };
        let mut response =
            ThreadResponse::new(checkpoint.thread_id, checkpoint.status, waiting_for, checkpoint.state);
        response.error = checkpoint.error;
        response
    }
}

fn require_message(message: &str) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }
    Ok(())
}

/// POST /api/v1/threads
pub async fn handle_start(
    State(state): State<AppState>,
    Json(req): Json<StartThreadRequest>,
) -> Result<Json<ThreadResponse>, AppError> {
    require_message(&req.message)?;
    let issues = req.user_profile.validate();
    if !issues.is_empty() {
        return Err(AppError::InvalidProfile(issues));
    }

    let thread_id = match req.thread_id {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => Uuid::new_v4().to_string(),
    };

    let outcome = state
        .engine
        .start(&thread_id, &req.message, req.user_profile)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/threads/:thread_id/messages
pub async fn handle_resume(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<ThreadResponse>, AppError> {
    require_message(&req.message)?;
    let outcome = state.engine.resume(&thread_id, &req.message).await?;
    Ok(Json(outcome.into()))
}

/// GET /api/v1/threads/:thread_id
pub async fn handle_get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ThreadResponse>, AppError> {
    let checkpoint = state.engine.checkpoint(&thread_id).await?;
    Ok(Json(checkpoint.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::checkpoint::MemoryCheckpointStore;
    use crate::routes::build_router;
    use crate::stages::scoring::KeywordRelevanceScorer;
    use crate::state::AppState;
    use crate::test_support::{RecordingPublisher, ScriptedModel};
    use crate::workflow::build_workflow;

    fn app(replies: &[&str]) -> Router {
        let engine = build_workflow(
            Arc::new(ScriptedModel::new(replies.iter().copied())),
            Arc::new(KeywordRelevanceScorer),
            Arc::new(RecordingPublisher::new()),
            Arc::new(MemoryCheckpointStore::new()),
        )
        .unwrap();
        build_router(AppState {
            engine: Arc::new(engine),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(&[]), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "tailor-api");
    }

    #[tokio::test]
    async fn test_start_interrupt_and_inspect() {
        let app = app(&[r#"{"intent": "resume", "is_jd_given": false, "job_description": ""}"#]);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/threads",
            Some(json!({
                "thread_id": "thread-1",
                "message": "Can you help me improve my resume?",
                "user_profile": {"personal_details": {"name": "Ada Lovelace"}, "skills": ["Rust"]}
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["thread_id"], "thread-1");
        assert_eq!(body["status"], "interrupted");
        assert_eq!(body["waiting_for"], "wait_for_job_description");
        assert_eq!(body["intent"], "resume");
        assert!(body["reply"].as_str().unwrap().contains("job description"));

        let (status, body) = send(&app, "GET", "/api/v1/threads/thread-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "interrupted");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generates_thread_id_when_absent() {
        let app = app(&[r#"{"intent": "", "is_jd_given": false}"#]);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/threads",
            Some(json!({"message": "hi"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let id = body["thread_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_profile_rejected() {
        let (status, body) = send(
            &app(&[]),
            "POST",
            "/api/v1/threads",
            Some(json!({
                "message": "resume please",
                "user_profile": {"personal_details": {"name": "  "}}
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PROFILE");
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (status, _) = send(
            &app(&[]),
            "POST",
            "/api/v1/threads",
            Some(json!({"message": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_thread_is_404() {
        let app = app(&[]);

        let (status, _) = send(&app, "GET", "/api/v1/threads/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/threads/ghost/messages",
            Some(json!({"message": "hello?"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stage_failure_reports_thread() {
        // Script runs out at the extractor: the provider appears down.
        let (status, body) = send(
            &app(&[]),
            "POST",
            "/api/v1/threads",
            Some(json!({"thread_id": "t-fail", "message": "resume please"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["thread_id"], "t-fail");
        assert_eq!(body["error"]["failed_node"], "extractor");
        assert_eq!(body["error"]["retryable"], true);
    }
}
