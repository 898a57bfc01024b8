use std::sync::Arc;

use crate::workflow::WorkflowEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
}
