//! Workflow engine: walks the compiled graph one stage at a time, merges each
//! stage's update into the state and checkpoints under the thread id.
//!
//! The engine is re-entrant: a paused run is nothing but its checkpoint.
//! `resume` loads it, appends the new user message and re-enters the node the
//! run stopped in front of.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointStore, RunStatus};
use crate::models::conversation::ConversationState;
use crate::models::profile::UserProfile;
use crate::stages::{FailureKind, StageError};
use crate::workflow::graph::{CompiledGraph, END};
use crate::workflow::routers::RoutingError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Stage '{node}' failed in thread {thread_id}: {source}")]
    Stage {
        thread_id: String,
        node: String,
        last_completed_node: Option<String>,
        #[source]
        source: StageError,
    },

    /// `node` is where routing broke down. It has not necessarily run: a
    /// dangling edge fails before its target is entered.
    #[error("Routing undefined at '{node}' in thread {thread_id}: {reason}")]
    RoutingUndefined {
        thread_id: String,
        node: String,
        last_completed_node: Option<String>,
        reason: RoutingError,
    },

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Thread {thread_id} is {} and cannot be resumed", .status.as_str())]
    NotResumable { thread_id: String, status: RunStatus },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl WorkflowError {
    /// True for failures where retrying the system (not re-asking the user) may help.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            WorkflowError::Stage { source, .. } => source.kind() == FailureKind::Infrastructure,
            WorkflowError::Checkpoint(_) => true,
            _ => false,
        }
    }
}

/// Where a run stands when control returns to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub thread_id: String,
    pub status: RunStatus,
    /// The interrupt node the run is paused in front of.
    pub waiting_for: Option<String>,
    pub state: ConversationState,
}

pub struct WorkflowEngine {
    graph: CompiledGraph,
    store: Arc<dyn CheckpointStore>,
}

impl WorkflowEngine {
    pub fn new(graph: CompiledGraph, store: Arc<dyn CheckpointStore>) -> Self {
        Self { graph, store }
    }

    /// Starts a fresh run. An existing checkpoint under the same thread id is
    /// replaced.
    pub async fn start(
        &self,
        thread_id: &str,
        message: &str,
        profile: UserProfile,
    ) -> Result<RunOutcome, WorkflowError> {
        info!("Starting workflow run {thread_id}");
        let state = ConversationState::new(message, profile);
        let entry = self.graph.entry().to_string();
        self.drive(thread_id, state, entry, None, false).await
    }

    /// Continues an interrupted run with the user's new message.
    pub async fn resume(&self, thread_id: &str, message: &str) -> Result<RunOutcome, WorkflowError> {
        let checkpoint = self.checkpoint(thread_id).await?;

        let next_node = match (checkpoint.status, checkpoint.next_node) {
            (RunStatus::Interrupted, Some(node)) if self.graph.contains(&node) => node,
            (status, _) => {
                return Err(WorkflowError::NotResumable {
                    thread_id: thread_id.to_string(),
                    status,
                })
            }
        };

        info!("Resuming workflow run {thread_id} at '{next_node}'");
        let mut state = checkpoint.state;
        state.push_user_message(message);
        self.drive(thread_id, state, next_node, checkpoint.last_completed_node, true)
            .await
    }

    /// Latest checkpoint for a thread.
    pub async fn checkpoint(&self, thread_id: &str) -> Result<Checkpoint, WorkflowError> {
        self.store
            .load(thread_id)
            .await?
            .ok_or_else(|| WorkflowError::ThreadNotFound(thread_id.to_string()))
    }

    async fn drive(
        &self,
        thread_id: &str,
        mut state: ConversationState,
        mut current: String,
        mut last_completed: Option<String>,
        mut resuming: bool,
    ) -> Result<RunOutcome, WorkflowError> {
        loop {
            if current == END {
                info!("Workflow run {thread_id} completed");
                self.save(thread_id, RunStatus::Completed, &state, None, &last_completed, None)
                    .await?;
                return Ok(outcome(thread_id, RunStatus::Completed, None, state));
            }

            // A resumed run enters the interrupt node it stopped in front of.
            if self.graph.is_interrupt(&current) && !resuming {
                info!("Workflow run {thread_id} interrupted before '{current}'");
                self.save(
                    thread_id,
                    RunStatus::Interrupted,
                    &state,
                    Some(current.as_str()),
                    &last_completed,
                    None,
                )
                .await?;
                return Ok(outcome(thread_id, RunStatus::Interrupted, Some(current), state));
            }
            resuming = false;

            let Some(stage) = self.graph.stage(&current) else {
                let reason = RoutingError::NoEdge(current.clone());
                return Err(self
                    .fail_routing(thread_id, &state, &current, &last_completed, reason)
                    .await);
            };

            debug!("Thread {thread_id}: entering '{current}'");
            match stage.run(&state).await {
                Ok(update) => state.apply(update),
                Err(source) => {
                    error!("Thread {thread_id}: stage '{current}' failed: {source}");
                    let text = source.to_string();
                    self.save(
                        thread_id,
                        RunStatus::Failed,
                        &state,
                        Some(current.as_str()),
                        &last_completed,
                        Some(text),
                    )
                    .await?;
                    return Err(WorkflowError::Stage {
                        thread_id: thread_id.to_string(),
                        node: current,
                        last_completed_node: last_completed,
                        source,
                    });
                }
            }
            last_completed = Some(current.clone());

            let next = match self.graph.next(&current, &state) {
                Ok(next) => next.to_string(),
                Err(reason) => {
                    return Err(self
                        .fail_routing(thread_id, &state, &current, &last_completed, reason)
                        .await)
                }
            };
            debug!("Thread {thread_id}: '{current}' -> '{next}'");

            self.save(thread_id, RunStatus::Running, &state, Some(next.as_str()), &last_completed, None)
                .await?;
            current = next;
        }
    }

    async fn fail_routing(
        &self,
        thread_id: &str,
        state: &ConversationState,
        node: &str,
        last_completed: &Option<String>,
        reason: RoutingError,
    ) -> WorkflowError {
        error!("Thread {thread_id}: routing undefined after '{node}': {reason}");
        let saved = self
            .save(
                thread_id,
                RunStatus::Failed,
                state,
                None,
                last_completed,
                Some(reason.to_string()),
            )
            .await;
        if let Err(e) = saved {
            warn!("Thread {thread_id}: could not record routing failure: {e}");
        }
        WorkflowError::RoutingUndefined {
            thread_id: thread_id.to_string(),
            node: node.to_string(),
            last_completed_node: last_completed.clone(),
            reason,
        }
    }

    async fn save(
        &self,
        thread_id: &str,
        status: RunStatus,
        state: &ConversationState,
        next_node: Option<&str>,
        last_completed: &Option<String>,
        error: Option<String>,
    ) -> Result<(), CheckpointError> {
        let checkpoint = Checkpoint {
            thread_id: thread_id.to_string(),
            status,
            state: state.clone(),
            next_node: next_node.map(str::to_string),
            last_completed_node: last_completed.clone(),
            error,
            updated_at: Utc::now(),
        };
        self.store.save(&checkpoint).await
    }
}

fn outcome(
    thread_id: &str,
    status: RunStatus,
    waiting_for: Option<String>,
    state: ConversationState,
) -> RunOutcome {
    RunOutcome {
        thread_id: thread_id.to_string(),
        status,
        waiting_for,
        state,
    }
}
