// Workflow stages: extraction, structuring, selection, rephrasing, publishing.
// All model calls go through llm_client; all document writes through documents.

use async_trait::async_trait;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::conversation::{ConversationState, StateUpdate};

pub mod builders;
pub mod cover_letter;
pub mod extractor;
pub mod prompts;
pub mod rephraser;
pub mod scoring;
pub mod selector;
pub mod structurer;
pub mod wait;

/// One named unit of work in the workflow graph.
///
/// A stage reads the current state and returns a partial update. It never
/// mutates the state directly; the engine merges the update.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, StageError>;
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a caller should react to a failed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The model answered outside the expected schema.
    SchemaValidation,
    /// Network, provider or storage trouble. Retrying the system may help.
    Infrastructure,
    /// The stage was reached with state it cannot work with.
    Defect,
}

impl StageError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StageError::Model(e) if e.is_schema_failure() => FailureKind::SchemaValidation,
            StageError::Model(_) => FailureKind::Infrastructure,
            StageError::MissingInput(_) | StageError::Serialization(_) => FailureKind::Defect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        let schema = StageError::Model(LlmError::EmptyContent);
        assert_eq!(schema.kind(), FailureKind::SchemaValidation);

        let infra = StageError::Model(LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        });
        assert_eq!(infra.kind(), FailureKind::Infrastructure);

        let defect = StageError::MissingInput("job description".to_string());
        assert_eq!(defect.kind(), FailureKind::Defect);
    }
}
