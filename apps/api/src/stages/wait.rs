use async_trait::async_trait;

use crate::models::conversation::{ConversationState, StateUpdate};
use crate::stages::{Stage, StageError};

/// Placeholder node for an interrupt point.
///
/// The engine halts before entering it. On resume the user's new message is
/// already in state, so the node itself has nothing to do.
pub struct WaitForInput;

#[async_trait]
impl Stage for WaitForInput {
    async fn run(&self, _state: &ConversationState) -> Result<StateUpdate, StageError> {
        Ok(StateUpdate::default())
    }
}
