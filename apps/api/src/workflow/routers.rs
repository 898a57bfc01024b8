//! Routing functions. Each is a pure function of the state; the graph maps
//! the route names they return onto edges.

use thiserror::Error;

use crate::models::conversation::{ConversationState, Intent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("unrecognized intent '{0}'")]
    UnrecognizedIntent(String),

    #[error("intent is unset at the document-type router")]
    MissingIntent,

    #[error("route '{route}' from '{node}' has no mapped edge")]
    UnmappedRoute { node: String, route: String },

    #[error("node '{0}' has no outgoing edge")]
    NoEdge(String),
}

/// Outcome of the missing-information check after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInfoRoute {
    NeedsJobDescription,
    NeedsIntent,
    Proceed,
}

impl MissingInfoRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingInfoRoute::NeedsJobDescription => "needs_job_description",
            MissingInfoRoute::NeedsIntent => "needs_intent",
            MissingInfoRoute::Proceed => "proceed",
        }
    }
}

/// Job description is checked before intent, so a state missing both
/// reports `NeedsJobDescription`.
pub fn route_missing_info(state: &ConversationState) -> MissingInfoRoute {
    let has_job_description = state.is_job_description_given && state.job_description.is_some();
    if !has_job_description {
        MissingInfoRoute::NeedsJobDescription
    } else if state.intent.is_none() {
        MissingInfoRoute::NeedsIntent
    } else {
        MissingInfoRoute::Proceed
    }
}

pub fn missing_info_router(state: &ConversationState) -> Result<&'static str, RoutingError> {
    Ok(route_missing_info(state).as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRoute {
    Resume,
    CoverLetter,
}

impl DocumentRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentRoute::Resume => "resume",
            DocumentRoute::CoverLetter => "cover_letter",
        }
    }
}

/// Picks the document pipeline. Anything but a known intent is an error,
/// never a default branch.
pub fn route_document_type(state: &ConversationState) -> Result<DocumentRoute, RoutingError> {
    match &state.intent {
        Some(Intent::Resume) => Ok(DocumentRoute::Resume),
        Some(Intent::CoverLetter) => Ok(DocumentRoute::CoverLetter),
        Some(Intent::Unrecognized(other)) => Err(RoutingError::UnrecognizedIntent(other.clone())),
        None => Err(RoutingError::MissingIntent),
    }
}

pub fn document_type_router(state: &ConversationState) -> Result<&'static str, RoutingError> {
    route_document_type(state).map(|route| route.as_str())
}
