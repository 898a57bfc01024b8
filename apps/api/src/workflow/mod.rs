//! The resume / cover-letter workflow: graph wiring, routers and the engine.
//!
//! ```text
//! START -> extractor -> [missing info] -> wait_for_job_description (interrupt) -> extractor
//!                                      -> wait_for_intent (interrupt)          -> extractor
//!                                      -> structurer -> relevance_selector -> [document type]
//!   resume:       resume_rephraser       -> resume_publisher       -> END
//!   cover_letter: cover_letter_rephraser -> cover_letter_publisher -> END
//! ```

use std::sync::Arc;

use crate::checkpoint::CheckpointStore;
use crate::documents::DocumentPublisher;
use crate::llm_client::LanguageModel;
use crate::stages::builders::{CoverLetterBuilder, ResumeBuilder};
use crate::stages::cover_letter::CoverLetterWriter;
use crate::stages::extractor::Extractor;
use crate::stages::rephraser::ResumeRephraser;
use crate::stages::scoring::RelevanceScorer;
use crate::stages::selector::RelevanceSelector;
use crate::stages::structurer::Structurer;
use crate::stages::wait::WaitForInput;
use crate::workflow::graph::{GraphBuilder, GraphError, END, START};
use crate::workflow::routers::{document_type_router, missing_info_router, DocumentRoute, MissingInfoRoute};

pub mod engine;
pub mod graph;
pub mod routers;

pub use engine::{RunOutcome, WorkflowEngine, WorkflowError};

pub const EXTRACTOR: &str = "extractor";
pub const WAIT_FOR_JOB_DESCRIPTION: &str = "wait_for_job_description";
pub const WAIT_FOR_INTENT: &str = "wait_for_intent";
pub const STRUCTURER: &str = "structurer";
pub const RELEVANCE_SELECTOR: &str = "relevance_selector";
pub const RESUME_REPHRASER: &str = "resume_rephraser";
pub const COVER_LETTER_REPHRASER: &str = "cover_letter_rephraser";
pub const RESUME_PUBLISHER: &str = "resume_publisher";
pub const COVER_LETTER_PUBLISHER: &str = "cover_letter_publisher";

/// Wires every stage into the workflow graph and hands it to an engine.
pub fn build_workflow(
    model: Arc<dyn LanguageModel>,
    scorer: Arc<dyn RelevanceScorer>,
    publisher: Arc<dyn DocumentPublisher>,
    store: Arc<dyn CheckpointStore>,
) -> Result<WorkflowEngine, GraphError> {
    let graph = GraphBuilder::new()
        .add_node(EXTRACTOR, Arc::new(Extractor::new(model.clone())))
        .add_node(WAIT_FOR_JOB_DESCRIPTION, Arc::new(WaitForInput))
        .add_node(WAIT_FOR_INTENT, Arc::new(WaitForInput))
        .add_node(STRUCTURER, Arc::new(Structurer::new(model.clone())))
        .add_node(RELEVANCE_SELECTOR, Arc::new(RelevanceSelector::new(scorer)))
        .add_node(RESUME_REPHRASER, Arc::new(ResumeRephraser::new(model.clone())))
        .add_node(COVER_LETTER_REPHRASER, Arc::new(CoverLetterWriter::new(model)))
        .add_node(RESUME_PUBLISHER, Arc::new(ResumeBuilder::new(publisher.clone())))
        .add_node(COVER_LETTER_PUBLISHER, Arc::new(CoverLetterBuilder::new(publisher)))
        .add_edge(START, EXTRACTOR)
        .add_conditional_edges(
            EXTRACTOR,
            missing_info_router,
            &[
                (MissingInfoRoute::NeedsJobDescription.as_str(), WAIT_FOR_JOB_DESCRIPTION),
                (MissingInfoRoute::NeedsIntent.as_str(), WAIT_FOR_INTENT),
                (MissingInfoRoute::Proceed.as_str(), STRUCTURER),
            ],
        )
        .add_edge(WAIT_FOR_JOB_DESCRIPTION, EXTRACTOR)
        .add_edge(WAIT_FOR_INTENT, EXTRACTOR)
        .add_edge(STRUCTURER, RELEVANCE_SELECTOR)
        .add_conditional_edges(
            RELEVANCE_SELECTOR,
            document_type_router,
            &[
                (DocumentRoute::Resume.as_str(), RESUME_REPHRASER),
                (DocumentRoute::CoverLetter.as_str(), COVER_LETTER_REPHRASER),
            ],
        )
        .add_edge(RESUME_REPHRASER, RESUME_PUBLISHER)
        .add_edge(RESUME_PUBLISHER, END)
        .add_edge(COVER_LETTER_REPHRASER, COVER_LETTER_PUBLISHER)
        .add_edge(COVER_LETTER_PUBLISHER, END)
        .interrupt_before(WAIT_FOR_JOB_DESCRIPTION)
        .interrupt_before(WAIT_FOR_INTENT)
        .compile()?;

    Ok(WorkflowEngine::new(graph, store))
}
