//! Job-description structurer: raw posting text in, `StructuredJobDescription` out.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::llm_client::prompts::{json_system, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{call_json, LanguageModel};
use crate::models::conversation::{
    ConversationState, JobDescription, StateUpdate, StructuredJobDescription,
};
use crate::stages::prompts::{fill_template, STRUCTURE_PROMPT_TEMPLATE, STRUCTURE_SYSTEM};
use crate::stages::{Stage, StageError};

pub struct Structurer {
    model: Arc<dyn LanguageModel>,
}

impl Structurer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    fn system(&self) -> String {
        json_system(&format!("{STRUCTURE_SYSTEM} {NO_FABRICATION_INSTRUCTION}"))
    }

    /// Parses raw posting text. Text with no job posting in it yields an
    /// empty record rather than an error.
    pub async fn structure(&self, raw: &str) -> Result<StructuredJobDescription, StageError> {
        if raw.trim().is_empty() {
            return Ok(StructuredJobDescription::default());
        }

        let prompt = fill_template(STRUCTURE_PROMPT_TEMPLATE, &[("job_description", raw)]);
        let parsed: StructuredJobDescription =
            call_json(self.model.as_ref(), &prompt, &self.system()).await?;
        Ok(normalize(parsed))
    }
}

#[async_trait]
impl Stage for Structurer {
    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, StageError> {
        let raw = match &state.job_description {
            Some(JobDescription::Raw(text)) => text,
            Some(JobDescription::Structured(_)) => {
                // Already parsed in this run; structured records are not re-derived.
                return Ok(StateUpdate::default());
            }
            None => {
                return Err(StageError::MissingInput(
                    "job description flagged as given but absent from state".to_string(),
                ))
            }
        };

        let structured = self.structure(raw).await?;
        if structured.is_empty() {
            warn!("No job posting found in the supplied job description text");
        } else {
            info!(
                "Structured job description: position='{}', organization='{}', {} responsibilities, {} skills",
                structured.position,
                structured.organization,
                structured.responsibilities.len(),
                structured.skills.len()
            );
        }

        Ok(StateUpdate::default()
            .with_job_description_given(true)
            .with_job_description(JobDescription::Structured(structured)))
    }
}

/// Trims every field and drops blank list entries. Duplicate skills are kept.
fn normalize(jd: StructuredJobDescription) -> StructuredJobDescription {
    let clean = |items: Vec<String>| -> Vec<String> {
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };
    StructuredJobDescription {
        position: jd.position.trim().to_string(),
        organization: jd.organization.trim().to_string(),
        responsibilities: clean(jd.responsibilities),
        skills: clean(jd.skills),
    }
}
