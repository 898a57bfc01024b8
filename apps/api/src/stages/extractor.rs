//! Intent and job-description extractor: the first stage of every pass.
//!
//! Works from the latest user message plus what the state already knows.
//! Nothing is guessed: an intent or job description the model did not find
//! stays unset, and the reply asks the user for it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm_client::prompts::{json_system, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{call_json, LanguageModel};
use crate::models::conversation::{ConversationState, Intent, JobDescription, StateUpdate};
use crate::stages::prompts::{fill_template, INTENT_PROMPT_TEMPLATE, INTENT_SYSTEM};
use crate::stages::{Stage, StageError};

const CLARIFY_INTENT: &str = "I am sorry, I did not understand that. Can you please tell me \
    what you want me to craft: a resume or a cover letter?";

/// Model output schema for intent extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentExtraction {
    pub intent: String,
    pub is_jd_given: bool,
    pub job_description: String,
}

impl IntentExtraction {
    pub fn intent(&self) -> Option<Intent> {
        Intent::parse(&self.intent)
    }

    /// The extracted job description, only when the model flagged one and
    /// actually returned text for it.
    pub fn job_description(&self) -> Option<String> {
        let text = self.job_description.trim();
        (self.is_jd_given && !text.is_empty()).then(|| text.to_string())
    }
}

pub struct Extractor {
    model: Arc<dyn LanguageModel>,
}

impl Extractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    async fn extract(&self, user_query: &str) -> Result<IntentExtraction, StageError> {
        let prompt = fill_template(INTENT_PROMPT_TEMPLATE, &[("user_query", user_query)]);
        let system = json_system(&format!("{INTENT_SYSTEM} {NO_FABRICATION_INSTRUCTION}"));
        let extraction = call_json(self.model.as_ref(), &prompt, &system).await?;
        Ok(extraction)
    }
}

#[async_trait]
impl Stage for Extractor {
    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, StageError> {
        let query = state
            .latest_user_message()
            .ok_or_else(|| StageError::MissingInput("no user message to extract from".to_string()))?;

        let extraction = self.extract(&query.content).await?;
        let found_intent = extraction.intent();
        let found_jd = extraction.job_description();

        info!(
            "Extracted intent={:?}, job_description_found={}",
            found_intent.as_ref().map(Intent::as_str),
            found_jd.is_some()
        );

        let update = match (&state.intent, state.is_job_description_given) {
            (Some(known), false) => after_missing_job_description(known, found_intent, found_jd),
            (None, true) => after_missing_intent(found_intent),
            _ => full_extraction(state, found_intent, found_jd),
        };
        Ok(update)
    }
}

/// Intent already known; the user was asked for the job description.
fn after_missing_job_description(
    known: &Intent,
    found_intent: Option<Intent>,
    found_jd: Option<String>,
) -> StateUpdate {
    let Some(jd) = found_jd else {
        return StateUpdate::default().with_reply(ask_for_job_description(known));
    };

    let mut update = StateUpdate::default()
        .with_job_description_given(true)
        .with_job_description(JobDescription::Raw(jd));

    // A fresh intent only replaces the known one alongside a job description.
    let intent = match found_intent {
        Some(intent) => {
            update = update.with_intent(Some(intent.clone()));
            intent
        }
        None => known.clone(),
    };

    update.with_reply(format!(
        "Thank you! I will help you craft {} for the given job description.",
        intent.label()
    ))
}

/// Job description already known; the user was asked what to craft.
fn after_missing_intent(found_intent: Option<Intent>) -> StateUpdate {
    match found_intent {
        Some(intent) => {
            let reply = format!("Got it! I will help you craft {}.", intent.label());
            StateUpdate::default()
                .with_intent(Some(intent))
                .with_reply(reply)
        }
        None => StateUpdate::default()
            .with_intent(None)
            .with_reply(CLARIFY_INTENT),
    }
}

/// Nothing (or everything) known yet. Found values are applied; known values
/// are never cleared.
fn full_extraction(
    state: &ConversationState,
    found_intent: Option<Intent>,
    found_jd: Option<String>,
) -> StateUpdate {
    let intent = found_intent.or_else(|| state.intent.clone());
    let has_jd = found_jd.is_some() || state.is_job_description_given;

    let reply = match (&intent, has_jd) {
        (Some(intent), true) => format!(
            "Got it! I will help you craft {} for the given job description.",
            intent.label()
        ),
        (Some(intent), false) => ask_for_job_description(intent),
        (None, true) => "Thanks for the job description! What would you like me to craft: \
            a resume or a cover letter?"
            .to_string(),
        (None, false) => CLARIFY_INTENT.to_string(),
    };

    let mut update = StateUpdate::default()
        .with_intent(intent)
        .with_job_description_given(has_jd)
        .with_reply(reply);
    if let Some(jd) = found_jd {
        update = update.with_job_description(JobDescription::Raw(jd));
    }
    update
}

fn ask_for_job_description(intent: &Intent) -> String {
    format!(
        "I understand that you want me to help you craft {}. \
        Can you please provide the job description clearly?",
        intent.label()
    )
}
