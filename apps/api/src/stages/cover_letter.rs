//! Cover letter writer: drafts one complete letter from the full profile and
//! the structured job description.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::Local;
use regex::Regex;
use tracing::info;

use crate::llm_client::LanguageModel;
use crate::models::conversation::{
    ConversationState, JobDescription, StateUpdate, StructuredJobDescription,
};
use crate::models::profile::UserProfile;
use crate::stages::prompts::{fill_template, COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM};
use crate::stages::{Stage, StageError};

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").expect("valid regex"));

pub struct CoverLetterWriter {
    model: Arc<dyn LanguageModel>,
}

impl CoverLetterWriter {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn write_letter(
        &self,
        profile: &UserProfile,
        jd: &StructuredJobDescription,
        date: &str,
    ) -> Result<String, StageError> {
        let details = serde_json::to_string_pretty(&profile.personal_details)?;
        let experiences = serde_json::to_string_pretty(&profile.experience)?;
        let projects = serde_json::to_string_pretty(&profile.projects)?;
        let education = serde_json::to_string_pretty(&profile.education)?;
        let prompt = fill_template(
            COVER_LETTER_PROMPT_TEMPLATE,
            &[
                ("position", jd.position.as_str()),
                ("organization", jd.organization.as_str()),
                ("user_details", details.as_str()),
                ("user_skills", profile.skills.join(", ").as_str()),
                ("user_experiences", experiences.as_str()),
                ("user_projects", projects.as_str()),
                ("user_education", education.as_str()),
                ("job_responsibilities", jd.responsibilities.join("\n").as_str()),
                ("job_skills", jd.skills.join(", ").as_str()),
                ("date", date),
            ],
        );

        let letter = self.model.complete(&prompt, COVER_LETTER_SYSTEM).await?;
        Ok(clean_letter(&letter))
    }
}

/// Rewrites `[text](url)` to the bare url and trims surrounding whitespace.
pub fn clean_letter(letter: &str) -> String {
    MARKDOWN_LINK.replace_all(letter, "$2").trim().to_string()
}

#[async_trait]
impl Stage for CoverLetterWriter {
    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, StageError> {
        let Some(JobDescription::Structured(jd)) = &state.job_description else {
            return Err(StageError::MissingInput(
                "cover letter needs a structured job description".to_string(),
            ));
        };

        let date = Local::now().format("%b %d, %Y").to_string();
        let letter = self.write_letter(&state.user_profile, jd, &date).await?;
        info!("Drafted cover letter ({} chars)", letter.len());

        Ok(StateUpdate::default()
            .with_reply("Crafted your cover letter!")
            .with_generated_letter(letter))
    }
}
