//! Resume rephraser: rewrites each selected experience and project into at
//! most three single-line, action-verb-led bullets aimed at the job.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::llm_client::prompts::json_system;
use crate::llm_client::{call_json, LanguageModel};
use crate::models::conversation::{ConversationState, StateUpdate};
use crate::stages::prompts::{fill_template, REPHRASE_PROMPT_TEMPLATE, REPHRASE_SYSTEM};
use crate::stages::{Stage, StageError};

pub const MAX_BULLETS: usize = 3;

#[derive(Debug, Deserialize)]
struct EnhancedPoints {
    #[serde(default)]
    enhanced_points: Vec<String>,
}

pub struct ResumeRephraser {
    model: Arc<dyn LanguageModel>,
}

impl ResumeRephraser {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Rewrites one bullet list. Empty lists come back unchanged without a
    /// model call, and so does the original when the model returns nothing.
    pub async fn rephrase(
        &self,
        bullets: &[String],
        job_description: &str,
    ) -> Result<Vec<String>, StageError> {
        if bullets.iter().all(|b| b.trim().is_empty()) {
            return Ok(bullets.to_vec());
        }

        let prompt = fill_template(
            REPHRASE_PROMPT_TEMPLATE,
            &[("experience", bullets.join("\n").as_str()), ("job_description", job_description)],
        );
        let answer: EnhancedPoints =
            call_json(self.model.as_ref(), &prompt, &json_system(REPHRASE_SYSTEM)).await?;

        let rewritten = tidy_bullets(answer.enhanced_points);
        if rewritten.is_empty() {
            debug!("Model returned no bullets; keeping the original description");
            return Ok(bullets.to_vec());
        }
        Ok(rewritten)
    }
}

/// One line per bullet, blanks dropped, capped at `MAX_BULLETS`.
fn tidy_bullets(points: Vec<String>) -> Vec<String> {
    points
        .into_iter()
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .map(|p| strip_bullet_marker(&p).to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_BULLETS)
        .collect()
}

/// Drops a leading `-`, `*` or `•` list marker. The marker only counts when
/// whitespace follows it, so "-30% spend" keeps its sign.
fn strip_bullet_marker(point: &str) -> &str {
    for marker in ['-', '*', '•'] {
        if let Some(rest) = point.strip_prefix(marker) {
            if rest.is_empty() || rest.starts_with(' ') {
                return rest.trim_start();
            }
        }
    }
    point
}

#[async_trait]
impl Stage for ResumeRephraser {
    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, StageError> {
        let job_description = state
            .job_description
            .as_ref()
            .map(|jd| jd.to_prompt_text())
            .ok_or_else(|| StageError::MissingInput("no job description to tailor against".to_string()))?;

        let mut profile = state.user_profile.clone();
        for experience in &mut profile.experience {
            experience.description = self.rephrase(&experience.description, &job_description).await?;
        }
        for project in &mut profile.projects {
            project.description = self.rephrase(&project.description, &job_description).await?;
        }

        info!(
            "Rephrased {} experiences and {} projects",
            profile.experience.len(),
            profile.projects.len()
        );
        Ok(StateUpdate::default().with_user_profile(profile))
    }
}
