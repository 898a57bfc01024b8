//! Relevance scoring: pluggable, trait-based scorer used by the selector.
//!
//! Default: `LlmRelevanceScorer` (model rates each entry 0-10 and picks skills).
//! Alternative: `KeywordRelevanceScorer` (pure-Rust, deterministic, no model call).

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::llm_client::prompts::json_system;
use crate::llm_client::{call_json, LanguageModel};
use crate::models::conversation::StructuredJobDescription;
use crate::models::profile::{Experience, Project};
use crate::stages::prompts::{
    fill_template, EXPERIENCE_RATING_PROMPT_TEMPLATE, EXPERIENCE_RATING_SYSTEM, PROJECT_RATING_PROMPT_TEMPLATE,
    PROJECT_RATING_SYSTEM, SKILLS_PROMPT_TEMPLATE, SKILLS_SYSTEM,
};
use crate::stages::StageError;

pub const MAX_SCORE: u8 = 10;

/// Implement this to swap scoring backends without touching the selector.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Relevance of one experience, 0 (unrelated) to 10 (ideal).
    async fn score_experience(
        &self,
        experience: &Experience,
        jd: &StructuredJobDescription,
    ) -> Result<u8, StageError>;

    /// Relevance of one project, 0 (unrelated) to 10 (ideal).
    async fn score_project(
        &self,
        project: &Project,
        jd: &StructuredJobDescription,
    ) -> Result<u8, StageError>;

    /// Skills ordered by relevance, most relevant first.
    async fn select_skills(
        &self,
        skills: &[String],
        jd: &StructuredJobDescription,
    ) -> Result<Vec<String>, StageError>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmRelevanceScorer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Rating {
    #[serde(default = "default_rating")]
    rating: i64,
}

fn default_rating() -> i64 {
    5
}

#[derive(Debug, Deserialize)]
struct SkillSelection {
    #[serde(default)]
    skills: Vec<String>,
}

pub struct LlmRelevanceScorer {
    model: Arc<dyn LanguageModel>,
}

impl LlmRelevanceScorer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    async fn rate(&self, prompt: String, system: &str) -> Result<u8, StageError> {
        let rating: Rating = call_json(self.model.as_ref(), &prompt, &json_system(system)).await?;
        Ok(clamp_score(rating.rating))
    }
}

#[async_trait]
impl RelevanceScorer for LlmRelevanceScorer {
    async fn score_experience(
        &self,
        experience: &Experience,
        jd: &StructuredJobDescription,
    ) -> Result<u8, StageError> {
        let prompt = fill_template(
            EXPERIENCE_RATING_PROMPT_TEMPLATE,
            &[
                ("experience", serde_json::to_string_pretty(experience)?.as_str()),
                ("job_description", jd.to_prompt_text().as_str()),
            ],
        );
        self.rate(prompt, EXPERIENCE_RATING_SYSTEM).await
    }

    async fn score_project(
        &self,
        project: &Project,
        jd: &StructuredJobDescription,
    ) -> Result<u8, StageError> {
        let prompt = fill_template(
            PROJECT_RATING_PROMPT_TEMPLATE,
            &[
                ("project", serde_json::to_string_pretty(project)?.as_str()),
                ("job_description", jd.to_prompt_text().as_str()),
            ],
        );
        self.rate(prompt, PROJECT_RATING_SYSTEM).await
    }

    async fn select_skills(
        &self,
        skills: &[String],
        jd: &StructuredJobDescription,
    ) -> Result<Vec<String>, StageError> {
        let prompt = fill_template(
            SKILLS_PROMPT_TEMPLATE,
            &[("skills", skills.join(", ").as_str()), ("job_description", jd.to_prompt_text().as_str())],
        );
        let selection: SkillSelection =
            call_json(self.model.as_ref(), &prompt, &json_system(SKILLS_SYSTEM)).await?;
        Ok(selection.skills)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, MAX_SCORE as i64) as u8
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordRelevanceScorer
// ────────────────────────────────────────────────────────────────────────────

/// Scores entries by how many of the job's skills they mention.
///
/// score = round(10 × matched_skills / total_skills). A job with no listed
/// skills scores every entry 0, so input order decides.
pub struct KeywordRelevanceScorer;

#[async_trait]
impl RelevanceScorer for KeywordRelevanceScorer {
    async fn score_experience(
        &self,
        experience: &Experience,
        jd: &StructuredJobDescription,
    ) -> Result<u8, StageError> {
        let text = entry_text(
            [experience.position.as_str(), experience.organization.as_str()],
            &experience.description,
            &experience.skills,
        );
        Ok(keyword_score(&text, jd))
    }

    async fn score_project(
        &self,
        project: &Project,
        jd: &StructuredJobDescription,
    ) -> Result<u8, StageError> {
        let text = entry_text([project.name.as_str(), ""], &project.description, &project.skills);
        Ok(keyword_score(&text, jd))
    }

    async fn select_skills(
        &self,
        skills: &[String],
        jd: &StructuredJobDescription,
    ) -> Result<Vec<String>, StageError> {
        let wanted: Vec<String> = jd.skills.iter().map(|s| s.to_lowercase()).collect();
        let (mut matched, rest): (Vec<String>, Vec<String>) = skills
            .iter()
            .cloned()
            .partition(|s| wanted.contains(&s.to_lowercase()));
        matched.extend(rest);
        Ok(matched)
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

fn entry_text(headline: [&str; 2], description: &[String], skills: &[String]) -> String {
    let mut parts: Vec<&str> = headline.to_vec();
    parts.extend(description.iter().map(String::as_str));
    parts.extend(skills.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}

fn keyword_score(text: &str, jd: &StructuredJobDescription) -> u8 {
    let keywords: BTreeSet<String> = jd
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return 0;
    }
    let matched = keywords.iter().filter(|k| mentions(text, k)).count();
    ((matched as f64 / keywords.len() as f64) * MAX_SCORE as f64).round() as u8
}

/// Whole-term match: the skill may not be glued to letters or digits on
/// either side, so "go" misses "google" while "c++" still hits "c++, rust".
fn mentions(text: &str, skill: &str) -> bool {
    let pattern = format!(r"(?:^|[^\p{{L}}\p{{N}}_]){}(?:$|[^\p{{L}}\p{{N}}_])", regex::escape(skill));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_jd, ScriptedModel};

    fn experience(description: &str) -> Experience {
        Experience {
            description: vec![description.to_string()],
            ..Experience::default()
        }
    }

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(-3), 0);
        assert_eq!(clamp_score(7), 7);
        assert_eq!(clamp_score(42), 10);
    }

    #[tokio::test]
    async fn test_llm_scorer_reads_rating_and_clamps() {
        let model = Arc::new(ScriptedModel::new([r#"{"rating": 12}"#, "{}"]));
        let scorer = LlmRelevanceScorer::new(model.clone());
        let jd = sample_jd();

        let first = scorer.score_experience(&experience("Built APIs"), &jd).await.unwrap();
        let second = scorer.score_project(&Project::default(), &jd).await.unwrap();

        assert_eq!(first, 10);
        assert_eq!(second, 5, "missing rating falls back to the default");
        assert!(model.prompts()[0].0.contains("Built APIs"));
        assert!(model.prompts()[0].0.contains("Backend Engineer"));
    }

    #[tokio::test]
    async fn test_llm_scorer_rejects_non_numeric_rating() {
        let model = Arc::new(ScriptedModel::new([r#"{"rating": "high"}"#]));
        let scorer = LlmRelevanceScorer::new(model);

        let err = scorer
            .score_experience(&experience("x"), &sample_jd())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::stages::FailureKind::SchemaValidation);
    }

    #[tokio::test]
    async fn test_keyword_score_counts_matched_skills() {
        let scorer = KeywordRelevanceScorer;
        let jd = StructuredJobDescription {
            skills: vec!["Rust".to_string(), "Kubernetes".to_string()],
            ..StructuredJobDescription::default()
        };

        let full = scorer
            .score_experience(&experience("Ran Rust services on Kubernetes"), &jd)
            .await
            .unwrap();
        let half = scorer.score_experience(&experience("Wrote Rust"), &jd).await.unwrap();
        let none = scorer.score_experience(&experience("Made coffee"), &jd).await.unwrap();

        assert_eq!((full, half, none), (10, 5, 0));
    }

    #[tokio::test]
    async fn test_keyword_score_ignores_repeated_job_skills() {
        let scorer = KeywordRelevanceScorer;
        let jd = StructuredJobDescription {
            skills: vec!["Rust".to_string(), "Docker".to_string(), "rust ".to_string()],
            ..StructuredJobDescription::default()
        };

        let rust_only = scorer.score_experience(&experience("Wrote Rust"), &jd).await.unwrap();
        let docker_only = scorer
            .score_experience(&experience("Shipped Docker images"), &jd)
            .await
            .unwrap();

        assert_eq!(rust_only, docker_only);
        assert_eq!(rust_only, 5);
    }

    #[tokio::test]
    async fn test_keyword_score_matches_whole_terms_only() {
        let scorer = KeywordRelevanceScorer;
        let jd = |skill: &str| StructuredJobDescription {
            skills: vec![skill.to_string()],
            ..StructuredJobDescription::default()
        };

        let google = scorer
            .score_experience(&experience("Managed Google Ads budget"), &jd("Go"))
            .await
            .unwrap();
        let go = scorer
            .score_experience(&experience("Rewrote the scheduler in Go."), &jd("Go"))
            .await
            .unwrap();
        let cpp = scorer
            .score_experience(&experience("Maintained C++, Python tooling"), &jd("C++"))
            .await
            .unwrap();
        let r_lang = scorer
            .score_experience(&experience("Ran reports for marketing"), &jd("R"))
            .await
            .unwrap();

        assert_eq!((google, go, cpp, r_lang), (0, 10, 10, 0));
    }

    #[tokio::test]
    async fn test_keyword_score_zero_without_job_skills() {
        let scorer = KeywordRelevanceScorer;
        let score = scorer
            .score_experience(&experience("Rust"), &StructuredJobDescription::default())
            .await
            .unwrap();
        assert_eq!(score, 0);
    }

    #[tokio::test]
    async fn test_keyword_skill_selection_puts_matches_first() {
        let scorer = KeywordRelevanceScorer;
        let jd = StructuredJobDescription {
            skills: vec!["docker".to_string(), "Rust".to_string()],
            ..StructuredJobDescription::default()
        };
        let skills: Vec<String> = ["Python", "Rust", "Excel", "Docker"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let ordered = scorer.select_skills(&skills, &jd).await.unwrap();
        assert_eq!(ordered, vec!["Rust", "Docker", "Python", "Excel"]);
    }
}
