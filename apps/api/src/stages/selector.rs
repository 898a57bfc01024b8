//! Relevance Selector: ranks and trims the profile's experiences, projects and
//! skills against the structured job description.
//!
//! Algorithm:
//! 1. Score every experience and project independently (0-10) via the scorer
//! 2. Stable sort descending, so equal scores keep input order
//! 3. Apply the selection-count policy (`selection_counts`)
//! 4. Ask the scorer for the most relevant skills, keep at most 10
//!
//! Entry content is never rewritten here.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::models::conversation::{
    ConversationState, JobDescription, StateUpdate, StructuredJobDescription,
};
use crate::models::profile::UserProfile;
use crate::stages::scoring::RelevanceScorer;
use crate::stages::{Stage, StageError};

const PER_CATEGORY: usize = 2;
pub const SKILL_LIMIT: usize = 10;

/// How many experiences and projects to keep, given how many exist.
///
/// The base cap is 2 per category. When exactly one category is sparse
/// (fewer than 2 entries), the other takes over its unused slots.
/// Combinations outside the listed branches fall back to the base cap.
pub fn selection_counts(experiences: usize, projects: usize) -> (usize, usize) {
    let (e, p) = (experiences, projects);
    let cap = PER_CATEGORY;

    if (e < cap && p < cap) || (e > cap && p > cap) {
        (e.min(cap), p.min(cap))
    } else if e < cap {
        let taken = e;
        (taken, p.min(cap + (cap - taken)))
    } else if p < cap {
        let taken = p;
        (e.min(cap + (cap - taken)), taken)
    } else {
        (e.min(cap), p.min(cap))
    }
}

/// Sorts by score descending. `sort_by` is stable, so ties keep input order.
fn rank<T>(mut scored: Vec<(T, u8)>) -> Vec<T> {
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(item, _)| item).collect()
}

pub struct RelevanceSelector {
    scorer: Arc<dyn RelevanceScorer>,
}

impl RelevanceSelector {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer }
    }

    /// Returns a copy of `profile` with experiences, projects and skills
    /// filtered and reordered. Every other field is carried over untouched.
    pub async fn select(
        &self,
        profile: &UserProfile,
        jd: &StructuredJobDescription,
    ) -> Result<UserProfile, StageError> {
        let mut experiences = Vec::with_capacity(profile.experience.len());
        for experience in &profile.experience {
            let score = self.scorer.score_experience(experience, jd).await?;
            experiences.push((experience.clone(), score));
        }

        let mut projects = Vec::with_capacity(profile.projects.len());
        for project in &profile.projects {
            let score = self.scorer.score_project(project, jd).await?;
            projects.push((project.clone(), score));
        }

        let (keep_experiences, keep_projects) =
            selection_counts(experiences.len(), projects.len());

        let mut selected = profile.clone();
        selected.experience = rank(experiences);
        selected.experience.truncate(keep_experiences);
        selected.projects = rank(projects);
        selected.projects.truncate(keep_projects);
        selected.skills = self.top_skills(&profile.skills, jd).await?;
        Ok(selected)
    }

    async fn top_skills(
        &self,
        skills: &[String],
        jd: &StructuredJobDescription,
    ) -> Result<Vec<String>, StageError> {
        if skills.is_empty() {
            return Ok(Vec::new());
        }
        let suggested = self.scorer.select_skills(skills, jd).await?;
        Ok(restrict_to_owned(suggested, skills))
    }
}

/// Keeps only skills the candidate actually listed (case-insensitive, in the
/// candidate's spelling), in the scorer's order, without repeats.
fn restrict_to_owned(suggested: Vec<String>, owned: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for skill in suggested {
        let wanted = skill.trim().to_lowercase();
        let Some(original) = owned.iter().find(|s| s.trim().to_lowercase() == wanted) else {
            continue;
        };
        if !kept.contains(original) {
            kept.push(original.clone());
        }
        if kept.len() == SKILL_LIMIT {
            break;
        }
    }
    kept
}

#[async_trait]
impl Stage for RelevanceSelector {
    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, StageError> {
        let jd = match &state.job_description {
            Some(JobDescription::Structured(jd)) => jd,
            Some(JobDescription::Raw(_)) | None => {
                return Err(StageError::MissingInput(
                    "relevance selection needs a structured job description".to_string(),
                ))
            }
        };

        let profile = self.select(&state.user_profile, jd).await?;
        info!(
            "Selected {}/{} experiences, {}/{} projects, {} skills (scorer={})",
            profile.experience.len(),
            state.user_profile.experience.len(),
            profile.projects.len(),
            state.user_profile.projects.len(),
            profile.skills.len(),
            self.scorer.backend()
        );

        Ok(StateUpdate::default().with_user_profile(profile))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::models::profile::{Experience, Project};
    use crate::stages::scoring::KeywordRelevanceScorer;
    use crate::test_support::{sample_jd, sample_profile};

    /// Scores entries from a fixed table keyed by position / project name.
    struct TableScorer {
        scores: HashMap<String, u8>,
        skills: Vec<String>,
        calls: Mutex<usize>,
    }

    impl TableScorer {
        fn new(scores: &[(&str, u8)], skills: &[&str]) -> Self {
            Self {
                scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                skills: skills.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(0),
            }
        }

        fn lookup(&self, key: &str) -> u8 {
            *self.calls.lock().unwrap() += 1;
            self.scores.get(key).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl RelevanceScorer for TableScorer {
        async fn score_experience(
            &self,
            experience: &Experience,
            _jd: &StructuredJobDescription,
        ) -> Result<u8, StageError> {
            Ok(self.lookup(&experience.position))
        }

        async fn score_project(
            &self,
            project: &Project,
            _jd: &StructuredJobDescription,
        ) -> Result<u8, StageError> {
            Ok(self.lookup(&project.name))
        }

        async fn select_skills(
            &self,
            _skills: &[String],
            _jd: &StructuredJobDescription,
        ) -> Result<Vec<String>, StageError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.skills.clone())
        }

        fn backend(&self) -> &'static str {
            "table"
        }
    }

    fn experience(position: &str) -> Experience {
        Experience {
            position: position.to_string(),
            description: vec![format!("{position} work")],
            ..Experience::default()
        }
    }

    fn project(name: &str) -> Project {
        Project {
            name: name.to_string(),
            ..Project::default()
        }
    }

    fn positions(profile: &UserProfile) -> Vec<&str> {
        profile.experience.iter().map(|e| e.position.as_str()).collect()
    }

    #[test]
    fn test_selection_counts_branches() {
        assert_eq!(selection_counts(1, 1), (1, 1));
        assert_eq!(selection_counts(0, 0), (0, 0));
        assert_eq!(selection_counts(5, 4), (2, 2));
        assert_eq!(selection_counts(1, 5), (1, 3));
        assert_eq!(selection_counts(0, 5), (0, 4));
        assert_eq!(selection_counts(0, 2), (0, 2));
        assert_eq!(selection_counts(3, 1), (3, 1));
        assert_eq!(selection_counts(6, 0), (4, 0));
    }

    #[test]
    fn test_selection_counts_fallback_combinations() {
        assert_eq!(selection_counts(2, 2), (2, 2));
        assert_eq!(selection_counts(2, 3), (2, 2));
        assert_eq!(selection_counts(3, 2), (2, 2));
    }

    #[test]
    fn test_selection_cardinality_never_exceeds_four() {
        for e in 0..8 {
            for p in 0..8 {
                let (se, sp) = selection_counts(e, p);
                assert!(se + sp <= 4, "e={e} p={p} selected {se}+{sp}");
                assert!(se <= e && sp <= p, "e={e} p={p} selected more than available");
            }
        }
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranked = rank(vec![("a", 8), ("b", 5), ("c", 8), ("d", 9), ("e", 5)]);
        assert_eq!(ranked, vec!["d", "a", "c", "b", "e"]);
    }

    #[tokio::test]
    async fn test_sparse_projects_give_slots_to_experiences() {
        let scorer = TableScorer::new(&[("A", 8), ("B", 5), ("C", 8), ("P", 9)], &[]);
        let selector = RelevanceSelector::new(Arc::new(scorer));
        let profile = UserProfile {
            experience: vec![experience("A"), experience("B"), experience("C")],
            projects: vec![project("P")],
            ..UserProfile::default()
        };

        let selected = selector.select(&profile, &sample_jd()).await.unwrap();

        assert_eq!(positions(&selected), vec!["A", "C", "B"]);
        assert_eq!(selected.projects.len(), 1);
    }

    #[tokio::test]
    async fn test_ties_keep_input_order_when_trimming() {
        let scorer = TableScorer::new(&[("A", 7), ("B", 7), ("C", 7), ("D", 9)], &[]);
        let selector = RelevanceSelector::new(Arc::new(scorer));
        let profile = UserProfile {
            experience: vec![experience("A"), experience("B"), experience("C"), experience("D")],
            projects: vec![project("X"), project("Y"), project("Z")],
            ..UserProfile::default()
        };

        let selected = selector.select(&profile, &sample_jd()).await.unwrap();

        assert_eq!(positions(&selected), vec!["D", "A"]);
        assert_eq!(selected.projects.len(), 2);
    }

    #[tokio::test]
    async fn test_content_is_not_rewritten() {
        let scorer = TableScorer::new(&[("A", 3)], &[]);
        let selector = RelevanceSelector::new(Arc::new(scorer));
        let profile = UserProfile {
            experience: vec![experience("A")],
            ..UserProfile::default()
        };

        let selected = selector.select(&profile, &sample_jd()).await.unwrap();
        assert_eq!(selected.experience, profile.experience);
    }

    #[tokio::test]
    async fn test_skills_limited_to_owned_and_ten() {
        let suggested: Vec<String> = (0..15).map(|i| format!("s{i}")).collect();
        let owned: Vec<String> = (0..15).map(|i| format!("S{i}")).collect();
        let suggested_refs: Vec<&str> = suggested.iter().map(String::as_str).collect();
        let mut with_foreign = vec!["Cobol"];
        with_foreign.extend(suggested_refs);

        let scorer = TableScorer::new(&[], &with_foreign);
        let selector = RelevanceSelector::new(Arc::new(scorer));
        let profile = UserProfile {
            skills: owned.clone(),
            ..UserProfile::default()
        };

        let selected = selector.select(&profile, &sample_jd()).await.unwrap();

        assert_eq!(selected.skills.len(), SKILL_LIMIT);
        assert_eq!(selected.skills[0], "S0", "candidate spelling kept");
        assert!(!selected.skills.contains(&"Cobol".to_string()));
    }

    #[tokio::test]
    async fn test_empty_profile_makes_no_scorer_calls() {
        let scorer = Arc::new(TableScorer::new(&[], &["Rust"]));
        let selector = RelevanceSelector::new(scorer.clone());

        let selected = selector
            .select(&UserProfile::default(), &sample_jd())
            .await
            .unwrap();

        assert_eq!(selected, UserProfile::default());
        assert_eq!(*scorer.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_structured_jd_is_tolerated() {
        let selector = RelevanceSelector::new(Arc::new(KeywordRelevanceScorer));
        let mut state = ConversationState::new("resume", sample_profile());
        state.is_job_description_given = true;
        state.job_description = Some(JobDescription::Structured(StructuredJobDescription::default()));

        let update = selector.run(&state).await.unwrap();

        let profile = update.user_profile.expect("profile update");
        assert!(profile.experience.len() <= state.user_profile.experience.len());
        assert!(update.messages.is_empty());
    }

    #[tokio::test]
    async fn test_raw_jd_is_a_defect() {
        let selector = RelevanceSelector::new(Arc::new(KeywordRelevanceScorer));
        let mut state = ConversationState::new("resume", sample_profile());
        state.job_description = Some(JobDescription::Raw("unparsed".to_string()));

        let err = selector.run(&state).await.unwrap_err();
        assert!(matches!(err, StageError::MissingInput(_)));
    }
}
