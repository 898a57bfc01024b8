//! Document builders: the last stage on each path. They turn finished content
//! into a shareable document and tell the user where to find it.
//!
//! Publishing failures never fail the run. The content already produced stays
//! in state and the user gets a message naming the stage that failed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::documents::render::render_resume;
use crate::documents::{DocumentPublisher, PublishError};
use crate::models::conversation::{ConversationState, JobDescription, StateUpdate};
use crate::stages::{Stage, StageError};

const FALLBACK_CANDIDATE_NAME: &str = "Candidate";

fn publish_failed(document: &str, err: &PublishError) -> StateUpdate {
    error!("Publishing failed at the {document} document stage: {err}");
    StateUpdate::default().with_reply(format!(
        "Sorry, publishing failed at the {document} document stage: {err}. \
        Your content was generated and is kept in this conversation."
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Resume
// ────────────────────────────────────────────────────────────────────────────

pub struct ResumeBuilder {
    publisher: Arc<dyn DocumentPublisher>,
}

impl ResumeBuilder {
    pub fn new(publisher: Arc<dyn DocumentPublisher>) -> Self {
        Self { publisher }
    }

    async fn publish(&self, state: &ConversationState) -> Result<String, PublishError> {
        let profile = &state.user_profile;
        let name = profile.candidate_name().unwrap_or(FALLBACK_CANDIDATE_NAME);
        let title = format!("{name} - Resume");

        let markdown = render_resume(profile);
        let file = tempfile::Builder::new()
            .prefix("resume-")
            .suffix(".md")
            .tempfile()?;
        tokio::fs::write(file.path(), markdown.as_bytes()).await?;

        // `file` is removed from disk when dropped, after the upload completes.
        self.publisher.upload(file.path(), &title).await
    }
}

#[async_trait]
impl Stage for ResumeBuilder {
    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, StageError> {
        match self.publish(state).await {
            Ok(link) => {
                info!("Resume published: {link}");
                Ok(StateUpdate::default()
                    .with_reply(format!("I have crafted a draft resume. Here's the link:\n{link}"))
                    .with_document_link(link))
            }
            Err(e) => Ok(publish_failed("resume", &e)),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter
// ────────────────────────────────────────────────────────────────────────────

pub struct CoverLetterBuilder {
    publisher: Arc<dyn DocumentPublisher>,
}

impl CoverLetterBuilder {
    pub fn new(publisher: Arc<dyn DocumentPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl Stage for CoverLetterBuilder {
    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, StageError> {
        let Some(letter) = state.generated_letter.as_deref() else {
            return Err(StageError::MissingInput(
                "no generated letter to publish".to_string(),
            ));
        };

        let title = match &state.job_description {
            Some(JobDescription::Structured(jd)) => {
                format!("{} - {} Cover Letter", jd.organization, jd.position)
            }
            _ => "Cover Letter".to_string(),
        };

        match self.publisher.publish(&title, letter).await {
            Ok(link) => {
                info!("Cover letter published: {link}");
                Ok(StateUpdate::default()
                    .with_reply(format!("Here's the link to your cover letter: {link}"))
                    .with_document_link(link))
            }
            Err(e) => Ok(publish_failed("cover letter", &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_jd, sample_profile, RecordingPublisher};

    fn letter_state() -> ConversationState {
        let mut state = ConversationState::new("cover letter", sample_profile());
        state.job_description = Some(JobDescription::Structured(sample_jd()));
        state.generated_letter = Some("Dear Hiring Manager,".to_string());
        state
    }

    #[tokio::test]
    async fn test_resume_uploaded_with_candidate_title() {
        let publisher = Arc::new(RecordingPublisher::new());
        let builder = ResumeBuilder::new(publisher.clone());
        let state = ConversationState::new("resume", sample_profile());

        let update = builder.run(&state).await.unwrap();

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "Ada Lovelace - Resume");
        assert!(published[0].1.starts_with("# Ada Lovelace"));
        let link = update.document_link.expect("link stored");
        assert!(update.messages[0].content.ends_with(&link));
    }

    #[tokio::test]
    async fn test_cover_letter_published_with_job_title() {
        let publisher = Arc::new(RecordingPublisher::new());
        let builder = CoverLetterBuilder::new(publisher.clone());

        let update = builder.run(&letter_state()).await.unwrap();

        let published = publisher.published();
        assert_eq!(published[0].0, "Acme - Backend Engineer Cover Letter");
        assert_eq!(published[0].1, "Dear Hiring Manager,");
        assert!(update.messages[0]
            .content
            .starts_with("Here's the link to your cover letter: "));
        assert!(update.document_link.is_some());
    }

    #[tokio::test]
    async fn test_publish_failure_is_reported_not_raised() {
        let publisher = Arc::new(RecordingPublisher::failing());
        let builder = CoverLetterBuilder::new(publisher);

        let update = builder.run(&letter_state()).await.unwrap();

        assert!(update.messages[0].content.contains("cover letter document stage"));
        assert!(update.document_link.is_none());
        assert!(update.generated_letter.is_none(), "letter in state is left as is");
    }

    #[tokio::test]
    async fn test_resume_publish_failure_is_reported() {
        let builder = ResumeBuilder::new(Arc::new(RecordingPublisher::failing()));
        let state = ConversationState::new("resume", sample_profile());

        let update = builder.run(&state).await.unwrap();

        assert!(update.messages[0].content.contains("resume document stage"));
        assert!(update.user_profile.is_none());
    }

    #[tokio::test]
    async fn test_cover_letter_without_letter_is_a_defect() {
        let builder = CoverLetterBuilder::new(Arc::new(RecordingPublisher::new()));
        let state = ConversationState::new("cover letter", sample_profile());

        let err = builder.run(&state).await.unwrap_err();
        assert!(matches!(err, StageError::MissingInput(_)));
    }
}
