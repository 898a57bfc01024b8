use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::profile::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// What the user wants crafted.
///
/// Model output outside the two known document types is kept as `Unrecognized`
/// so the document-type router can reject it instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intent {
    Resume,
    CoverLetter,
    Unrecognized(String),
}

impl Intent {
    /// Parses a raw intent label. Blank labels mean "no intent found".
    pub fn parse(raw: &str) -> Option<Intent> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Intent::from(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Intent::Resume => "resume",
            Intent::CoverLetter => "cover_letter",
            Intent::Unrecognized(other) => other,
        }
    }

    /// Human-readable name used in assistant replies.
    pub fn label(&self) -> &str {
        match self {
            Intent::Resume => "your resume",
            Intent::CoverLetter => "your cover letter",
            Intent::Unrecognized(other) => other,
        }
    }
}

impl From<String> for Intent {
    fn from(value: String) -> Self {
        match value.trim() {
            "resume" => Intent::Resume,
            "cover_letter" => Intent::CoverLetter,
            other => Intent::Unrecognized(other.to_string()),
        }
    }
}

impl From<Intent> for String {
    fn from(value: Intent) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed job posting. Immutable once the structurer has produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredJobDescription {
    pub position: String,
    pub organization: String,
    pub responsibilities: Vec<String>,
    pub skills: Vec<String>,
}

impl StructuredJobDescription {
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
            && self.organization.is_empty()
            && self.responsibilities.is_empty()
            && self.skills.is_empty()
    }

    /// Plain-text rendering used when filling prompts.
    pub fn to_prompt_text(&self) -> String {
        format!(
            "Position: {}\nOrganization: {}\nResponsibilities:\n{}\nSkills: {}",
            self.position,
            self.organization,
            bullet_lines(&self.responsibilities),
            self.skills.join(", ")
        )
    }
}

fn bullet_lines(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A job description before or after structuring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", content = "value", rename_all = "snake_case")]
pub enum JobDescription {
    Raw(String),
    Structured(StructuredJobDescription),
}

impl JobDescription {
    pub fn to_prompt_text(&self) -> String {
        match self {
            JobDescription::Raw(text) => text.clone(),
            JobDescription::Structured(jd) => jd.to_prompt_text(),
        }
    }
}

/// The single record threaded through every stage of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub intent: Option<Intent>,
    pub is_job_description_given: bool,
    pub job_description: Option<JobDescription>,
    pub user_profile: UserProfile,
    pub generated_letter: Option<String>,
    pub document_link: Option<String>,
}

impl ConversationState {
    pub fn new(first_message: impl Into<String>, user_profile: UserProfile) -> Self {
        Self {
            messages: vec![Message::user(first_message)],
            user_profile,
            ..Self::default()
        }
    }

    pub fn latest_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    pub fn latest_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    pub fn push_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Merges a stage's partial update. Only fields present in the update are
    /// overwritten; messages are appended.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            messages,
            intent,
            is_job_description_given,
            job_description,
            user_profile,
            generated_letter,
            document_link,
        } = update;

        self.messages.extend(messages);
        if let Some(intent) = intent {
            self.intent = intent;
        }
        if let Some(given) = is_job_description_given {
            self.is_job_description_given = given;
        }
        if let Some(jd) = job_description {
            self.job_description = Some(jd);
        }
        if let Some(profile) = user_profile {
            self.user_profile = profile;
        }
        if let Some(letter) = generated_letter {
            self.generated_letter = Some(letter);
        }
        if let Some(link) = document_link {
            self.document_link = Some(link);
        }
    }
}

/// Partial update returned by a stage.
///
/// `intent` is doubly optional: `Some(None)` explicitly clears the intent,
/// `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub intent: Option<Option<Intent>>,
    pub is_job_description_given: Option<bool>,
    pub job_description: Option<JobDescription>,
    pub user_profile: Option<UserProfile>,
    pub generated_letter: Option<String>,
    pub document_link: Option<String>,
}

impl StateUpdate {
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.with_message(Message::assistant(content))
    }

    pub fn with_intent(mut self, intent: Option<Intent>) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_job_description_given(mut self, given: bool) -> Self {
        self.is_job_description_given = Some(given);
        self
    }

    pub fn with_job_description(mut self, jd: JobDescription) -> Self {
        self.job_description = Some(jd);
        self
    }

    pub fn with_user_profile(mut self, profile: UserProfile) -> Self {
        self.user_profile = Some(profile);
        self
    }

    pub fn with_generated_letter(mut self, letter: String) -> Self {
        self.generated_letter = Some(letter);
        self
    }

    pub fn with_document_link(mut self, link: String) -> Self {
        self.document_link = Some(link);
        self
    }
}
