//! Test doubles and fixtures shared by the unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::documents::{DocumentPublisher, PublishError};
use crate::llm_client::{LanguageModel, LlmError};
use crate::models::conversation::StructuredJobDescription;
use crate::models::profile::{Education, Experience, PersonalDetails, Project, UserProfile};

// ────────────────────────────────────────────────────────────────────────────
// ScriptedModel
// ────────────────────────────────────────────────────────────────────────────

/// A language model that answers from a fixed script, in order.
///
/// Records every (prompt, system) pair it receives. Once the script runs out
/// it answers with a 500 API error.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, u16>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Appends a provider failure with the given HTTP status to the script.
    pub fn then_fail(self, status: u16) -> Self {
        self.replies.lock().unwrap().push_back(Err(status));
        self
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), system.to_string()));

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            }),
            None => Err(LlmError::Api {
                status: 500,
                message: "script exhausted".to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RecordingPublisher
// ────────────────────────────────────────────────────────────────────────────

/// Records published documents as (title, body). Uploaded files are read back
/// so their contents can be asserted on.
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A publisher whose every call fails as if the network dropped.
    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    fn record(&self, title: &str, body: String) -> Result<String, PublishError> {
        if self.fail {
            return Err(PublishError::Storage(
                "simulated network error: connection reset".to_string(),
            ));
        }
        let mut published = self.published.lock().unwrap();
        published.push((title.to_string(), body));
        Ok(format!("https://docs.example.com/documents/{}", published.len()))
    }
}

#[async_trait]
impl DocumentPublisher for RecordingPublisher {
    async fn publish(&self, title: &str, body: &str) -> Result<String, PublishError> {
        self.record(title, body.to_string())
    }

    async fn upload(&self, local_file: &Path, title: &str) -> Result<String, PublishError> {
        let body = tokio::fs::read_to_string(local_file).await?;
        self.record(title, body)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub fn sample_jd() -> StructuredJobDescription {
    StructuredJobDescription {
        position: "Backend Engineer".to_string(),
        organization: "Acme".to_string(),
        responsibilities: vec![
            "Build and operate data ingestion services".to_string(),
            "Own API reliability".to_string(),
        ],
        skills: vec!["Rust".to_string(), "PostgreSQL".to_string(), "Docker".to_string()],
    }
}

pub fn sample_profile() -> UserProfile {
    UserProfile {
        personal_details: Some(PersonalDetails {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+44 20 7946 0000".to_string(),
            location: "London".to_string(),
            linkedin: "https://linkedin.com/in/ada".to_string(),
            github: "https://github.com/ada".to_string(),
        }),
        education: vec![Education {
            institution: "University of London".to_string(),
            degree: "BSc Mathematics".to_string(),
            start_date: "2016".to_string(),
            end_date: "2020".to_string(),
            ..Education::default()
        }],
        experience: vec![
            Experience {
                organization: "Acme".to_string(),
                position: "Backend Engineer".to_string(),
                location: "Remote".to_string(),
                start_date: "2021".to_string(),
                end_date: "2023".to_string(),
                description: vec![
                    "Built a Rust ingestion service for billing events".to_string(),
                    "Moved deployments to Docker".to_string(),
                ],
                skills: vec!["Rust".to_string(), "Docker".to_string()],
            },
            Experience {
                organization: "Globex".to_string(),
                position: "Data Analyst".to_string(),
                start_date: "2020".to_string(),
                end_date: "2021".to_string(),
                description: vec!["Wrote weekly Excel reports".to_string()],
                ..Experience::default()
            },
        ],
        projects: vec![Project {
            name: "pgwatch".to_string(),
            description: vec!["PostgreSQL query monitor written in Rust".to_string()],
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            github_link: Some("https://github.com/ada/pgwatch".to_string()),
            ..Project::default()
        }],
        skills: vec![
            "Rust".to_string(),
            "Python".to_string(),
            "PostgreSQL".to_string(),
            "Docker".to_string(),
            "Excel".to_string(),
        ],
        ..UserProfile::default()
    }
}
