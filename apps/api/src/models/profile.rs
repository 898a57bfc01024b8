//! Candidate profile carried through a run.
//!
//! Stages only ever rewrite `experience`, `projects` and `skills`; everything
//! else is round-tripped as received.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub start_date: String,
    #[serde(alias = "grad_date")]
    pub end_date: String,
    pub gpa: String,
    pub courses: Vec<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub organization: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    /// Bullet points. The unit of scoring and rewriting.
    pub description: Vec<String>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub description: Vec<String>,
    pub skills: Vec<String>,
    pub github_link: Option<String>,
    pub resume_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub personal_details: Option<PersonalDetails>,
    pub education: Vec<Education>,
    #[serde(alias = "experiences")]
    pub experience: Vec<Experience>,
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "deserialize_skills")]
    pub skills: Vec<String>,
    pub certificates: Vec<Certificate>,
}

/// A single problem found while validating an incoming profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileIssue {
    pub field: String,
    pub reason: String,
}

impl UserProfile {
    pub fn candidate_name(&self) -> Option<&str> {
        self.personal_details
            .as_ref()
            .map(|p| p.name.trim())
            .filter(|name| !name.is_empty())
    }

    /// Checks the profile before it enters a workflow run.
    pub fn validate(&self) -> Vec<ProfileIssue> {
        let mut issues = Vec::new();

        if let Some(details) = &self.personal_details {
            if details.name.trim().is_empty() {
                issues.push(ProfileIssue {
                    field: "personal_details.name".to_string(),
                    reason: "candidate name cannot be empty".to_string(),
                });
            }
        }

        for (i, exp) in self.experience.iter().enumerate() {
            if exp.description.iter().any(|b| b.trim().is_empty()) {
                issues.push(ProfileIssue {
                    field: format!("experience[{i}].description"),
                    reason: "bullet points cannot be blank".to_string(),
                });
            }
        }

        for (i, project) in self.projects.iter().enumerate() {
            if project.description.iter().any(|b| b.trim().is_empty()) {
                issues.push(ProfileIssue {
                    field: format!("projects[{i}].description"),
                    reason: "bullet points cannot be blank".to_string(),
                });
            }
        }

        if self.skills.iter().any(|s| s.trim().is_empty()) {
            issues.push(ProfileIssue {
                field: "skills".to_string(),
                reason: "skill names cannot be blank".to_string(),
            });
        }

        issues
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkillsInput {
    Flat(Vec<String>),
    Categorized {
        #[serde(default)]
        languages: Vec<String>,
        #[serde(default)]
        frameworks: Vec<String>,
        #[serde(default)]
        tools: Vec<String>,
    },
}

/// Accepts either a flat list or `{languages, frameworks, tools}`, flattened in that order.
fn deserialize_skills<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<SkillsInput>::deserialize(deserializer)?;
    Ok(match input {
        None => Vec::new(),
        Some(SkillsInput::Flat(skills)) => skills,
        Some(SkillsInput::Categorized {
            languages,
            frameworks,
            tools,
        }) => languages.into_iter().chain(frameworks).chain(tools).collect(),
    })
}
