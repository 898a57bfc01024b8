// Prompt templates for every stage. Placeholders are `{name}` and are filled
// by `fill_template` before sending.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("valid regex"));

/// Fills every `{name}` in `template` in a single pass. Inserted values are
/// never rescanned, so user text that looks like a placeholder stays as is.
/// Names without a value are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

pub const INTENT_SYSTEM: &str = "You are an expert at interpreting user queries, classifying them \
    into intents and extracting job descriptions from unstructured text.";

/// Replace: {user_query}
pub const INTENT_PROMPT_TEMPLATE: &str = r#"Given the user query:
{user_query}

Classify the user query into one of the following intents:
1. "resume": the query is about building or improving a resume. Eg: Can you help me improve my resume?
2. "cover_letter": the query is about writing a cover letter. Eg: Can you write a cover letter for this job?
3. "": the query is unclear or about anything else. Eg: Can you help me?

If the query also contains a job description, set is_jd_given to true and copy the job description
into job_description. Otherwise set is_jd_given to false and job_description to "".

Return a JSON object with this EXACT schema:
{
  "intent": "resume",
  "is_jd_given": false,
  "job_description": ""
}"#;

pub const STRUCTURE_SYSTEM: &str =
    "You are an expert at turning unstructured job descriptions into a structured format.";

/// Replace: {job_description}
pub const STRUCTURE_PROMPT_TEMPLATE: &str = r#"Extract the job description below into this EXACT JSON schema:
{
  "position": "Job title",
  "organization": "Company name",
  "responsibilities": ["Summarized responsibility"],
  "skills": ["python"]
}

Rules:
1. position is the job title.
2. organization is the company name.
3. responsibilities is a list of SUMMARIZED responsibilities, not copied sentences.
4. skills lists languages, frameworks or tools named in the text. Eg: python, java, github, pytorch, docker.
   Do NOT add skills that are not mentioned.
5. If the text is not a job posting, return empty strings and empty lists.

Job description:
{job_description}"#;

pub const EXPERIENCE_RATING_SYSTEM: &str = "You are an expert judge who rates how relevant a \
    candidate's work experience is to a job description. A high score means highly relevant.";

/// Replace: {experience}, {job_description}
pub const EXPERIENCE_RATING_PROMPT_TEMPLATE: &str = r#"Rate the candidate's work experience against the job description on a 0-10 scale.

Candidate's work experience:
{experience}

Job description:
{job_description}

Return a JSON object: {"rating": 7}"#;

pub const PROJECT_RATING_SYSTEM: &str = "You are an expert judge who rates how relevant a \
    candidate's project is to a job description. A high score means highly relevant.";

/// Replace: {project}, {job_description}
pub const PROJECT_RATING_PROMPT_TEMPLATE: &str = r#"Rate the candidate's project against the job description on a 0-10 scale.

Candidate's project:
{project}

Job description:
{job_description}

Return a JSON object: {"rating": 7}"#;

pub const SKILLS_SYSTEM: &str =
    "You are an expert judge who selects the candidate skills most relevant to a job description.";

/// Replace: {skills}, {job_description}
pub const SKILLS_PROMPT_TEMPLATE: &str = r#"Select the top 10 of the candidate's skills that are most relevant to the job description,
most relevant first. Only pick from the candidate's skills.

Candidate's skills:
{skills}

Job description:
{job_description}

Return a JSON object: {"skills": ["Rust", "Docker"]}"#;

pub const REPHRASE_SYSTEM: &str =
    "You are an expert at writing highly professional and impactful resume content.";

/// Replace: {experience}, {job_description}
pub const REPHRASE_PROMPT_TEMPLATE: &str = r#"Rewrite the experience below as concise bullet points that start with action verbs,
use keywords relevant to the job, and highlight quantifiable results where the experience states them.

Use as few bullet points as possible while keeping the impact. At most 3 bullet points, each fitting on one line.

Experience:
{experience}

Job description:
{job_description}

Return a JSON object: {"enhanced_points": ["Cut p99 latency 40% by rewriting the cache layer in Rust"]}"#;

pub const COVER_LETTER_SYSTEM: &str = r#"You are an expert career coach and professional writer who writes tailored cover letters.
Write a compelling, concise letter that highlights the candidate's qualifications and enthusiasm for the role,
aligned with the job description. Keep a professional tone, stay under one page, and do not invent facts.

Use this template:

[Your Name]
[Email]
[Phone Number]
[Date]

Hiring Manager
[Company Name]

Dear Hiring Manager,

[Cover Letter Body]

Sincerely,
[Your Name]
[LinkedIn Profile Link]
[GitHub Link]

Write links as bare URLs. Never use markdown link syntax."#;

/// Replace: {position}, {organization}, {user_details}, {user_skills},
///          {user_experiences}, {user_projects}, {user_education},
///          {job_responsibilities}, {job_skills}, {date}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"I am applying for {position} at {organization}. Here is some background about me:

My details:
{user_details}

My skills:
{user_skills}

My experience:
{user_experiences}

My projects:
{user_projects}

My education:
{user_education}

Job responsibilities:
{job_responsibilities}

Job skills:
{job_skills}

Today's date: {date}

Write a tailored and engaging cover letter based on this information. Return only the letter text."#;
