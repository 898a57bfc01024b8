//! Renders a profile into the Markdown resume document that gets published.

use std::fmt::Write;

use crate::models::profile::UserProfile;

const SECTION_RULE: &str = "---";

pub fn render_resume(profile: &UserProfile) -> String {
    let mut out = String::new();

    if let Some(details) = &profile.personal_details {
        let _ = writeln!(out, "# {}\n", details.name.trim());
        let contact: Vec<&str> = [
            details.phone.as_str(),
            details.email.as_str(),
            details.location.as_str(),
            details.linkedin.as_str(),
            details.github.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
        if !contact.is_empty() {
            let _ = writeln!(out, "{}\n", contact.join(" | "));
        }
    }

    if !profile.education.is_empty() {
        section(&mut out, "Education");
        for edu in &profile.education {
            let _ = writeln!(
                out,
                "### {}, {}{}",
                edu.degree,
                edu.institution,
                date_range(&edu.start_date, &edu.end_date)
            );
            if !edu.gpa.is_empty() {
                let _ = writeln!(out, "GPA: {}", edu.gpa);
            }
            if !edu.courses.is_empty() {
                let _ = writeln!(out, "Courses: {}", edu.courses.join(", "));
            }
            if let Some(summary) = edu.summary.as_deref().filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "{summary}");
            }
            out.push('\n');
        }
    }

    if !profile.experience.is_empty() {
        section(&mut out, "Work Experience");
        for exp in &profile.experience {
            let _ = writeln!(
                out,
                "### {} at {}{}",
                exp.position,
                exp.organization,
                date_range(&exp.start_date, &exp.end_date)
            );
            bullets(&mut out, &exp.description);
        }
    }

    if !profile.projects.is_empty() {
        section(&mut out, "Projects");
        for project in &profile.projects {
            let _ = writeln!(
                out,
                "### {}{}",
                project.name,
                date_range(&project.start_date, &project.end_date)
            );
            if let Some(link) = project.github_link.as_deref().filter(|l| !l.is_empty()) {
                let _ = writeln!(out, "{link}");
            }
            bullets(&mut out, &project.description);
        }
    }

    if !profile.skills.is_empty() {
        section(&mut out, "Skills");
        let _ = writeln!(out, "{}\n", profile.skills.join(", "));
    }

    if !profile.certificates.is_empty() {
        section(&mut out, "Certificates");
        for cert in &profile.certificates {
            if cert.link.is_empty() {
                let _ = writeln!(out, "- {}", cert.name);
            } else {
                let _ = writeln!(out, "- {} ({})", cert.name, cert.link);
            }
        }
    }

    out.trim_end().to_string() + "\n"
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{SECTION_RULE}\n\n## {title}\n");
}

fn bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "- {}", item.trim());
    }
    out.push('\n');
}

fn date_range(start: &str, end: &str) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!(" ({start})"),
        (true, false) => format!(" ({end})"),
        (false, false) => format!(" ({start} - {end})"),
    }
}
