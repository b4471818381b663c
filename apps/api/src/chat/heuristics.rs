//! Best-effort local edits used when the backend cannot be reached.
//!
//! Rules are tried in order and the first match wins:
//! 1. "add ... skill ... <list>" → Technical Skills bullet
//! 2. pasted work experience (bullets, experience wording or a date range)
//!    longer than 80 characters → Professional Experience section
//! 3. nothing applies → `None`

use std::sync::OnceLock;

use regex::Regex;

use crate::chat::ProcessingResult;

const SKILLS_HEADING: &str = "## Skills";
const TECHNICAL_SKILLS_LABEL: &str = "**Technical Skills**";
const SKILLS_PLACEHOLDER: &str = "- **Technical Skills**: [Add relevant technical skills]";
const EXPERIENCE_HEADING: &str = "## Professional Experience";
const MIN_EXPERIENCE_CHARS: usize = 80;

const EXPERIENCE_REPLY: &str = "I inferred you want me to incorporate your experience details. \
    I've added them under Professional Experience. Review for accuracy and tell me what to adjust.";

fn skill_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)add.*skills?.*?([a-zA-Z\s,.]+)").expect("valid regex"))
}

fn experience_words_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bexperience\b|\bworked at\b|\bresponsibilit(y|ies)\b")
            .expect("valid regex")
    })
}

fn date_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+20\d{2}|20\d{2}\s*-\s*(Present|20\d{2})",
        )
        .expect("valid regex")
    })
}

pub fn apply_offline_heuristics(message: &str, document: &str) -> Option<ProcessingResult> {
    add_skills(message, document).or_else(|| add_experience(message, document))
}

fn add_skills(message: &str, document: &str) -> Option<ProcessingResult> {
    let lower = message.to_lowercase();
    if !(lower.contains("add") && lower.contains("skill")) {
        return None;
    }
    let skills = skill_list_re()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())?;

    let prefix = format!("- {TECHNICAL_SKILLS_LABEL}:");
    let bullet = format!("{prefix} {skills}");
    let updated = if document.contains(SKILLS_PLACEHOLDER) {
        document.replacen(SKILLS_PLACEHOLDER, &bullet, 1)
    } else if let Some(idx) = document.find(&prefix) {
        extend_line(document, idx, &skills)
    } else if let Some(idx) = document.find(SKILLS_HEADING) {
        insert_under_heading(document, idx, &bullet)
    } else {
        append_section(document, &format!("{SKILLS_HEADING}\n\n{bullet}"))
    };

    Some(ProcessingResult {
        response_message: format!("Added skills: {skills}"),
        updated_markdown: updated,
        has_updates: None,
    })
}

fn add_experience(message: &str, document: &str) -> Option<ProcessingResult> {
    let bullet_lines = message
        .lines()
        .filter(|line| {
            let line = line.trim();
            line.starts_with('-') || line.starts_with('*') || line.starts_with('•')
        })
        .count();
    let mentions_experience = experience_words_re().is_match(message);
    let mentions_dates = date_range_re().is_match(message);
    let content = message.trim();

    if !((bullet_lines >= 2 || mentions_experience || mentions_dates)
        && content.chars().count() > MIN_EXPERIENCE_CHARS)
    {
        return None;
    }

    let updated = if document.trim().is_empty() {
        scaffold_resume(content)
    } else if let Some(idx) = document.find(EXPERIENCE_HEADING) {
        splice_into_section(document, idx, content)
    } else {
        append_section(document, &format!("{EXPERIENCE_HEADING}\n\n{content}"))
    };

    Some(ProcessingResult {
        response_message: EXPERIENCE_REPLY.to_string(),
        updated_markdown: updated,
        has_updates: None,
    })
}

fn append_section(document: &str, section: &str) -> String {
    if document.trim().is_empty() {
        section.to_string()
    } else {
        format!("{document}\n\n{section}")
    }
}

/// Appends `, items` to the end of the line starting at `idx`.
fn extend_line(document: &str, idx: usize, items: &str) -> String {
    let line_end = document[idx..]
        .find('\n')
        .map(|i| idx + i)
        .unwrap_or(document.len());
    let (head, tail) = document.split_at(line_end);
    let head = head.trim_end();
    format!("{head}, {items}{tail}")
}

/// Inserts `bullet` on its own line right below the heading starting at `idx`.
fn insert_under_heading(document: &str, idx: usize, bullet: &str) -> String {
    let line_end = document[idx..]
        .find('\n')
        .map(|i| idx + i)
        .unwrap_or(document.len());
    let (head, tail) = document.split_at(line_end);
    let tail = tail.trim_start_matches('\n');
    let joiner = if tail.is_empty() {
        ""
    } else if tail.starts_with("- ") {
        "\n"
    } else {
        "\n\n"
    };
    format!("{head}\n\n{bullet}{joiner}{tail}")
}

/// Appends `content` at the end of the section whose heading starts at `idx`.
/// The section runs until the next `## ` heading or the end of the document.
fn splice_into_section(document: &str, idx: usize, content: &str) -> String {
    let section_end = document[idx..]
        .find("\n## ")
        .map(|i| idx + i)
        .unwrap_or(document.len());
    let section = &document[idx..section_end];
    format!(
        "{}{}\n\n{}\n\n{}",
        &document[..idx],
        section.trim(),
        content,
        &document[section_end..]
    )
}

fn scaffold_resume(experience: &str) -> String {
    format!(
        "# Your Name\n\n\
         **Your Job Title**\n\n\
         📧 your.email@example.com | 📱 (555) 123-4567 | 🌐 linkedin.com/in/yourname\n\n\
         ---\n\n\
         ## Professional Summary\n\n\
         [Add a brief summary]\n\n\
         ---\n\n\
         {EXPERIENCE_HEADING}\n\n\
         {experience}\n\n\
         ---\n\n\
         ## Education\n\n\
         [Add education]\n\n\
         ---\n\n\
         {SKILLS_HEADING}\n\n\
         {SKILLS_PLACEHOLDER}"
    )
}
