//! Upload policy: file count, per-file size and allowed types.

use serde::{Deserialize, Serialize};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";

/// Extension → MIME used when the reported type is empty or unreliable.
const EXTENSION_MIME: &[(&str, &str)] = &[
    (".pdf", MIME_PDF),
    (".txt", MIME_TEXT),
    (".md", MIME_MARKDOWN),
    (".doc", MIME_DOC),
    (".docx", MIME_DOCX),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadsConfig {
    pub max_files: usize,
    pub max_bytes: u64,
    pub allowed_mime: Vec<String>,
    /// Value for the picker's `accept` attribute.
    #[serde(default)]
    pub accept: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        let allowed_mime = [MIME_PDF, MIME_TEXT, MIME_MARKDOWN, MIME_DOCX, MIME_DOC];
        let accept = EXTENSION_MIME
            .iter()
            .map(|(ext, _)| *ext)
            .chain(allowed_mime.iter().copied())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            max_files: 1,
            max_bytes: 1024 * 1024,
            allowed_mime: allowed_mime.iter().map(|m| m.to_string()).collect(),
            accept,
        }
    }
}

/// A file as picked or dropped, before it becomes an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub bytes: bytes::Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    TooLarge,
    NotAllowed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub file: RawFile,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Validation {
    pub accepted: Vec<RawFile>,
    pub rejected: Vec<Rejection>,
}

/// Splits a batch into accepted and rejected files.
///
/// Accepted files beyond `max_files` (in upload order) are rejected with
/// `TooLarge`, matching what clients already display for overflow.
pub fn validate_files(files: Vec<RawFile>, cfg: &UploadsConfig) -> Validation {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for file in files {
        let too_large = file.size > cfg.max_bytes;
        let allowed = cfg.allowed_mime.iter().any(|m| *m == file.mime)
            || allowed_by_extension(&file.name, cfg);
        if too_large {
            rejected.push(Rejection {
                file,
                reason: RejectionReason::TooLarge,
            });
        } else if !allowed {
            rejected.push(Rejection {
                file,
                reason: RejectionReason::NotAllowed,
            });
        } else {
            accepted.push(file);
        }
    }

    if accepted.len() > cfg.max_files {
        let overflow = accepted.split_off(cfg.max_files);
        rejected.extend(overflow.into_iter().map(|file| Rejection {
            file,
            reason: RejectionReason::TooLarge,
        }));
    }

    Validation { accepted, rejected }
}

fn allowed_by_extension(name: &str, cfg: &UploadsConfig) -> bool {
    let lower = name.to_lowercase();
    EXTENSION_MIME
        .iter()
        .find(|(ext, _)| lower.ends_with(*ext))
        .map(|(_, mime)| cfg.allowed_mime.iter().any(|m| m == mime))
        .unwrap_or(false)
}

/// Human-readable size: `512 B`, `1.5 KB`, `120 KB`, `2.0 MB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        return format_unit(kb, "KB");
    }
    format_unit(kb / 1024.0, "MB")
}

fn format_unit(value: f64, unit: &str) -> String {
    if value >= 100.0 {
        format!("{value:.0} {unit}")
    } else {
        format!("{value:.1} {unit}")
    }
}

/// User-facing notice for a rejected file.
pub fn rejection_notice(rejection: &Rejection, cfg: &UploadsConfig) -> String {
    match rejection.reason {
        RejectionReason::NotAllowed => format!("Unsupported file type: {}", rejection.file.name),
        RejectionReason::TooLarge => format!(
            "File too large: {} ({}). Max {}",
            rejection.file.name,
            format_bytes(rejection.file.size),
            format_bytes(cfg.max_bytes)
        ),
    }
}
