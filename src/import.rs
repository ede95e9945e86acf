// Bulk import: "- word : meaning" lines, validated before they are sent.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::model::NotebookId;

static LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*]\s*(.+?)\s*:\s*(.+)$").expect("import line pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Format,
    EmptyField,
}

impl InvalidReason {
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidReason::Format => "expected \"- word: meaning\"",
            InvalidReason::EmptyField => "empty word or meaning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportLine {
    Valid {
        line: usize,
        word: String,
        meaning: String,
    },
    Invalid {
        line: usize,
        text: String,
        reason: InvalidReason,
    },
}

impl ImportLine {
    pub fn is_valid(&self) -> bool {
        matches!(self, ImportLine::Valid { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPreview {
    pub lines: Vec<ImportLine>,
}

impl ImportPreview {
    pub fn valid_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.lines.len() - self.valid_count()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|l| match l {
            ImportLine::Valid { word, meaning, .. } => Some((word.as_str(), meaning.as_str())),
            ImportLine::Invalid { .. } => None,
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImportRejection {
    #[error("select a notebook first")]
    NoNotebook,
    #[error("enter some text to import")]
    EmptyText,
    #[error("no valid lines to import")]
    NothingValid,
}

/// Classifies every non-blank line; line numbers are 1-based over the raw text.
pub fn parse_import(text: &str) -> ImportPreview {
    let mut lines = Vec::new();
    for (idx, raw) in text.split('\n').enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line = idx + 1;
        let parsed = LINE.captures(trimmed).map(|caps| {
            (
                caps.get(1).map(|m| m.as_str().trim()).unwrap_or(""),
                caps.get(2).map(|m| m.as_str().trim()).unwrap_or(""),
            )
        });
        lines.push(match parsed {
            Some((word, meaning)) if !word.is_empty() && !meaning.is_empty() => ImportLine::Valid {
                line,
                word: word.to_string(),
                meaning: meaning.to_string(),
            },
            Some(_) => ImportLine::Invalid {
                line,
                text: trimmed.to_string(),
                reason: InvalidReason::EmptyField,
            },
            None => ImportLine::Invalid {
                line,
                text: trimmed.to_string(),
                reason: InvalidReason::Format,
            },
        });
    }
    ImportPreview { lines }
}

pub fn check_submittable(
    notebook: Option<NotebookId>,
    text: &str,
    preview: &ImportPreview,
) -> Result<NotebookId, ImportRejection> {
    let id = notebook.ok_or(ImportRejection::NoNotebook)?;
    if text.trim().is_empty() {
        return Err(ImportRejection::EmptyText);
    }
    if preview.valid_count() == 0 {
        return Err(ImportRejection::NothingValid);
    }
    Ok(id)
}
