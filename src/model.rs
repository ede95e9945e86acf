// Wire types shared with the notebook backend.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub type WordId = i64;
pub type NotebookId = i64;

// ---------------- Words ----------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub word: String,
    pub meaning: String,
    pub notebook_id: NotebookId,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub wrong_count: u32,
    #[serde(default)]
    pub mastered: bool,
    #[serde(default)]
    pub last_studied: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordDraft {
    pub word: String,
    pub meaning: String,
    pub notebook_id: NotebookId,
}

/// Body of `PUT /api/words/{id}/progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub correct: bool,
    pub mastered: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: WordId,
    pub word: String,
    pub meaning: String,
    pub notebook_id: NotebookId,
    #[serde(default)]
    pub notebook_name: String,
    #[serde(default)]
    pub mastered: bool,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub wrong_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest<'a> {
    pub notebook_id: NotebookId,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ImportResult {
    #[serde(default)]
    pub added_count: u32,
    #[serde(default)]
    pub skipped_count: u32,
}

// ---------------- Notebooks ----------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: NotebookId,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotebookDraft {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardDirection {
    #[default]
    #[serde(rename = "word-to-meaning")]
    WordToMeaning,
    #[serde(rename = "meaning-to-word")]
    MeaningToWord,
}

impl CardDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::WordToMeaning => Self::MeaningToWord,
            Self::MeaningToWord => Self::WordToMeaning,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WordToMeaning => "word → meaning",
            Self::MeaningToWord => "meaning → word",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardOrder {
    #[default]
    Sequential,
    Random,
}

impl CardOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Sequential => Self::Random,
            Self::Random => Self::Sequential,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardColors {
    #[serde(default = "default_front_color")]
    pub front: String,
    #[serde(default = "default_back_color")]
    pub back: String,
}

fn default_front_color() -> String {
    "blue".into()
}

fn default_back_color() -> String {
    "light-blue".into()
}

impl Default for CardColors {
    fn default() -> Self {
        Self {
            front: default_front_color(),
            back: default_back_color(),
        }
    }
}

/// Per-notebook study preferences (`/api/notebook-settings`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotebookSettings {
    #[serde(default)]
    pub exclude_mastered: bool,
    #[serde(default)]
    pub default_direction: CardDirection,
    #[serde(default)]
    pub default_order: CardOrder,
    #[serde(default)]
    pub card_colors: CardColors,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsEnvelope<'a> {
    pub settings: &'a NotebookSettings,
}

// ---------------- Sessions & history ----------------
#[derive(Debug, Clone, Serialize)]
pub struct SessionStart {
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub end_time: DateTime<Utc>,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub words_studied: u32,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudySession {
    pub id: i64,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub wrong_count: u32,
    #[serde(default)]
    pub words_studied: u32,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    #[serde(default)]
    pub study_time_seconds: u64,
    #[serde(default)]
    pub words_studied: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub wrong_count: u32,
    #[serde(default)]
    pub accuracy_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_decodes_backend_payload() {
        let raw = r#"{"id":3,"word":"apple","meaning":"りんご","notebook_id":1,
            "correct_count":2,"wrong_count":1,"last_studied":"2025-01-05T10:11:12.123456","mastered":false}"#;
        let w: Word = serde_json::from_str(raw).unwrap();
        assert_eq!(w.id, 3);
        assert_eq!(w.meaning, "りんご");
        assert_eq!(w.correct_count, 2);
        assert!(w.last_studied.is_some());
    }

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let raw = r#"{"notebook_id":1,"exclude_mastered":true,"default_order":"random"}"#;
        let s: NotebookSettings = serde_json::from_str(raw).unwrap();
        assert!(s.exclude_mastered);
        assert_eq!(s.default_order, CardOrder::Random);
        assert_eq!(s.default_direction, CardDirection::WordToMeaning);
        assert_eq!(s.card_colors.front, "blue");
    }

    #[test]
    fn progress_update_serializes_null_mastery() {
        let body = serde_json::to_value(ProgressUpdate {
            correct: true,
            mastered: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"correct": true, "mastered": null}));
    }

    #[test]
    fn direction_uses_kebab_wire_names() {
        let v = serde_json::to_value(CardDirection::MeaningToWord).unwrap();
        assert_eq!(v, serde_json::json!("meaning-to-word"));
    }
}
