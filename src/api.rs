// Blocking HTTP client for the notebook backend.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{
    DailyStats, ImportRequest, ImportResult, Notebook, NotebookDraft, NotebookId,
    NotebookSettings, ProgressUpdate, SearchHit, SessionReport, SessionStart, SettingsEnvelope,
    StudySession, Word, WordDraft, WordId,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid API url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}")]
    Status { status: u16, detail: Option<String> },
}

impl ApiError {
    /// Server-provided detail verbatim when there is one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => format!("{fallback}: {detail}"),
            ApiError::Status { status, .. } => format!("{fallback} (HTTP {status})"),
            ApiError::Transport(e) if e.is_connect() || e.is_timeout() => format!(
                "{fallback}: cannot reach the backend. Check that it is running."
            ),
            _ => fallback.to_string(),
        }
    }
}

/// Where a deck pulls its words from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckSource {
    All,
    WrongOnly,
}

impl DeckSource {
    fn path(self) -> &'static str {
        match self {
            DeckSource::All => "/api/words",
            DeckSource::WrongOnly => "/api/words/wrong-only",
        }
    }
}

/// The single capability a deck session needs from the backend.
pub trait ProgressBackend {
    fn update_progress(&self, id: WordId, update: ProgressUpdate) -> Result<Word, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(base_url));
        }
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ---------------- notebooks ----------------
    pub fn list_notebooks(&self) -> Result<Vec<Notebook>, ApiError> {
        fetch(self.client.get(self.url("/api/notebooks")))
    }

    pub fn create_notebook(&self, name: &str) -> Result<Notebook, ApiError> {
        let body = NotebookDraft { name: name.into() };
        fetch(self.client.post(self.url("/api/notebooks")).json(&body))
    }

    pub fn rename_notebook(&self, id: NotebookId, name: &str) -> Result<Notebook, ApiError> {
        let body = NotebookDraft { name: name.into() };
        fetch(
            self.client
                .put(self.url(&format!("/api/notebooks/{id}")))
                .json(&body),
        )
    }

    pub fn delete_notebook(&self, id: NotebookId) -> Result<(), ApiError> {
        execute(self.client.delete(self.url(&format!("/api/notebooks/{id}"))))
    }

    pub fn reset_progress(&self, id: NotebookId) -> Result<(), ApiError> {
        execute(
            self.client
                .post(self.url(&format!("/api/notebooks/{id}/reset-progress"))),
        )
    }

    pub fn notebook_settings(&self, id: NotebookId) -> Result<NotebookSettings, ApiError> {
        fetch(
            self.client
                .get(self.url("/api/notebook-settings"))
                .query(&[("notebook_id", id)]),
        )
    }

    pub fn save_notebook_settings(
        &self,
        id: NotebookId,
        settings: &NotebookSettings,
    ) -> Result<NotebookSettings, ApiError> {
        fetch(
            self.client
                .put(self.url("/api/notebook-settings"))
                .query(&[("notebook_id", id)])
                .json(&SettingsEnvelope { settings }),
        )
    }

    // ---------------- words ----------------
    pub fn list_words(
        &self,
        source: DeckSource,
        notebook_id: NotebookId,
    ) -> Result<Vec<Word>, ApiError> {
        fetch(
            self.client
                .get(self.url(source.path()))
                .query(&[("notebook_id", notebook_id)]),
        )
    }

    pub fn search_words(&self, query: &str) -> Result<Vec<SearchHit>, ApiError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        fetch(
            self.client
                .get(self.url("/api/words/search"))
                .query(&[("q", query)]),
        )
    }

    pub fn create_word(&self, draft: &WordDraft) -> Result<Word, ApiError> {
        fetch(self.client.post(self.url("/api/words")).json(draft))
    }

    pub fn update_word(&self, id: WordId, draft: &WordDraft) -> Result<Word, ApiError> {
        fetch(
            self.client
                .put(self.url(&format!("/api/words/{id}")))
                .json(draft),
        )
    }

    pub fn delete_word(&self, id: WordId) -> Result<(), ApiError> {
        execute(self.client.delete(self.url(&format!("/api/words/{id}"))))
    }

    pub fn import_words(&self, notebook_id: NotebookId, text: &str) -> Result<ImportResult, ApiError> {
        let body = ImportRequest { notebook_id, text };
        fetch(self.client.post(self.url("/api/words/import")).json(&body))
    }

    // ---------------- sessions & stats ----------------
    pub fn start_session(&self, start_time: DateTime<Utc>) -> Result<StudySession, ApiError> {
        let body = SessionStart { start_time };
        fetch(self.client.post(self.url("/api/sessions")).json(&body))
    }

    pub fn end_session(&self, id: i64, report: &SessionReport) -> Result<StudySession, ApiError> {
        fetch(
            self.client
                .put(self.url(&format!("/api/sessions/{id}")))
                .json(report),
        )
    }

    pub fn daily_stats(&self, days: u32) -> Result<Vec<DailyStats>, ApiError> {
        fetch(
            self.client
                .get(self.url("/api/stats/daily"))
                .query(&[("days", days)]),
        )
    }
}

impl ProgressBackend for ApiClient {
    fn update_progress(&self, id: WordId, update: ProgressUpdate) -> Result<Word, ApiError> {
        fetch(
            self.client
                .put(self.url(&format!("/api/words/{id}/progress")))
                .json(&update),
        )
    }
}

fn fetch<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
    let resp = send(req)?;
    Ok(resp.json()?)
}

fn execute(req: RequestBuilder) -> Result<(), ApiError> {
    send(req).map(|_| ())
}

fn send(req: RequestBuilder) -> Result<Response, ApiError> {
    let resp = req.send().map_err(|e| {
        warn!("transport failure: {e}");
        ApiError::from(e)
    })?;
    let status = resp.status();
    let url = resp.url().clone();
    debug!("{} {}", status.as_u16(), url);
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let detail = detail_from_body(&body);
    warn!("{} from {}: {}", status, url, detail.as_deref().unwrap_or("-"));
    Err(ApiError::Status {
        status: status.as_u16(),
        detail,
    })
}

/// Pulls `detail` out of a FastAPI-style error body.
fn detail_from_body(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    match v.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
