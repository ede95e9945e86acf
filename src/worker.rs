// Runs backend calls off the UI thread. Every request gets its own short-lived
// thread; results come back over a channel in whatever order they finish.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use chrono::{DateTime, Utc};
use log::{debug, error};

use crate::api::{ApiClient, ApiError, DeckSource, ProgressBackend};
use crate::deck::PendingJudgment;
use crate::model::{
    DailyStats, ImportResult, Notebook, NotebookId, NotebookSettings, SearchHit, SessionReport,
    StudySession, Word, WordDraft, WordId,
};

#[derive(Debug, Clone)]
pub enum Request {
    Notebooks,
    CreateNotebook(String),
    RenameNotebook(NotebookId, String),
    DeleteNotebook(NotebookId),
    ResetProgress(NotebookId),
    Settings(NotebookId),
    SaveSettings(NotebookId, NotebookSettings),
    Words(DeckSource, NotebookId),
    CreateWord(WordDraft),
    UpdateWord(WordId, WordDraft),
    DeleteWord(NotebookId, WordId),
    Progress(DeckSource, PendingJudgment),
    Import(NotebookId, String),
    Search(String),
    StartSession(DateTime<Utc>),
    EndSession(i64, SessionReport),
    DailyStats(u32),
}

impl Request {
    /// Short label used in logs and failure notices.
    pub fn describe(&self) -> &'static str {
        match self {
            Request::Notebooks => "load notebooks",
            Request::CreateNotebook(_) => "create notebook",
            Request::RenameNotebook(..) => "rename notebook",
            Request::DeleteNotebook(_) => "delete notebook",
            Request::ResetProgress(_) => "reset progress",
            Request::Settings(_) => "load settings",
            Request::SaveSettings(..) => "save settings",
            Request::Words(..) => "load words",
            Request::CreateWord(_) => "add word",
            Request::UpdateWord(..) => "update word",
            Request::DeleteWord(..) => "delete word",
            Request::Progress(..) => "update progress",
            Request::Import(..) => "import words",
            Request::Search(_) => "search words",
            Request::StartSession(_) => "start session",
            Request::EndSession(..) => "end session",
            Request::DailyStats(_) => "load history",
        }
    }
}

#[derive(Debug)]
pub enum ApiEvent {
    Notebooks(Result<Vec<Notebook>, ApiError>),
    NotebookCreated(Result<Notebook, ApiError>),
    NotebookRenamed(Result<Notebook, ApiError>),
    NotebookDeleted(NotebookId, Result<(), ApiError>),
    ProgressReset(NotebookId, Result<(), ApiError>),
    Settings(NotebookId, Result<NotebookSettings, ApiError>),
    SettingsSaved(NotebookId, Result<NotebookSettings, ApiError>),
    Words(DeckSource, NotebookId, Result<Vec<Word>, ApiError>),
    WordCreated(Result<Word, ApiError>),
    WordUpdated(Result<Word, ApiError>),
    WordDeleted(NotebookId, WordId, Result<(), ApiError>),
    Progress(DeckSource, PendingJudgment, Result<Word, ApiError>),
    Imported(NotebookId, Result<ImportResult, ApiError>),
    Search(String, Result<Vec<SearchHit>, ApiError>),
    SessionStarted(Result<StudySession, ApiError>),
    SessionEnded(Result<StudySession, ApiError>),
    DailyStats(u32, Result<Vec<DailyStats>, ApiError>),
}

/// Seam between the app state and the network.
pub trait Dispatch {
    fn submit(&mut self, req: Request);
    fn poll(&mut self) -> Vec<ApiEvent>;
}

pub struct Worker {
    client: ApiClient,
    tx: Sender<ApiEvent>,
    rx: Receiver<ApiEvent>,
}

impl Worker {
    pub fn new(client: ApiClient) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { client, tx, rx }
    }
}

impl Dispatch for Worker {
    fn submit(&mut self, req: Request) {
        debug!("dispatch: {}", req.describe());
        let client = self.client.clone();
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("vocadeck-api".into())
            .spawn(move || {
                // receiver gone means the UI is shutting down
                let _ = tx.send(run(&client, req));
            });
        if let Err(e) = spawned {
            error!("could not spawn request thread: {e}");
        }
    }

    fn poll(&mut self) -> Vec<ApiEvent> {
        self.rx.try_iter().collect()
    }
}

fn run(client: &ApiClient, req: Request) -> ApiEvent {
    match req {
        Request::Notebooks => ApiEvent::Notebooks(client.list_notebooks()),
        Request::CreateNotebook(name) => ApiEvent::NotebookCreated(client.create_notebook(&name)),
        Request::RenameNotebook(id, name) => {
            ApiEvent::NotebookRenamed(client.rename_notebook(id, &name))
        }
        Request::DeleteNotebook(id) => ApiEvent::NotebookDeleted(id, client.delete_notebook(id)),
        Request::ResetProgress(id) => ApiEvent::ProgressReset(id, client.reset_progress(id)),
        Request::Settings(id) => ApiEvent::Settings(id, client.notebook_settings(id)),
        Request::SaveSettings(id, settings) => {
            ApiEvent::SettingsSaved(id, client.save_notebook_settings(id, &settings))
        }
        Request::Words(source, id) => ApiEvent::Words(source, id, client.list_words(source, id)),
        Request::CreateWord(draft) => ApiEvent::WordCreated(client.create_word(&draft)),
        Request::UpdateWord(id, draft) => ApiEvent::WordUpdated(client.update_word(id, &draft)),
        Request::DeleteWord(nb, id) => ApiEvent::WordDeleted(nb, id, client.delete_word(id)),
        Request::Progress(source, pj) => {
            let res = client.update_progress(pj.word_id, pj.update());
            ApiEvent::Progress(source, pj, res)
        }
        Request::Import(nb, text) => ApiEvent::Imported(nb, client.import_words(nb, &text)),
        Request::Search(q) => {
            let res = client.search_words(&q);
            ApiEvent::Search(q, res)
        }
        Request::StartSession(at) => ApiEvent::SessionStarted(client.start_session(at)),
        Request::EndSession(id, report) => ApiEvent::SessionEnded(client.end_session(id, &report)),
        Request::DailyStats(days) => ApiEvent::DailyStats(days, client.daily_stats(days)),
    }
}
