// TUI state: tabs, overlays, key handling and the fold of backend events.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info, warn};
use ratatui::widgets::ListState;
use tui_textarea::TextArea;

use crate::api::{ApiError, DeckSource};
use crate::deck::{DeckSession, Judgment};
use crate::import::{check_submittable, parse_import, ImportPreview};
use crate::model::{
    DailyStats, Notebook, NotebookId, NotebookSettings, SearchHit, Word, WordDraft, WordId,
};
use crate::session::SessionTracker;
use crate::stats::HISTORY_WINDOWS;
use crate::ui::{next_preset, Theme};
use crate::worker::{ApiEvent, Dispatch, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Manage,
    Cards,
    Review,
    History,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Manage, Tab::Cards, Tab::Review, Tab::History, Tab::Settings];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Manage => "Manage",
            Tab::Cards => "Cards",
            Tab::Review => "Review",
            Tab::History => "History",
            Tab::Settings => "Settings",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn step(self, delta: isize) -> Tab {
        let n = Tab::ALL.len() as isize;
        Tab::ALL[(self.index() as isize + delta).rem_euclid(n) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Notebooks,
    Words,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // cards
    Flip,
    PrevCard,
    NextCard,
    ToggleDirection,
    ToggleOrder,
    ResetCard,
    MarkCorrect,
    MarkWrong,
    ToggleMastered,
    // session
    StartSession,
    EndSession,
    // words & notebooks
    AddWord,
    EditWord,
    DeleteWord,
    NewNotebook,
    RenameNotebook,
    DeleteNotebook,
    Import,
    Search,
    Reload,
    // settings & history
    SaveSettings,
    ResetProgress,
    HistoryShorter,
    HistoryLonger,
}

// ---------------- overlays ----------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    NewNotebook,
    RenameNotebook(NotebookId),
    WordTerm {
        editing: Option<WordId>,
    },
    WordMeaning {
        editing: Option<WordId>,
        word: String,
    },
    Search,
}

/// Single-line text entry.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: String,
    pub cursor: usize,
}

impl Prompt {
    fn new(kind: PromptKind, initial: impl Into<String>) -> Self {
        let buffer = initial.into();
        let cursor = buffer.chars().count();
        Self {
            kind,
            buffer,
            cursor,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            PromptKind::NewNotebook => " New notebook ",
            PromptKind::RenameNotebook(_) => " Rename notebook ",
            PromptKind::WordTerm { editing: None } => " New word: term ",
            PromptKind::WordTerm { .. } => " Edit word: term ",
            PromptKind::WordMeaning { editing: None, .. } => " New word: meaning ",
            PromptKind::WordMeaning { .. } => " Edit word: meaning ",
            PromptKind::Search => " Search all notebooks ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Editing,
    Submit,
    Cancel,
}

pub fn handle_prompt_key(p: &mut Prompt, k: &KeyEvent) -> PromptOutcome {
    match k.code {
        KeyCode::Esc => return PromptOutcome::Cancel,
        KeyCode::Enter => return PromptOutcome::Submit,
        KeyCode::Backspace => backspace(p),
        KeyCode::Left => p.cursor = p.cursor.saturating_sub(1),
        KeyCode::Right => p.cursor = (p.cursor + 1).min(p.buffer.chars().count()),
        KeyCode::Home => p.cursor = 0,
        KeyCode::End => p.cursor = p.buffer.chars().count(),
        KeyCode::Char(ch) if !k.modifiers.contains(KeyModifiers::CONTROL) => insert_char(p, ch),
        _ => {}
    }
    PromptOutcome::Editing
}

fn insert_char(p: &mut Prompt, ch: char) {
    let mut v: Vec<char> = p.buffer.chars().collect();
    let pos = p.cursor.min(v.len());
    v.insert(pos, ch);
    p.cursor = pos + 1;
    p.buffer = v.into_iter().collect();
}

fn backspace(p: &mut Prompt) {
    if p.cursor == 0 {
        return;
    }
    let mut v: Vec<char> = p.buffer.chars().collect();
    let pos = (p.cursor - 1).min(v.len().saturating_sub(1));
    if pos < v.len() {
        v.remove(pos);
    }
    p.cursor = pos;
    p.buffer = v.into_iter().collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteNotebook(NotebookId),
    DeleteWord(NotebookId, WordId),
    ResetProgress(NotebookId),
}

#[derive(Debug, Clone)]
pub struct Confirm {
    pub message: String,
    pub action: ConfirmAction,
}

#[derive(Debug, Clone)]
pub struct ImportDraft {
    pub textarea: TextArea<'static>,
    pub preview: ImportPreview,
    pub submitting: bool,
}

impl ImportDraft {
    fn new() -> Self {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("- apple: りんご\n- take off: 離陸する");
        Self {
            textarea,
            preview: ImportPreview::default(),
            submitting: false,
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    fn refresh(&mut self) {
        self.preview = parse_import(&self.text());
    }
}

#[derive(Debug, Clone)]
pub struct SearchView {
    pub query: String,
    pub hits: Option<Vec<SearchHit>>,
    pub state: ListState,
}

#[derive(Debug, Clone)]
pub enum Overlay {
    Prompt(Prompt),
    Confirm(Confirm),
    Import(ImportDraft),
    Search(SearchView),
}

// ---------------- app ----------------

pub struct App {
    pub theme: Theme,
    pub keymap: HashMap<char, KeyAction>,
    dispatch: Box<dyn Dispatch>,

    pub tab: Tab,
    pub focus: Focus,
    pub notebooks: Vec<Notebook>,
    pub notebook_state: ListState,
    pub notebook: Option<NotebookId>,
    preferred_notebook: Option<NotebookId>,
    pub word_state: ListState,
    focus_word: Option<WordId>,

    pub cards: DeckSession,
    pub review: DeckSession,
    pub tracker: SessionTracker,
    session_request: bool,

    pub settings: NotebookSettings,
    pub settings_draft: NotebookSettings,
    pub settings_field: usize,

    pub history_window: usize,
    pub history: Vec<DailyStats>,

    pub overlay: Option<Overlay>,
    pub notices: VecDeque<String>,
    pub status: Option<String>,
    pub quit: bool,
}

pub const SETTINGS_FIELDS: usize = 4;

impl App {
    pub fn new(
        theme: Theme,
        keymap: HashMap<char, KeyAction>,
        advance_delay: Duration,
        preferred_notebook: Option<NotebookId>,
        dispatch: Box<dyn Dispatch>,
    ) -> Self {
        Self {
            theme,
            keymap,
            dispatch,
            tab: Tab::Cards,
            focus: Focus::Notebooks,
            notebooks: Vec::new(),
            notebook_state: ListState::default(),
            notebook: None,
            preferred_notebook,
            word_state: ListState::default(),
            focus_word: None,
            cards: DeckSession::new(DeckSource::All, advance_delay),
            review: DeckSession::new(DeckSource::WrongOnly, advance_delay),
            tracker: SessionTracker::default(),
            session_request: false,
            settings: NotebookSettings::default(),
            settings_draft: NotebookSettings::default(),
            settings_field: 0,
            history_window: 0,
            history: Vec::new(),
            overlay: None,
            notices: VecDeque::new(),
            status: None,
            quit: false,
        }
    }

    /// Kicks off the first load.
    pub fn start(&mut self) {
        self.dispatch.submit(Request::Notebooks);
    }

    pub fn history_days(&self) -> u32 {
        HISTORY_WINDOWS[self.history_window.min(HISTORY_WINDOWS.len() - 1)]
    }

    pub fn current_notebook(&self) -> Option<&Notebook> {
        let id = self.notebook?;
        self.notebooks.iter().find(|n| n.id == id)
    }

    pub fn selected_word(&self) -> Option<&Word> {
        self.word_state
            .selected()
            .and_then(|i| self.cards.words().get(i))
    }

    pub fn active_deck(&self) -> Option<&DeckSession> {
        match self.tab {
            Tab::Cards => Some(&self.cards),
            Tab::Review => Some(&self.review),
            _ => None,
        }
    }

    fn active_deck_mut(&mut self) -> Option<&mut DeckSession> {
        match self.tab {
            Tab::Cards => Some(&mut self.cards),
            Tab::Review => Some(&mut self.review),
            _ => None,
        }
    }

    fn deck_mut(&mut self, source: DeckSource) -> &mut DeckSession {
        match source {
            DeckSource::All => &mut self.cards,
            DeckSource::WrongOnly => &mut self.review,
        }
    }

    fn notify(&mut self, message: String) {
        self.notices.push_back(message);
    }

    fn fail(&mut self, what: &str, err: &ApiError) {
        warn!("{what} failed: {err}");
        let msg = err.user_message(&format!("Failed to {what}"));
        self.notify(msg);
    }

    /// One loop iteration: fire due advances and fold finished requests.
    pub fn tick(&mut self, now: Instant) {
        self.cards.tick(now);
        self.review.tick(now);
        for ev in self.dispatch.poll() {
            self.handle_event(ev);
        }
    }

    // ---------------- notebook selection ----------------

    fn select_notebook(&mut self, id: NotebookId) {
        if self.notebook == Some(id) {
            return;
        }
        info!("open notebook {id}");
        self.notebook = Some(id);
        self.notebook_state
            .select(self.notebooks.iter().position(|n| n.id == id));
        self.cards.clear();
        self.review.clear();
        self.word_state.select(None);
        self.settings = NotebookSettings::default();
        self.settings_draft = self.settings.clone();
        self.dispatch.submit(Request::Settings(id));
        self.load_words();
    }

    fn clear_notebook(&mut self) {
        self.notebook = None;
        self.notebook_state.select(None);
        self.cards.clear();
        self.review.clear();
        self.word_state.select(None);
    }

    fn load_words(&mut self) {
        if let Some(id) = self.notebook {
            self.dispatch.submit(Request::Words(DeckSource::All, id));
            self.dispatch.submit(Request::Words(DeckSource::WrongOnly, id));
        }
    }

    fn sync_notebook_state(&mut self) {
        let idx = self
            .notebook
            .and_then(|id| self.notebooks.iter().position(|n| n.id == id));
        self.notebook_state.select(idx);
    }

    fn sync_word_state(&mut self) {
        let n = self.cards.words().len();
        if let Some(id) = self.focus_word.take() {
            if let Some(i) = self.cards.words().iter().position(|w| w.id == id) {
                self.word_state.select(Some(i));
                return;
            }
        }
        let sel = match self.word_state.selected() {
            _ if n == 0 => None,
            Some(i) => Some(i.min(n - 1)),
            None => Some(0),
        };
        self.word_state.select(sel);
    }

    fn is_current(&self, id: NotebookId) -> bool {
        if self.notebook == Some(id) {
            true
        } else {
            debug!("discarding response for notebook {id}");
            false
        }
    }

    // ---------------- backend events ----------------

    pub fn handle_event(&mut self, ev: ApiEvent) {
        match ev {
            ApiEvent::Notebooks(Ok(list)) => {
                self.notebooks = list;
                let keep = self
                    .notebook
                    .filter(|id| self.notebooks.iter().any(|n| n.id == *id));
                let wanted = keep
                    .or_else(|| {
                        self.preferred_notebook
                            .take()
                            .filter(|id| self.notebooks.iter().any(|n| n.id == *id))
                    })
                    .or_else(|| self.notebooks.first().map(|n| n.id));
                match wanted {
                    Some(id) => {
                        self.select_notebook(id);
                        self.sync_notebook_state();
                    }
                    None => self.clear_notebook(),
                }
            }
            ApiEvent::Notebooks(Err(e)) => self.fail("load notebooks", &e),

            ApiEvent::NotebookCreated(Ok(nb)) => {
                let id = nb.id;
                self.notebooks.push(nb);
                self.select_notebook(id);
                self.status = Some("Notebook created".into());
            }
            ApiEvent::NotebookCreated(Err(e)) => self.fail("create notebook", &e),

            ApiEvent::NotebookRenamed(Ok(nb)) => {
                if let Some(slot) = self.notebooks.iter_mut().find(|n| n.id == nb.id) {
                    *slot = nb;
                }
            }
            ApiEvent::NotebookRenamed(Err(e)) => self.fail("rename notebook", &e),

            ApiEvent::NotebookDeleted(id, Ok(())) => {
                self.notebooks.retain(|n| n.id != id);
                if self.notebook == Some(id) {
                    self.notebook = None;
                    match self.notebooks.first().map(|n| n.id) {
                        Some(first) => self.select_notebook(first),
                        None => self.clear_notebook(),
                    }
                }
                self.sync_notebook_state();
                self.status = Some("Notebook deleted".into());
            }
            ApiEvent::NotebookDeleted(_, Err(e)) => self.fail("delete notebook", &e),

            ApiEvent::ProgressReset(id, Ok(())) => {
                if self.is_current(id) {
                    self.load_words();
                }
                self.status = Some("Progress reset".into());
            }
            ApiEvent::ProgressReset(_, Err(e)) => self.fail("reset progress", &e),

            ApiEvent::Settings(id, res) | ApiEvent::SettingsSaved(id, res) if !self.is_current(id) => {
                if let Err(e) = res {
                    warn!("settings for notebook {id} failed: {e}");
                }
            }
            ApiEvent::Settings(_, Ok(s)) => self.install_settings(s),
            ApiEvent::Settings(_, Err(e)) => self.fail("load settings", &e),
            ApiEvent::SettingsSaved(_, Ok(s)) => {
                self.install_settings(s);
                self.status = Some("Settings saved".into());
            }
            ApiEvent::SettingsSaved(_, Err(e)) => self.fail("save settings", &e),

            ApiEvent::Words(source, id, res) => {
                if !self.is_current(id) {
                    return;
                }
                match res {
                    Ok(words) => {
                        self.deck_mut(source).set_words(words);
                        if source == DeckSource::All {
                            self.sync_word_state();
                        }
                    }
                    Err(e) => self.fail("load words", &e),
                }
            }

            ApiEvent::WordCreated(Ok(w)) => {
                if self.notebook == Some(w.notebook_id) {
                    self.focus_word = Some(w.id);
                    let mut words = self.cards.words().to_vec();
                    words.push(w);
                    self.cards.set_words(words);
                    self.sync_word_state();
                }
                self.status = Some("Word added".into());
            }
            ApiEvent::WordCreated(Err(e)) => self.fail("add word", &e),

            ApiEvent::WordUpdated(Ok(w)) => {
                self.cards.apply_update(&w);
                self.review.apply_update(&w);
            }
            ApiEvent::WordUpdated(Err(e)) => self.fail("update word", &e),

            ApiEvent::WordDeleted(nb, id, Ok(())) => {
                if self.is_current(nb) {
                    for deck in [&mut self.cards, &mut self.review] {
                        let rest: Vec<Word> =
                            deck.words().iter().filter(|w| w.id != id).cloned().collect();
                        deck.set_words(rest);
                    }
                    self.sync_word_state();
                }
            }
            ApiEvent::WordDeleted(_, _, Err(e)) => self.fail("delete word", &e),

            ApiEvent::Progress(source, pj, Ok(word)) => {
                self.cards.apply_update(&word);
                self.review.apply_update(&word);
                match pj.judgment {
                    Judgment::Correct => self.tracker.counters_mut().correct(),
                    Judgment::Wrong => self.tracker.counters_mut().wrong(),
                    Judgment::Master | Judgment::Unmaster => {}
                }
                debug!("progress applied to word {} from {source:?}", word.id);
            }
            ApiEvent::Progress(source, pj, Err(e)) => {
                let deck = self.deck_mut(source);
                if deck.current().map(|w| w.id) == Some(pj.word_id) {
                    deck.cancel_advance();
                }
                self.fail("update progress", &e);
            }

            ApiEvent::Imported(nb, res) => {
                if let Some(Overlay::Import(draft)) = self.overlay.as_mut() {
                    draft.submitting = false;
                }
                match res {
                    Ok(r) => {
                        if matches!(self.overlay, Some(Overlay::Import(_))) {
                            self.overlay = None;
                        }
                        self.status = Some(format!(
                            "Imported {} words ({} skipped)",
                            r.added_count, r.skipped_count
                        ));
                        if self.notebook == Some(nb) {
                            self.load_words();
                        }
                    }
                    Err(e) => self.fail("import words", &e),
                }
            }

            ApiEvent::Search(query, res) => match res {
                Ok(hits) => {
                    if let Some(Overlay::Search(view)) = self.overlay.as_mut() {
                        if view.query == query {
                            view.state.select(if hits.is_empty() { None } else { Some(0) });
                            view.hits = Some(hits);
                        }
                    }
                }
                Err(e) => self.fail("search words", &e),
            },

            ApiEvent::SessionStarted(res) => {
                self.session_request = false;
                match res {
                    Ok(s) => match self.tracker.start(s.id, Instant::now()) {
                        Ok(()) => self.status = Some("Session started".into()),
                        Err(e) => warn!("session {} ignored: {e}", s.id),
                    },
                    Err(e) => self.fail("start session", &e),
                }
            }
            ApiEvent::SessionEnded(res) => {
                self.session_request = false;
                match res {
                    Ok(s) => {
                        info!(
                            "session {} saved: {} words, {} correct, {} wrong, {}s",
                            s.id,
                            s.words_studied,
                            s.correct_count,
                            s.wrong_count,
                            s.duration_seconds.unwrap_or_default()
                        );
                        self.tracker.finish();
                        self.status = Some("Session saved".into());
                    }
                    Err(e) => self.fail("end session", &e),
                }
            }

            ApiEvent::DailyStats(days, Ok(list)) => {
                if days == self.history_days() {
                    self.history = list;
                }
            }
            ApiEvent::DailyStats(_, Err(e)) => self.fail("load history", &e),
        }
    }

    fn install_settings(&mut self, s: NotebookSettings) {
        self.cards.apply_settings(&s);
        self.review.apply_settings(&s);
        self.settings_draft = s.clone();
        self.settings = s;
    }

    // ---------------- keys ----------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        if !self.notices.is_empty() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notices.pop_front();
            }
            return;
        }
        if let Some(overlay) = self.overlay.take() {
            self.handle_overlay_key(overlay, key);
            return;
        }
        self.status = None;
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('c') {
                self.quit = true;
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Tab => self.switch_tab(self.tab.step(1)),
            KeyCode::BackTab => self.switch_tab(self.tab.step(-1)),
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                self.switch_tab(Tab::ALL[idx]);
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Left => self.on_horizontal(-1),
            KeyCode::Right => self.on_horizontal(1),
            KeyCode::Enter => self.on_enter(),
            KeyCode::Char(ch) => {
                if let Some(action) = self.keymap.get(&ch).copied() {
                    self.apply_action(action);
                }
            }
            _ => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if self.tab == tab {
            return;
        }
        self.tab = tab;
        match tab {
            Tab::Review => {
                if let Some(id) = self.notebook {
                    self.dispatch.submit(Request::Words(DeckSource::WrongOnly, id));
                }
            }
            Tab::History => self.load_history(),
            _ => {}
        }
    }

    fn load_history(&mut self) {
        self.dispatch.submit(Request::DailyStats(self.history_days()));
    }

    fn move_selection(&mut self, delta: isize) {
        match (self.tab, self.focus) {
            (Tab::Manage, Focus::Notebooks) => {
                step_list(&mut self.notebook_state, self.notebooks.len(), delta)
            }
            (Tab::Manage, Focus::Words) => {
                step_list(&mut self.word_state, self.cards.words().len(), delta)
            }
            (Tab::Settings, _) => {
                let i = self.settings_field as isize + delta;
                self.settings_field = i.clamp(0, SETTINGS_FIELDS as isize - 1) as usize;
            }
            _ => {}
        }
    }

    fn on_horizontal(&mut self, delta: isize) {
        match self.tab {
            Tab::Manage => {
                self.focus = if delta < 0 {
                    Focus::Notebooks
                } else {
                    Focus::Words
                }
            }
            Tab::Cards | Tab::Review => {
                if let Some(deck) = self.active_deck_mut() {
                    if delta < 0 {
                        deck.previous();
                    } else {
                        deck.next();
                    }
                }
            }
            Tab::History => self.apply_action(if delta < 0 {
                KeyAction::HistoryShorter
            } else {
                KeyAction::HistoryLonger
            }),
            Tab::Settings => self.edit_setting(),
        }
    }

    fn on_enter(&mut self) {
        match self.tab {
            Tab::Manage if self.focus == Focus::Notebooks => {
                let picked = self
                    .notebook_state
                    .selected()
                    .and_then(|i| self.notebooks.get(i))
                    .map(|n| n.id);
                if let Some(id) = picked {
                    self.select_notebook(id);
                    self.focus = Focus::Words;
                }
            }
            Tab::Cards | Tab::Review => {
                if let Some(deck) = self.active_deck_mut() {
                    deck.flip();
                }
            }
            Tab::Settings => self.edit_setting(),
            _ => {}
        }
    }

    fn edit_setting(&mut self) {
        let d = &mut self.settings_draft;
        match self.settings_field {
            0 => d.exclude_mastered = !d.exclude_mastered,
            1 => d.default_direction = d.default_direction.toggled(),
            2 => d.default_order = d.default_order.toggled(),
            _ => d.card_colors.front = next_preset(&d.card_colors.front).to_string(),
        }
    }

    pub fn apply_action(&mut self, action: KeyAction) {
        use KeyAction::*;
        match action {
            Flip => {
                if let Some(deck) = self.active_deck_mut() {
                    deck.toggle_flip();
                }
            }
            PrevCard => {
                if let Some(deck) = self.active_deck_mut() {
                    deck.previous();
                }
            }
            NextCard => {
                if let Some(deck) = self.active_deck_mut() {
                    deck.next();
                }
            }
            ToggleDirection => {
                if let Some(deck) = self.active_deck_mut() {
                    let d = deck.direction().toggled();
                    deck.set_direction(d);
                }
            }
            ToggleOrder => {
                if let Some(deck) = self.active_deck_mut() {
                    let o = deck.policy().order.toggled();
                    deck.set_order(o);
                }
            }
            ResetCard => {
                if let Some(deck) = self.active_deck_mut() {
                    deck.reset_card();
                }
            }
            MarkCorrect => self.judge(Judgment::Correct),
            MarkWrong => self.judge(Judgment::Wrong),
            ToggleMastered => {
                let mastered = self.active_deck().and_then(|d| d.current()).map(|w| w.mastered);
                match mastered {
                    Some(true) => self.judge(Judgment::Unmaster),
                    Some(false) => self.judge(Judgment::Master),
                    None => {}
                }
            }
            StartSession => self.start_session(),
            EndSession => self.end_session(),
            AddWord => {
                if self.require_notebook().is_some() {
                    self.overlay = Some(Overlay::Prompt(Prompt::new(
                        PromptKind::WordTerm { editing: None },
                        "",
                    )));
                }
            }
            EditWord => {
                if let Some(w) = self.word_under_cursor() {
                    let prompt = Prompt::new(PromptKind::WordTerm { editing: Some(w.id) }, w.word);
                    self.overlay = Some(Overlay::Prompt(prompt));
                }
            }
            DeleteWord => {
                if let (Some(nb), Some(w)) = (self.notebook, self.word_under_cursor()) {
                    self.overlay = Some(Overlay::Confirm(Confirm {
                        message: format!("Delete \"{}\"?", w.word),
                        action: ConfirmAction::DeleteWord(nb, w.id),
                    }));
                }
            }
            NewNotebook => {
                self.overlay = Some(Overlay::Prompt(Prompt::new(PromptKind::NewNotebook, "")));
            }
            RenameNotebook => {
                let prompt = self
                    .current_notebook()
                    .map(|nb| Prompt::new(PromptKind::RenameNotebook(nb.id), nb.name.clone()));
                if let Some(p) = prompt {
                    self.overlay = Some(Overlay::Prompt(p));
                }
            }
            DeleteNotebook => {
                let confirm = self.current_notebook().map(|nb| Confirm {
                    message: format!("Delete notebook \"{}\" and all its words?", nb.name),
                    action: ConfirmAction::DeleteNotebook(nb.id),
                });
                if let Some(c) = confirm {
                    self.overlay = Some(Overlay::Confirm(c));
                }
            }
            Import => {
                if self.require_notebook().is_some() {
                    self.overlay = Some(Overlay::Import(ImportDraft::new()));
                }
            }
            Search => {
                self.overlay = Some(Overlay::Prompt(Prompt::new(PromptKind::Search, "")));
            }
            Reload => {
                self.dispatch.submit(Request::Notebooks);
                if let Some(id) = self.notebook {
                    self.dispatch.submit(Request::Settings(id));
                }
                self.load_words();
                if self.tab == Tab::History {
                    self.load_history();
                }
            }
            SaveSettings => {
                if self.tab == Tab::Settings {
                    if let Some(id) = self.require_notebook() {
                        let draft = self.settings_draft.clone();
                        self.dispatch.submit(Request::SaveSettings(id, draft));
                    }
                }
            }
            ResetProgress => {
                let confirm = self.current_notebook().map(|nb| Confirm {
                    message: format!(
                        "Reset all progress in \"{}\"? Counters and mastery are cleared.",
                        nb.name
                    ),
                    action: ConfirmAction::ResetProgress(nb.id),
                });
                if let Some(c) = confirm {
                    self.overlay = Some(Overlay::Confirm(c));
                }
            }
            HistoryShorter | HistoryLonger => {
                if self.tab == Tab::History {
                    let last = HISTORY_WINDOWS.len() - 1;
                    self.history_window = if action == HistoryShorter {
                        self.history_window.saturating_sub(1)
                    } else {
                        (self.history_window + 1).min(last)
                    };
                    self.load_history();
                }
            }
        }
    }

    fn require_notebook(&mut self) -> Option<NotebookId> {
        if self.notebook.is_none() {
            self.notify("Select or create a notebook first".into());
        }
        self.notebook
    }

    /// Word picked in the Manage list, or the card on screen elsewhere.
    fn word_under_cursor(&self) -> Option<Word> {
        match self.tab {
            Tab::Manage => self.selected_word().cloned(),
            _ => self.active_deck().and_then(|d| d.current()).cloned(),
        }
    }

    fn judge(&mut self, judgment: Judgment) {
        let Some((flipped, source)) = self.active_deck().map(|d| (d.is_flipped(), d.source()))
        else {
            return;
        };
        if judgment.advances() && !flipped {
            self.status = Some("Flip the card before grading it".into());
            return;
        }
        if let Some(pj) = self.deck_mut(source).judge(judgment, Instant::now()) {
            self.dispatch.submit(Request::Progress(source, pj));
        }
    }

    fn start_session(&mut self) {
        if let Err(e) = self.tracker.ensure_idle() {
            self.notify(e.to_string());
            return;
        }
        if !self.session_request {
            self.session_request = true;
            self.dispatch.submit(Request::StartSession(Utc::now()));
        }
    }

    fn end_session(&mut self) {
        if self.session_request {
            return;
        }
        match self.tracker.report(Instant::now(), Utc::now()) {
            Ok((id, report)) => {
                self.session_request = true;
                self.dispatch.submit(Request::EndSession(id, report));
            }
            Err(e) => self.notify(e.to_string()),
        }
    }

    // ---------------- overlay keys ----------------

    fn handle_overlay_key(&mut self, overlay: Overlay, key: KeyEvent) {
        match overlay {
            Overlay::Prompt(mut p) => match handle_prompt_key(&mut p, &key) {
                PromptOutcome::Editing => self.overlay = Some(Overlay::Prompt(p)),
                PromptOutcome::Cancel => {}
                PromptOutcome::Submit => self.submit_prompt(p),
            },
            Overlay::Confirm(c) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.confirm(c.action),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {}
                _ => self.overlay = Some(Overlay::Confirm(c)),
            },
            Overlay::Import(mut draft) => {
                match (key.code, key.modifiers) {
                    (KeyCode::Esc, _) => return,
                    (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
                        if !draft.submitting {
                            self.submit_import(&mut draft);
                        }
                    }
                    _ => {
                        if !draft.submitting && draft.textarea.input(key) {
                            draft.refresh();
                        }
                    }
                }
                self.overlay = Some(Overlay::Import(draft));
            }
            Overlay::Search(mut view) => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => {}
                KeyCode::Down | KeyCode::Char('j') => {
                    let n = view.hits.as_ref().map_or(0, Vec::len);
                    step_list(&mut view.state, n, 1);
                    self.overlay = Some(Overlay::Search(view));
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    let n = view.hits.as_ref().map_or(0, Vec::len);
                    step_list(&mut view.state, n, -1);
                    self.overlay = Some(Overlay::Search(view));
                }
                KeyCode::Enter => {
                    let hit = view
                        .state
                        .selected()
                        .and_then(|i| view.hits.as_ref()?.get(i))
                        .map(|h| (h.notebook_id, h.id));
                    match hit {
                        Some((nb, word)) => self.jump_to(nb, word),
                        None => self.overlay = Some(Overlay::Search(view)),
                    }
                }
                _ => self.overlay = Some(Overlay::Search(view)),
            },
        }
    }

    fn jump_to(&mut self, notebook: NotebookId, word: WordId) {
        self.tab = Tab::Manage;
        self.focus = Focus::Words;
        self.focus_word = Some(word);
        if self.notebook == Some(notebook) {
            self.sync_word_state();
        } else {
            self.select_notebook(notebook);
        }
    }

    fn submit_prompt(&mut self, p: Prompt) {
        let text = p.buffer.trim().to_string();
        if text.is_empty() && p.kind != PromptKind::Search {
            // nothing typed yet: keep asking
            self.overlay = Some(Overlay::Prompt(p));
            return;
        }
        match p.kind {
            PromptKind::NewNotebook => self.dispatch.submit(Request::CreateNotebook(text)),
            PromptKind::RenameNotebook(id) => self.dispatch.submit(Request::RenameNotebook(id, text)),
            PromptKind::WordTerm { editing } => {
                let meaning = editing
                    .and_then(|id| self.cards.words().iter().find(|w| w.id == id))
                    .map(|w| w.meaning.clone())
                    .unwrap_or_default();
                self.overlay = Some(Overlay::Prompt(Prompt::new(
                    PromptKind::WordMeaning {
                        editing,
                        word: text,
                    },
                    meaning,
                )));
            }
            PromptKind::WordMeaning { editing, word } => {
                let Some(notebook_id) = self.require_notebook() else {
                    return;
                };
                let draft = WordDraft {
                    word,
                    meaning: text,
                    notebook_id,
                };
                match editing {
                    Some(id) => self.dispatch.submit(Request::UpdateWord(id, draft)),
                    None => self.dispatch.submit(Request::CreateWord(draft)),
                }
            }
            PromptKind::Search => {
                if text.is_empty() {
                    return;
                }
                self.overlay = Some(Overlay::Search(SearchView {
                    query: text.clone(),
                    hits: None,
                    state: ListState::default(),
                }));
                self.dispatch.submit(Request::Search(text));
            }
        }
    }

    fn confirm(&mut self, action: ConfirmAction) {
        let req = match action {
            ConfirmAction::DeleteNotebook(id) => Request::DeleteNotebook(id),
            ConfirmAction::DeleteWord(nb, id) => Request::DeleteWord(nb, id),
            ConfirmAction::ResetProgress(id) => Request::ResetProgress(id),
        };
        self.dispatch.submit(req);
    }

    fn submit_import(&mut self, draft: &mut ImportDraft) {
        let text = draft.text();
        draft.refresh();
        match check_submittable(self.notebook, &text, &draft.preview) {
            Ok(nb) => {
                draft.submitting = true;
                self.dispatch.submit(Request::Import(nb, text));
            }
            Err(reason) => self.notify(reason.to_string()),
        }
    }
}

fn step_list(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match state.selected() {
        Some(i) => (i as isize + delta).clamp(0, len as isize - 1) as usize,
        None => 0,
    };
    state.select(Some(next));
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::default_keymap;
    use crate::deck::PendingJudgment;
    use crate::model::{ImportResult, StudySession};
    use crate::ui::{theme_of, ThemeKind};

    #[derive(Default, Clone)]
    struct Recorder {
        sent: Rc<RefCell<Vec<Request>>>,
    }

    impl Dispatch for Recorder {
        fn submit(&mut self, req: Request) {
            self.sent.borrow_mut().push(req);
        }

        fn poll(&mut self) -> Vec<ApiEvent> {
            Vec::new()
        }
    }

    fn app() -> (App, Rc<RefCell<Vec<Request>>>) {
        let rec = Recorder::default();
        let sent = rec.sent.clone();
        let app = App::new(
            theme_of(ThemeKind::Dark),
            default_keymap(),
            Duration::from_millis(300),
            None,
            Box::new(rec),
        );
        (app, sent)
    }

    fn nb(id: NotebookId, name: &str) -> Notebook {
        Notebook {
            id,
            name: name.into(),
            created_at: None,
        }
    }

    fn word(id: WordId, text: &str) -> Word {
        Word {
            id,
            word: text.into(),
            meaning: format!("{text}-m"),
            notebook_id: 1,
            correct_count: 0,
            wrong_count: 0,
            mastered: false,
            last_studied: None,
        }
    }

    fn study_session(id: i64) -> StudySession {
        StudySession {
            id,
            correct_count: 0,
            wrong_count: 0,
            words_studied: 0,
            duration_seconds: None,
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn status_err() -> ApiError {
        ApiError::Status {
            status: 500,
            detail: Some("boom".into()),
        }
    }

    /// App with notebook 1 open and three words loaded in the Cards deck.
    fn loaded() -> (App, Rc<RefCell<Vec<Request>>>) {
        let (mut app, sent) = app();
        app.handle_event(ApiEvent::Notebooks(Ok(vec![nb(1, "verbs"), nb(2, "nouns")])));
        app.handle_event(ApiEvent::Words(
            DeckSource::All,
            1,
            Ok(vec![word(1, "apple"), word(2, "dog"), word(3, "cat")]),
        ));
        sent.borrow_mut().clear();
        (app, sent)
    }

    #[test]
    fn first_notebook_is_opened_on_load() {
        let (mut app, sent) = app();
        app.start();
        app.handle_event(ApiEvent::Notebooks(Ok(vec![nb(7, "a"), nb(8, "b")])));
        assert_eq!(app.notebook, Some(7));
        assert_eq!(app.notebook_state.selected(), Some(0));
        let sent = sent.borrow();
        assert!(matches!(sent[0], Request::Notebooks));
        assert!(matches!(sent[1], Request::Settings(7)));
        assert!(matches!(sent[2], Request::Words(DeckSource::All, 7)));
        assert!(matches!(sent[3], Request::Words(DeckSource::WrongOnly, 7)));
    }

    #[test]
    fn preferred_notebook_wins_when_present() {
        let rec = Recorder::default();
        let mut app = App::new(
            theme_of(ThemeKind::Light),
            default_keymap(),
            Duration::from_millis(300),
            Some(8),
            Box::new(rec),
        );
        app.handle_event(ApiEvent::Notebooks(Ok(vec![nb(7, "a"), nb(8, "b")])));
        assert_eq!(app.notebook, Some(8));
        assert_eq!(app.notebook_state.selected(), Some(1));
    }

    #[test]
    fn responses_for_other_notebooks_are_dropped() {
        let (mut app, _) = loaded();
        app.handle_event(ApiEvent::Words(DeckSource::All, 2, Ok(vec![word(9, "zzz")])));
        assert_eq!(app.cards.len(), 3);
        let s = NotebookSettings {
            exclude_mastered: true,
            ..NotebookSettings::default()
        };
        app.handle_event(ApiEvent::Settings(2, Ok(s)));
        assert!(!app.settings.exclude_mastered);
    }

    #[test]
    fn confirmed_correct_counts_and_advances() {
        let (mut app, sent) = loaded();
        press(&mut app, KeyCode::Char('c'));
        // grading needs the answer visible
        assert!(sent.borrow().is_empty());
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('c'));
        let pj = match sent.borrow().as_slice() {
            [Request::Progress(DeckSource::All, pj)] => *pj,
            other => panic!("unexpected requests: {other:?}"),
        };
        assert_eq!(
            pj,
            PendingJudgment {
                word_id: 1,
                judgment: Judgment::Correct
            }
        );
        let mut updated = word(1, "apple");
        updated.correct_count = 1;
        app.handle_event(ApiEvent::Progress(DeckSource::All, pj, Ok(updated)));
        assert_eq!(app.tracker.counters().correct, 1);
        assert_eq!(app.tracker.counters().studied, 1);
        assert_eq!(app.cards.words()[0].correct_count, 1);
        app.tick(Instant::now() + Duration::from_secs(1));
        assert_eq!(app.cards.cursor(), Some(1));
        assert!(!app.cards.is_flipped());
    }

    #[test]
    fn failed_progress_notifies_without_counting() {
        let (mut app, _) = loaded();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('x'));
        let pj = PendingJudgment {
            word_id: 1,
            judgment: Judgment::Wrong,
        };
        app.handle_event(ApiEvent::Progress(DeckSource::All, pj, Err(status_err())));
        assert_eq!(app.tracker.counters().wrong, 0);
        assert_eq!(app.notices.len(), 1);
        assert!(app.notices[0].contains("boom"));
        app.tick(Instant::now() + Duration::from_secs(1));
        assert_eq!(app.cards.cursor(), Some(0));
    }

    #[test]
    fn mastery_toggle_neither_counts_nor_advances() {
        let (mut app, sent) = loaded();
        press(&mut app, KeyCode::Char('m'));
        let pj = match sent.borrow().as_slice() {
            [Request::Progress(_, pj)] => *pj,
            other => panic!("unexpected requests: {other:?}"),
        };
        assert_eq!(pj.judgment, Judgment::Master);
        let mut updated = word(1, "apple");
        updated.mastered = true;
        app.handle_event(ApiEvent::Progress(DeckSource::All, pj, Ok(updated)));
        assert_eq!(app.tracker.counters(), Default::default());
        app.tick(Instant::now() + Duration::from_secs(1));
        assert_eq!(app.cards.cursor(), Some(0));
        assert!(app.cards.current().is_some_and(|w| w.mastered));
    }

    #[test]
    fn notices_block_other_keys_until_dismissed() {
        let (mut app, _) = loaded();
        app.handle_event(ApiEvent::Search("x".into(), Err(status_err())));
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.cards.cursor(), Some(0));
        press(&mut app, KeyCode::Enter);
        assert!(app.notices.is_empty());
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.cards.cursor(), Some(1));
    }

    #[test]
    fn deleting_open_notebook_moves_to_first_remaining() {
        let (mut app, sent) = loaded();
        app.handle_event(ApiEvent::NotebookDeleted(1, Ok(())));
        assert_eq!(app.notebook, Some(2));
        assert!(app.cards.is_empty());
        assert!(sent
            .borrow()
            .iter()
            .any(|r| matches!(r, Request::Words(DeckSource::All, 2))));
        app.handle_event(ApiEvent::NotebookDeleted(2, Ok(())));
        assert_eq!(app.notebook, None);
        assert!(app.notebooks.is_empty());
        assert!(app.cards.words().is_empty());
    }

    #[test]
    fn created_word_rebuilds_deck_and_gets_selected() {
        let (mut app, _) = loaded();
        app.handle_event(ApiEvent::WordCreated(Ok(word(4, "owl"))));
        assert_eq!(app.cards.len(), 4);
        assert_eq!(app.selected_word().map(|w| w.id), Some(4));
        app.handle_event(ApiEvent::WordDeleted(1, 4, Ok(())));
        assert_eq!(app.cards.len(), 3);
        assert_eq!(app.word_state.selected(), Some(2));
    }

    #[test]
    fn adding_a_word_walks_term_then_meaning() {
        let (mut app, sent) = loaded();
        press(&mut app, KeyCode::Char('a'));
        for ch in "owl".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Enter);
        for ch in "フクロウ".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.overlay.is_none());
        match sent.borrow().as_slice() {
            [Request::CreateWord(d)] => {
                assert_eq!(d.word, "owl");
                assert_eq!(d.meaning, "フクロウ");
                assert_eq!(d.notebook_id, 1);
            }
            other => panic!("unexpected requests: {other:?}"),
        };
    }

    #[test]
    fn import_without_valid_lines_is_refused_locally() {
        let (mut app, sent) = loaded();
        press(&mut app, KeyCode::Char('i'));
        for ch in "nope".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(sent.borrow().is_empty());
        assert_eq!(app.notices.front().map(String::as_str), Some("no valid lines to import"));
    }

    #[test]
    fn successful_import_closes_dialog_and_reloads() {
        let (mut app, sent) = loaded();
        press(&mut app, KeyCode::Char('i'));
        for ch in "- owl: フクロウ".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(matches!(sent.borrow().as_slice(), [Request::Import(1, _)]));
        app.handle_event(ApiEvent::Imported(
            1,
            Ok(ImportResult {
                added_count: 1,
                skipped_count: 0,
            }),
        ));
        assert!(app.overlay.is_none());
        assert_eq!(app.status.as_deref(), Some("Imported 1 words (0 skipped)"));
        assert!(matches!(sent.borrow().last(), Some(Request::Words(DeckSource::WrongOnly, 1))));
    }

    #[test]
    fn second_session_start_is_rejected() {
        let (mut app, sent) = loaded();
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(sent.borrow().len(), 1);
        app.handle_event(ApiEvent::SessionStarted(Ok(study_session(3))));
        assert_eq!(app.tracker.session_id(), Some(3));
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(sent.borrow().len(), 1);
        assert_eq!(app.notices.len(), 1);
    }

    #[test]
    fn settings_edits_apply_after_save() {
        let (mut app, sent) = loaded();
        app.switch_tab(Tab::Settings);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('w'));
        let saved = match sent.borrow().as_slice() {
            [Request::SaveSettings(1, s)] => s.clone(),
            other => panic!("unexpected requests: {other:?}"),
        };
        assert!(saved.exclude_mastered);
        assert!(!app.settings.exclude_mastered);
        app.handle_event(ApiEvent::SettingsSaved(1, Ok(saved)));
        assert!(app.settings.exclude_mastered);
        assert!(app.cards.policy().exclude_mastered);
    }

    fn wrong(id: WordId, text: &str, wrong_count: u32) -> Word {
        let mut w = word(id, text);
        w.wrong_count = wrong_count;
        w
    }

    /// `loaded()` plus dog and cat in the wrong-only list.
    fn with_review() -> (App, Rc<RefCell<Vec<Request>>>) {
        let (mut app, sent) = loaded();
        app.handle_event(ApiEvent::Words(
            DeckSource::WrongOnly,
            1,
            Ok(vec![wrong(2, "dog", 1), wrong(3, "cat", 2)]),
        ));
        (app, sent)
    }

    #[test]
    fn opening_review_refetches_wrong_only_words() {
        let (mut app, sent) = with_review();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.tab, Tab::Review);
        assert!(matches!(
            sent.borrow().as_slice(),
            [Request::Words(DeckSource::WrongOnly, 1)]
        ));
        assert_eq!(app.review.len(), 2);
    }

    #[test]
    fn review_judgment_goes_to_wrong_only_and_patches_cards() {
        let (mut app, sent) = with_review();
        app.switch_tab(Tab::Review);
        sent.borrow_mut().clear();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('c'));
        let pj = match sent.borrow().as_slice() {
            [Request::Progress(DeckSource::WrongOnly, pj)] => *pj,
            other => panic!("unexpected requests: {other:?}"),
        };
        assert_eq!(pj.word_id, 2);
        assert_eq!(pj.judgment, Judgment::Correct);

        let mut updated = wrong(2, "dog", 1);
        updated.correct_count = 1;
        app.handle_event(ApiEvent::Progress(DeckSource::WrongOnly, pj, Ok(updated)));
        assert_eq!(app.review.current().map(|w| w.correct_count), Some(1));
        let dog = app.cards.words().iter().find(|w| w.id == 2);
        assert_eq!(dog.map(|w| w.correct_count), Some(1));
        assert_eq!(app.cards.cursor(), Some(0));
        assert_eq!(app.tracker.counters().correct, 1);

        app.tick(Instant::now() + Duration::from_secs(1));
        assert_eq!(app.review.cursor(), Some(1));
    }

    #[test]
    fn review_cursor_survives_a_patch() {
        let (mut app, _) = with_review();
        app.switch_tab(Tab::Review);
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.review.current().map(|w| w.id), Some(3));
        let mut cat = wrong(3, "cat", 2);
        cat.meaning = "ネコ".into();
        app.handle_event(ApiEvent::WordUpdated(Ok(cat)));
        assert_eq!(app.review.cursor(), Some(1));
        assert_eq!(app.review.current().map(|w| w.meaning.as_str()), Some("ネコ"));
    }

    #[test]
    fn exclude_mastered_leaves_review_deck_whole() {
        let (mut app, _) = loaded();
        let mut apple = wrong(1, "apple", 2);
        apple.mastered = true;
        app.handle_event(ApiEvent::Words(
            DeckSource::WrongOnly,
            1,
            Ok(vec![apple, wrong(2, "dog", 1)]),
        ));
        let s = NotebookSettings {
            exclude_mastered: true,
            ..NotebookSettings::default()
        };
        app.handle_event(ApiEvent::Settings(1, Ok(s)));
        assert!(app.cards.policy().exclude_mastered);
        assert_eq!(app.review.len(), 2);
    }

    #[test]
    fn ending_a_session_clears_the_reported_counters() {
        let (mut app, sent) = loaded();
        press(&mut app, KeyCode::Char('s'));
        app.handle_event(ApiEvent::SessionStarted(Ok(study_session(4))));
        let pj = PendingJudgment {
            word_id: 1,
            judgment: Judgment::Correct,
        };
        app.handle_event(ApiEvent::Progress(DeckSource::All, pj, Ok(word(1, "apple"))));
        sent.borrow_mut().clear();
        press(&mut app, KeyCode::Char('S'));
        match sent.borrow().as_slice() {
            [Request::EndSession(4, report)] => {
                assert_eq!(report.correct_count, 1);
                assert_eq!(report.words_studied, 1);
            }
            other => panic!("unexpected requests: {other:?}"),
        };
        app.handle_event(ApiEvent::SessionEnded(Ok(study_session(4))));
        assert!(!app.tracker.is_active());
        assert_eq!(app.tracker.counters(), Default::default());
    }

    #[test]
    fn judgment_confirmed_while_ending_is_kept() {
        let (mut app, sent) = loaded();
        press(&mut app, KeyCode::Char('s'));
        app.handle_event(ApiEvent::SessionStarted(Ok(study_session(4))));
        sent.borrow_mut().clear();
        press(&mut app, KeyCode::Char('S'));
        assert!(matches!(
            sent.borrow().as_slice(),
            [Request::EndSession(4, r)] if r.words_studied == 0
        ));
        let pj = PendingJudgment {
            word_id: 2,
            judgment: Judgment::Correct,
        };
        app.handle_event(ApiEvent::Progress(DeckSource::All, pj, Ok(word(2, "dog"))));
        app.handle_event(ApiEvent::SessionEnded(Ok(study_session(4))));
        assert!(!app.tracker.is_active());
        assert_eq!(app.tracker.counters().correct, 1);
        assert_eq!(app.tracker.counters().studied, 1);
    }

    #[test]
    fn prompt_editing_is_char_aware() {
        let mut p = Prompt::new(PromptKind::Search, "りんご");
        let key = |c| KeyEvent::new(c, KeyModifiers::NONE);
        handle_prompt_key(&mut p, &key(KeyCode::Left));
        handle_prompt_key(&mut p, &key(KeyCode::Backspace));
        assert_eq!(p.buffer, "りご");
        handle_prompt_key(&mut p, &key(KeyCode::Char('x')));
        assert_eq!(p.buffer, "りxご");
        assert_eq!(handle_prompt_key(&mut p, &key(KeyCode::Esc)), PromptOutcome::Cancel);
    }
}
