// Command line, vocadeck.toml and the key map.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use serde::Deserialize;

use crate::api::DEFAULT_API_URL;
use crate::app::KeyAction;
use crate::deck::DEFAULT_ADVANCE_DELAY;
use crate::model::NotebookId;
use crate::ui::ThemeKind;

pub const CONFIG_FILE: &str = "vocadeck.toml";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Parser)]
#[command(name = "vocadeck", about = "Flash-card trainer for vocabulary notebooks", version)]
pub struct Cli {
    /// Backend base URL; falls back to VOCADECK_API_URL, then the config file
    #[arg(long)]
    pub api_url: Option<String>,

    /// Config file; defaults to VOCADECK_CONFIG or the nearest vocadeck.toml
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Appearance: dark | light
    #[arg(long, value_enum)]
    pub theme: Option<ThemeKind>,

    /// Log file; defaults to VOCADECK_LOG_FILE or vocadeck.log in the temp dir
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Notebook to open on start
    #[arg(long, short = 'n')]
    pub notebook: Option<NotebookId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub theme: Option<ThemeKind>,
    pub advance_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub keys: HashMap<String, String>,
}

/// Everything the program needs after merging CLI, environment and file.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub theme: ThemeKind,
    pub advance_delay: Duration,
    pub timeout: Duration,
    pub keymap: HashMap<char, KeyAction>,
    pub notebook: Option<NotebookId>,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match config_path(cli) {
            Some(p) => read_file_config(&p)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(
            cli,
            std::env::var("VOCADECK_API_URL").ok(),
            file,
        ))
    }

    /// Precedence: command line, then environment, then file, then default.
    pub fn resolve(cli: &Cli, env_api_url: Option<String>, file: FileConfig) -> Self {
        let api_url = cli
            .api_url
            .clone()
            .or(env_api_url.filter(|s| !s.trim().is_empty()))
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let keymap = if file.keys.is_empty() {
            default_keymap()
        } else {
            parse_keymap(file.keys)
        };
        Self {
            api_url,
            theme: cli.theme.or(file.theme).unwrap_or(ThemeKind::Dark),
            advance_delay: file
                .advance_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_ADVANCE_DELAY),
            timeout: file
                .timeout_secs
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            keymap,
            notebook: cli.notebook,
        }
    }
}

fn config_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(p) = &cli.config {
        return Some(p.clone());
    }
    if let Ok(envp) = std::env::var("VOCADECK_CONFIG") {
        return Some(PathBuf::from(envp));
    }
    let cwd = std::env::current_dir().ok()?;
    find_upwards(&cwd, CONFIG_FILE)
}

/// First `name` found in `start` or any of its ancestors.
pub fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|anc| anc.join(name))
        .find(|c| c.is_file())
}

pub fn read_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse config: {}", path.display()))
}

pub fn default_log_path(cli: &Cli) -> PathBuf {
    if let Some(p) = &cli.log_file {
        return p.clone();
    }
    if let Ok(envp) = std::env::var("VOCADECK_LOG_FILE") {
        return PathBuf::from(envp);
    }
    std::env::temp_dir().join("vocadeck.log")
}

// ---------------- Keymap ----------------

/// Quit, list movement and tab jumps; handled before the key map.
pub const RESERVED_KEYS: [char; 8] = ['q', 'j', 'k', '1', '2', '3', '4', '5'];

/// Overrides from `[keys]` on top of the defaults. Each action keeps one key.
/// An entry is skipped with a warning when it is not a single character,
/// names no known action, uses a reserved key, or takes the default key of
/// an action that is not rebound itself.
pub fn parse_keymap(map: HashMap<String, String>) -> HashMap<char, KeyAction> {
    let defaults = default_keymap();
    let mut entries: Vec<(char, KeyAction)> = Vec::new();
    for (k, v) in map {
        let mut chars = k.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            warn!("[keys] {k:?}: expected a single character");
            continue;
        };
        if RESERVED_KEYS.contains(&ch) {
            warn!("[keys] {k:?} is reserved");
            continue;
        }
        let Some(act) = action_from_str(&v) else {
            warn!("[keys] {k:?}: unknown action {v:?}");
            continue;
        };
        entries.push((ch, act));
    }
    entries.sort_by_key(|(ch, _)| *ch);

    let mut out: HashMap<char, KeyAction> = HashMap::new();
    for &(ch, act) in &entries {
        if out.values().any(|a| *a == act) {
            warn!("[keys] {act:?} is bound twice, keeping the first key");
            continue;
        }
        if let Some(owner) = defaults.get(&ch) {
            let rebound = entries.iter().any(|(_, a)| a == owner);
            if *owner != act && !rebound {
                warn!("[keys] '{ch}' already runs {owner:?}");
                continue;
            }
        }
        out.insert(ch, act);
    }
    for (ch, act) in defaults {
        if out.values().any(|a| *a == act) {
            continue;
        }
        match out.get(&ch) {
            Some(taken) => warn!("{act:?} lost its key '{ch}' to {taken:?}"),
            None => {
                out.insert(ch, act);
            }
        }
    }
    out
}

pub fn action_from_str(s: &str) -> Option<KeyAction> {
    use KeyAction::*;
    Some(match s {
        "flip" => Flip,
        "prev_card" => PrevCard,
        "next_card" => NextCard,
        "toggle_direction" => ToggleDirection,
        "toggle_order" => ToggleOrder,
        "reset_card" => ResetCard,
        "mark_correct" => MarkCorrect,
        "mark_wrong" => MarkWrong,
        "toggle_mastered" => ToggleMastered,
        "start_session" => StartSession,
        "end_session" => EndSession,
        "add_word" => AddWord,
        "edit_word" => EditWord,
        "delete_word" => DeleteWord,
        "new_notebook" => NewNotebook,
        "rename_notebook" => RenameNotebook,
        "delete_notebook" => DeleteNotebook,
        "import" => Import,
        "search" => Search,
        "reload" => Reload,
        "save_settings" => SaveSettings,
        "reset_progress" => ResetProgress,
        "history_shorter" => HistoryShorter,
        "history_longer" => HistoryLonger,
        _ => return None,
    })
}

pub fn default_keymap() -> HashMap<char, KeyAction> {
    use KeyAction::*;
    HashMap::from([
        (' ', Flip),
        ('h', PrevCard),
        ('l', NextCard),
        ('d', ToggleDirection),
        ('o', ToggleOrder),
        ('r', ResetCard),
        ('c', MarkCorrect),
        ('x', MarkWrong),
        ('m', ToggleMastered),
        ('s', StartSession),
        ('S', EndSession),
        ('a', AddWord),
        ('e', EditWord),
        ('D', DeleteWord),
        ('N', NewNotebook),
        ('E', RenameNotebook),
        ('X', DeleteNotebook),
        ('i', Import),
        ('/', Search),
        ('R', Reload),
        ('w', SaveSettings),
        ('P', ResetProgress),
        ('[', HistoryShorter),
        (']', HistoryLonger),
    ])
}
