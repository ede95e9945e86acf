// vocadeck: flash-card trainer for a vocabulary-notebook backend.
// - notebooks and words are managed over the backend's REST API
// - Cards tab studies the whole notebook, Review tab only words answered wrong
// - study sessions and daily history are reported back to the backend

mod api;
mod app;
mod config;
mod deck;
mod import;
mod model;
mod session;
mod stats;
mod ui;
mod worker;

use std::{
    fs::OpenOptions,
    io,
    path::Path,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::api::ApiClient;
use crate::app::App;
use crate::config::{default_log_path, Cli, Config};
use crate::ui::{theme_of, ui};
use crate::worker::Worker;

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file: {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&default_log_path(&cli))?;
    let config = Config::load(&cli)?;
    let client = ApiClient::new(&config.api_url, config.timeout)
        .with_context(|| format!("bad API url: {}", config.api_url))?;
    info!("backend: {}", client.base_url());

    let mut app = App::new(
        theme_of(config.theme),
        config.keymap,
        config.advance_delay,
        config.notebook,
        Box::new(Worker::new(client)),
    );
    app.start();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.tick(Instant::now());
        terminal.draw(|f| ui(f, app))?;
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press {
                    app.handle_key(k);
                }
            }
        }
        if app.quit {
            info!("bye");
            return Ok(());
        }
    }
}
