//! bup-tui - terminal front end for campus facilities issues

use anyhow::{Context, Result};
use bup_core::theme::EnvSystemTheme;
use bup_core::{Config, HttpTransport, Section, Storage};
use clap::Parser;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

mod app;
mod palette;
mod ui;

use app::{App, parse_key_action};

#[derive(Parser)]
#[command(name = "bup-tui")]
#[command(about = "Terminal front end for campus facilities issues")]
#[command(version)]
struct Cli {
    /// Section to open first (home, dashboard, reports, moderator, schedule, chat)
    #[arg(short, long, default_value = "home")]
    section: String,

    /// Config file (defaults to $BUP_CONFIG or the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// The screen belongs to the UI, so logs go to a file
fn init_tracing(log_file: File) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
}

fn open_log() -> Result<File> {
    let dir = bup_core::config::state_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Could not create {}", dir.display()))?;
    let path = dir.join("bup-tui.log");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Could not open {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let start: Section = cli.section.parse()?;

    init_tracing(open_log()?);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    let storage = Arc::new(Storage::open_default()?);
    let transport = Arc::new(HttpTransport::new(&config));

    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let mut app = App::new(config, storage, transport, Arc::new(EnvSystemTheme), start);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    app.refresh.stop();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("{:?}", err);
        eprintln!("{:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();
    const TICK_RATE: Duration = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key_action(parse_key_action(key)) {
                        return Ok(());
                    }
                }
                Event::FocusGained => app.set_focused(true),
                Event::FocusLost => app.set_focused(false),
                _ => {}
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}
