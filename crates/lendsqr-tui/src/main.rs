//! Lendsqr Admin TUI - a terminal dashboard over cached Lendsqr user records.
//!
//! The user collection is fetched once, kept in an expiring cache on disk,
//! and shared with every other running instance that points at the same
//! cache directory.

mod app;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lendsqr_core::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside the cache directory
const LOG_FILE_NAME: &str = "lendsqr.log";

/// Initialize the tracing subscriber for logging.
///
/// The terminal is owned by the UI, so logs go to a daily file in the cache
/// directory. The returned guard flushes the writer and must outlive the app.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config.cache_dir().ok()?;
    std::fs::create_dir_all(&log_dir).ok()?;
    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not load config ({}), using defaults", e);
            Config::default()
        }
    };

    // Initialize logging
    let _log_guard = init_tracing(&config);
    info!("Lendsqr Admin starting");

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--reset-cache" {
        return reset_cache(config);
    }

    let mut app = App::new(config)?;
    app.mount().await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        warn!(error = %e, "Dashboard exited with an error");
        eprintln!("Error: {}", e);
    }

    info!("Lendsqr Admin shutting down");
    Ok(())
}

/// Drop the cached collection and selection, then exit.
fn reset_cache(config: Config) -> Result<()> {
    let app = App::new(config)?;
    app.repo.clear_cache();
    eprintln!("Cleared cached users and selection");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout so writes from other windows show up
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Pick up collection changes made by other windows
        app.check_sync().await;

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
