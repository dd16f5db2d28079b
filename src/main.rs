//! pulsekey - hotkey-driven input repeater
//!
//! Terminal front end: loads settings, starts the emission scheduler and
//! the global listener, then renders engine state until quit.

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode as CtKeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Terminal,
};
use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use pulsekey::{
    config::{self, Config},
    engine::{Engine, Scheduler},
    input::{InputListener, InputSink},
    measure::TestProgress,
    ui::{App, AppState, AppView, HelpPanel, ResultsPanel, StatusBar, TabBar},
};

/// Log to a file; the terminal belongs to the UI
fn init_logging(dir: Option<&Path>) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(file) = dir.and_then(|d| File::create(d.join("pulsekey.log")).ok()) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else {
        // no log directory: stay quiet rather than draw over the UI
        builder.filter_level(log::LevelFilter::Off);
    }
    builder.init();
}

fn load_config() -> (Config, Option<PathBuf>) {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("using default settings: {}", e);
            Config::default()
        }
    };
    let path = match config::config_path() {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("settings will not be saved: {}", e);
            None
        }
    };
    (config, path)
}

fn main() -> Result<()> {
    init_logging(config::config_dir().ok().as_deref());
    let (config, save_path) = load_config();

    let engine = Arc::new(Engine::new(&config));
    let shutdown = Arc::new(AtomicBool::new(false));

    let quit = Arc::clone(&shutdown);
    ctrlc::set_handler(move || quit.store(true, Ordering::Release))
        .context("failed to install Ctrl-C handler")?;

    let scheduler = Scheduler::spawn(Arc::clone(&engine), Arc::clone(&shutdown))
        .context("failed to start emission scheduler")?;

    let sink: Arc<dyn InputSink> = engine.clone();
    let mut app = App::new(engine, InputListener::new(sink), config.clone(), save_path);
    app.start_listener();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &config, &shutdown);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown();
    shutdown.store(true, Ordering::Release);
    if scheduler.join().is_err() {
        log::warn!("emission scheduler panicked");
    }
    result?;

    println!("\npulsekey session complete ({}).", app.elapsed_formatted());
    if let Some(result) = app.engine.last_result() {
        println!(
            "Last rate test: {:.1}/s average, stability {}/100",
            result.average_rate,
            result.stability_display()
        );
    }
    Ok(())
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    config: &Config,
    shutdown: &AtomicBool,
) -> Result<()> {
    let tick_rate = config.refresh_interval();

    loop {
        app.tick(Instant::now());

        terminal.draw(|frame| {
            let size = frame.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1), // Tab bar
                    Constraint::Length(3), // Bindings
                    Constraint::Min(8),    // Main content
                    Constraint::Length(3), // Test progress
                    Constraint::Length(1), // Status bar
                ])
                .split(size);

            let tab_names: Vec<&str> = AppView::all().iter().map(|v| v.name()).collect();
            frame.render_widget(TabBar::new(&tab_names, app.view.index()), chunks[0]);

            let header = Line::from(vec![
                Span::raw(" Hotkey "),
                Span::styled(
                    app.engine.hotkey_display(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw("   Output "),
                Span::styled(
                    app.engine.output_display(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("   {} mode", app.engine.mode().name())),
            ]);
            let header_block = Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(Style::default().fg(Color::Rgb(90, 90, 110)));
            frame.render_widget(Paragraph::new(header).block(header_block), chunks[1]);

            match app.view {
                AppView::Help => frame.render_widget(HelpPanel, chunks[2]),
                _ => {
                    let results = app.current_results();
                    frame.render_widget(ResultsPanel::new(&results, app.view.name()), chunks[2]);
                }
            }

            let label = match &app.progress {
                TestProgress::Running { remaining, .. } => format!("{:.1}s left", remaining),
                _ => "no test running".to_string(),
            };
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("Rate test"))
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio(app.test_fraction())
                .label(label);
            frame.render_widget(gauge, chunks[3]);

            let elapsed = app.elapsed_formatted();
            let status = StatusBar::new(
                app.status(),
                app.view.name(),
                &elapsed,
                app.engine.cadence().rate(),
            )
            .message(app.get_status());
            frame.render_widget(status, chunks[4]);
        })?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code, key.modifiers);
                }
            }
        }

        if shutdown.load(Ordering::Acquire) {
            app.quit();
        }
        if app.state == AppState::Quitting {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, code: CtKeyCode, modifiers: KeyModifiers) {
    if code == CtKeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.state == AppState::EnteringRate {
        match code {
            CtKeyCode::Char(c) => app.push_rate_char(c),
            CtKeyCode::Backspace => app.pop_rate_char(),
            CtKeyCode::Enter => app.commit_rate_entry(),
            CtKeyCode::Esc => app.cancel_rate_entry(),
            _ => {}
        }
        return;
    }

    match code {
        CtKeyCode::Esc => app.escape(),
        _ if !app.accepts_commands() => {}
        CtKeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => app.prev_view(),
        CtKeyCode::BackTab => app.prev_view(),
        CtKeyCode::Tab => app.next_view(),
        CtKeyCode::Char(c) => {
            app.handle_char(c);
        }
        _ => {}
    }
}
