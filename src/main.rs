use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{backend::CrosstermBackend, prelude::*};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod ui;

use app::{App, AppMode};
use vgrid::loader::{LoadRequest, LoadResponse, start_loader_worker};
use vgrid::{Grid, GridConfig, TextDirection, WindowPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Virtualized data grid for JSON datasets")]
struct Args {
    /// Dataset file: JSON array, {"columns", "rows"} document, or .ndjson
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// TOML file with grid settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Page size (rows per page)
    #[arg(short = 'n', long)]
    page_size: Option<usize>,

    /// Reveal rows a page at a time while scrolling
    #[arg(long)]
    paged: bool,

    /// Show the page indicator
    #[arg(long)]
    paginator: bool,

    #[arg(long)]
    no_filter: bool,

    #[arg(long)]
    no_resize: bool,

    /// Re-measure column widths whenever data is assigned
    #[arg(long)]
    autosize: bool,

    /// Right-to-left header layout for resize handles
    #[arg(long)]
    rtl: bool,

    /// Log file (defaults to vgrid.log in the temp directory)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn grid_config(&self) -> Result<GridConfig> {
        let mut config = match &self.config {
            Some(path) => GridConfig::load(path)?,
            None => GridConfig::terminal(),
        };
        if let Some(n) = self.page_size {
            config.page_size = n;
        }
        if self.paged {
            config.windowing = WindowPolicy::Paged;
        }
        if self.paginator {
            config.paginator = true;
        }
        if self.no_filter {
            config.filterable = false;
        }
        if self.no_resize {
            config.resizable = false;
        }
        if self.autosize {
            config.auto_size_columns = true;
        }
        if self.rtl {
            config.direction = TextDirection::Rtl;
        }
        Ok(config)
    }
}

/// Logs go to a file: the terminal belongs to the UI.
fn init_logging(path: Option<PathBuf>) -> WorkerGuard {
    let path = path.unwrap_or_else(|| std::env::temp_dir().join("vgrid.log"));
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("vgrid.log"));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_file.clone());
    let config = args.grid_config()?;
    let grid = Grid::new(config)?;
    info!(path = %args.path.display(), "starting vgrid");

    let mut terminal = setup_terminal()?;

    // Loader worker channels
    let (req_tx, req_rx) = crossbeam_channel::unbounded::<LoadRequest>();
    let (resp_tx, resp_rx) = crossbeam_channel::unbounded::<LoadResponse>();
    std::thread::spawn(move || start_loader_worker(req_rx, resp_tx));

    let mut app = App::new(grid, req_tx, resp_rx);
    app.open(args.path.clone());

    let res = run_app(&mut terminal, &mut app, Duration::from_millis(100));

    restore_terminal(terminal)?;
    if let Err(e) = res {
        eprintln!("Error: {e:?}");
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();
    // Redraw only when state changes or on tick
    let mut dirty = true;
    loop {
        // Loader responses, without blocking
        while let Ok(msg) = app.resp_rx.try_recv() {
            app.handle_load_response(msg, Instant::now());
            dirty = true;
        }

        let events = app.grid.tick(Instant::now());
        if !events.is_empty() {
            app.handle_grid_events(events);
            dirty = true;
        }

        let tick_due = last_tick.elapsed() >= tick_rate;
        if dirty || tick_due || app.grid.is_pending() {
            terminal.draw(|f| ui::draw(f, app))?;
            dirty = app.after_draw(Instant::now());
            if tick_due {
                last_tick = Instant::now();
            }
        }

        let now = Instant::now();
        let mut timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if let Some(at) = app.grid.next_deadline() {
            timeout = timeout.min(at.saturating_duration_since(now));
        }

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let now = Instant::now();
                    if app.mode == AppMode::Filter {
                        handle_key_filter(app, key, now);
                    } else {
                        handle_key_normal(app, key.code, now);
                    }
                    dirty = true;
                }
                Event::Mouse(m) => {
                    app.on_mouse(m, Instant::now());
                    dirty = true;
                }
                Event::Resize(..) => dirty = true,
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key_filter(app: &mut App, key: crossterm::event::KeyEvent, now: Instant) {
    use crossterm::event::{KeyCode::*, KeyModifiers};
    match key.code {
        Enter => app.end_filter_input(),
        Esc => {
            app.clear_filter(now);
            app.status = "Filter cleared".into();
        }
        Backspace => app.filter_backspace(now),
        Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.filter_push(c, now),
        _ => {}
    }
}

fn handle_key_normal(app: &mut App, code: KeyCode, now: Instant) {
    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('/') => {
            app.begin_filter_input();
            if app.mode == AppMode::Filter {
                app.status = "Filter: type to narrow rows (Enter keeps, Esc clears)".into();
            }
        }
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Esc => {
            if app.show_help {
                app.show_help = false;
            } else if !app.filter_input.is_empty() {
                app.clear_filter(now);
                app.status = "Filter cleared".into();
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.move_cell_up(now),
        KeyCode::Down | KeyCode::Char('j') => app.move_cell_down(now),
        KeyCode::Left | KeyCode::Char('h') => app.move_cell_left(),
        KeyCode::Right | KeyCode::Char('l') => app.move_cell_right(),
        KeyCode::PageDown | KeyCode::Char('n') => app.next_page(now),
        KeyCode::PageUp | KeyCode::Char('p') => app.prev_page(now),
        KeyCode::Home => app.select_row(0, now),
        KeyCode::End => app.select_row(usize::MAX, now),
        KeyCode::Char('s') => app.sort_selected_column(now),
        KeyCode::Char('+') | KeyCode::Char('=') => app.widen_selected_column(1.0),
        KeyCode::Char('-') | KeyCode::Char('_') => app.widen_selected_column(-1.0),
        KeyCode::Char('a') => app.request_autosize(now),
        KeyCode::Char('v') => app.toggle_cell_viewer(),
        KeyCode::Char('r') => app.reload(),
        _ => {}
    }
}
