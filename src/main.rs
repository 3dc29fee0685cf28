mod events;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser as ClapParser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info, LevelFilter};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use agentviz::app::App;
use agentviz::config::{self, AppConfig};
use agentviz::filter::GraphFilter;
use agentviz::ingest::{GraphSource, SessionDir, SnapshotFile};
use agentviz::layout;
use agentviz::stats::{StatsFormatter, StatsReport, TextFormatter};
use events::AppEvent;

/// Environment variable naming the default session log directory.
const SESSION_PATH_ENV: &str = "SESSION_PATH";

#[derive(ClapParser, Debug)]
#[command(name = "agentviz", about = "Hierarchical activity graph for AI agent sessions")]
struct Cli {
    /// JSON graph snapshot (`{"nodes": [...], "edges": [...]}`).
    #[arg(short, long, conflicts_with = "sessions")]
    graph: Option<PathBuf>,

    /// Directory of agent session logs (*.jsonl).
    #[arg(short, long)]
    sessions: Option<PathBuf>,

    /// Print the layout as JSON instead of launching the TUI.
    #[arg(long)]
    dump: bool,

    /// Print activity statistics instead of launching the TUI.
    #[arg(long, conflicts_with = "dump")]
    stats: bool,

    /// Hide session nodes.
    #[arg(long)]
    hide_sessions: bool,

    /// Hide action nodes.
    #[arg(long)]
    hide_actions: bool,

    /// Configuration file (defaults to agentviz.toml, then the user config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Write logs to this file. The TUI logs nowhere otherwise.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn is_interactive(&self) -> bool {
        !self.dump && !self.stats
    }

    fn filter(&self) -> GraphFilter {
        GraphFilter {
            show_sessions: !self.hide_sessions,
            show_actions: !self.hide_actions,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(&cli)?;
    debug!(cli:?; "Parsed arguments");

    let config = config::load_config(cli.config.as_deref())?;
    let source = resolve_source(&cli, &config)?;
    info!(source = source.describe(); "Using graph source");

    if cli.dump {
        let graph = cli.filter().apply(&source.load()?);
        let layout = layout::compute(&graph, &config.labels);
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    if cli.stats {
        let report = StatsReport::from_graph(&source.load()?, config.ui.recent_sessions);
        print!("{}", TextFormatter::default().format(&report));
        return Ok(());
    }

    let mut app = App::new(source.describe(), config, cli.filter());
    match source.load() {
        Ok(graph) => app.set_graph(graph),
        Err(err) => app.set_error(format!("{err:#}")),
    }

    // Launch TUI.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_tui(&mut terminal, &mut app, source.as_ref());

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn init_logging(cli: &Cli) -> Result<()> {
    let mut log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", cli.log_level);
        LevelFilter::Warn
    });

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("Failed to create log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        // Log lines on stderr would tear through the alternate screen.
        None if cli.is_interactive() => log_level = LevelFilter::Off,
        None => {}
    }
    builder.filter_level(log_level).init();
    info!(log_level:?; "Starting agentviz");
    Ok(())
}

/// `--graph`, then `--sessions`, then `$SESSION_PATH`, then the config file.
fn resolve_source(cli: &Cli, config: &AppConfig) -> Result<Box<dyn GraphSource>> {
    if let Some(path) = &cli.graph {
        return Ok(Box::new(SnapshotFile { path: path.clone() }));
    }

    let dir = cli
        .sessions
        .clone()
        .or_else(|| std::env::var_os(SESSION_PATH_ENV).map(PathBuf::from))
        .or_else(|| config.source.sessions_dir.clone())
        .ok_or_else(|| {
            eyre!("No graph source: pass --graph <FILE> or --sessions <DIR>, or set {SESSION_PATH_ENV}")
        })?;
    Ok(Box::new(SessionDir { dir }))
}

fn run_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    source: &dyn GraphSource,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<AppEvent>();

    // Spawn key reader thread.
    events::spawn_key_reader(tx.clone());

    // Spawn tick timer.
    events::spawn_tick_timer(tx.clone(), Duration::from_millis(app.config.ui.refresh_ms));

    // Reload as soon as the source changes; the tick covers missed events.
    let _watcher = match source.watch_path() {
        Some(path) => match events::watch_source(tx.clone(), path) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                log::warn!(path = path.display().to_string(), error = err.to_string(); "Cannot watch source, relying on periodic refresh");
                None
            }
        },
        None => None,
    };

    let mut dirty = false;
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(AppEvent::Key(key)) => app.handle_key(key),
            Ok(AppEvent::SourceChanged(path)) => {
                debug!(path = path.display().to_string(); "Source changed");
                dirty = true;
            }
            Ok(AppEvent::Tick) => dirty = true,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if app.refresh_requested || dirty {
            reload(app, source);
            app.refresh_requested = false;
            dirty = false;
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn reload(app: &mut App, source: &dyn GraphSource) {
    match source.load() {
        Ok(graph) if graph == app.graph && app.last_error.is_none() => {}
        Ok(graph) => app.set_graph(graph),
        Err(err) => app.set_error(format!("{err:#}")),
    }
}
