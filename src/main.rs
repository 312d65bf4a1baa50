use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use einmaleins::{
    app::{App, AppAction},
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    history::{
        codec, open_repository, GameHistory, GameHistoryRepository, HistoryBackend,
        NullGameHistoryRepository,
    },
    locale::{format_count, format_percent, format_seconds, format_timestamp, format_whole_seconds},
    problem::Operator,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 250;
const LOG_ENV: &str = "EINMALEINS_LOG";
const DEFAULT_LOG_FILTER: &str = "einmaleins=info";

/// multiplication and addition drills in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practise the multiplication table (and addition) one problem at a time. Every finished game is kept in a local history."
)]
pub struct Cli {
    /// number of problems per game
    #[clap(short = 'n', long = "count")]
    count: Option<usize>,

    /// smallest operand
    #[clap(long, allow_negative_numbers = true)]
    min: Option<i64>,

    /// largest operand
    #[clap(long, allow_negative_numbers = true)]
    max: Option<i64>,

    /// operator to practise, repeat for several (+, *, add, mul, x)
    #[clap(short = 'o', long = "operator")]
    operators: Vec<Operator>,

    /// where finished games are kept
    #[clap(long, value_enum)]
    history: Option<HistoryBackend>,

    /// keep no history for this run
    #[clap(long, conflicts_with = "history")]
    no_history: bool,

    /// seed for reproducible problem sets
    #[clap(long)]
    seed: Option<u64>,

    /// print past games and exit
    #[clap(long)]
    show_history: bool,

    /// with --show-history, print the stored JSON document
    #[clap(long, requires = "show_history")]
    json: bool,

    /// store the effective settings as the new defaults and exit
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay command line flags on the stored defaults
    fn apply(&self, mut config: Config) -> Config {
        if let Some(count) = self.count {
            config.problem_count = count;
        }
        if let Some(min) = self.min {
            config.min_operand_value = min;
        }
        if let Some(max) = self.max {
            config.max_operand_value = max;
        }
        if !self.operators.is_empty() {
            config.operators = self.operators.clone();
        }
        if let Some(history) = self.history {
            config.history = history;
        }
        if self.no_history {
            config.history = HistoryBackend::Off;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let settings = cli.apply(config_store.load());
    let state_dir = AppDirs::state_dir();

    if cli.show_history {
        let repository = open_repository(settings.history, &state_dir)?;
        let history = repository.load()?;
        write_history(&mut io::stdout().lock(), &history, cli.json)?;
        return Ok(());
    }

    if let Err(e) = settings.problem_spec() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }

    if cli.save_config {
        config_store.save(&settings)?;
        println!("saved settings to {}", config_store.path().display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let repository: Box<dyn GameHistoryRepository> =
        open_repository(settings.history, &state_dir).unwrap_or_else(|e| {
            tracing::warn!(backend = %settings.history, "history unavailable, not saving games: {e}");
            Box::new(NullGameHistoryRepository)
        });
    let rng = cli
        .seed
        .map(StdRng::seed_from_u64)
        .unwrap_or_else(StdRng::from_entropy);
    let mut app = App::with_collaborators(settings, repository, Arc::new(SystemClock), rng);

    tracing::info!("einmaleins starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Log to a file in the state directory; the terminal belongs to the UI
fn init_logging() {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;
    loop {
        match runner.step() {
            AppEvent::Key(key) => {
                if app.on_key(key) == AppAction::Quit {
                    break;
                }
            }
            // only the running timer changes between key presses
            AppEvent::Tick if app.elapsed().is_none() => continue,
            AppEvent::Tick | AppEvent::Resize => {}
        }
        terminal.draw(|f| ui(app, f))?;
    }

    tracing::info!("einmaleins exiting");
    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn write_history<W: Write>(
    out: &mut W,
    history: &GameHistory,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    if json {
        writeln!(out, "{}", codec::encode_pretty(history)?)?;
        return Ok(());
    }

    if history.is_empty() {
        writeln!(out, "No games played yet")?;
        return Ok(());
    }

    for game in &history.games {
        writeln!(
            out,
            "{}  {:>5} of {:<5} {:>4}  {:>6} s  {:>5} s per problem",
            format_timestamp(game.started_at),
            format_count(game.correct_count as i64),
            format_count(game.problem_count as i64),
            format_percent(game.correct_rate),
            format_whole_seconds(game.duration),
            format_seconds(game.duration_per_problem),
        )?;
    }

    let summary = history.summary();
    writeln!(
        out,
        "{} games, {} of {} problems correct, {} average",
        format_count(summary.games as i64),
        format_count(summary.correct as i64),
        format_count(summary.problems as i64),
        format_percent(summary.mean_correct_rate.unwrap_or_default()),
    )?;
    Ok(())
}
