use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use nback::{
    app::{self, App},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    controller::GameController,
    highscore::{HighScoreStore, MemoryHighScoreStore, SqliteHighScoreStore},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    session::Modality,
    speech::{CommandSpeaker, SilentSpeaker, Speaker},
    timer::SystemClock,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{info, warn};

/// n-back memory trainer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An n-back memory trainer: watch a grid (or listen to letters) and press space whenever the current stimulus matches the one shown N steps earlier. Settings not given here come from the saved config."
)]
pub struct Cli {
    /// how many steps back a stimulus has to match
    #[clap(short = 'n', long)]
    n_back: Option<usize>,

    /// milliseconds each stimulus is shown for
    #[clap(short = 'i', long)]
    interval_ms: Option<u64>,

    /// number of stimuli per session
    #[clap(short = 'e', long)]
    events: Option<usize>,

    /// number of distinct stimuli (grid cells / letters, at most 26)
    #[clap(short = 'c', long)]
    cardinality: Option<u32>,

    /// stimulus type
    #[clap(short = 'm', long, value_enum)]
    modality: Option<Modality>,

    /// text-to-speech command for audio mode, run with the letter as its last argument (e.g. "espeak")
    #[clap(long)]
    speech_command: Option<String>,

    /// log filter used when RUST_LOG is not set
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Overlay command line flags on the saved settings
    fn apply(&self, config: &mut Config) {
        if let Some(n) = self.n_back {
            config.n_back = n;
        }
        if let Some(ms) = self.interval_ms {
            config.interval_ms = ms;
        }
        if let Some(events) = self.events {
            config.number_of_events = events;
        }
        if let Some(cardinality) = self.cardinality {
            config.cardinality = cardinality;
        }
        if let Some(modality) = self.modality {
            config.modality = modality;
        }
        if let Some(cmd) = &self.speech_command {
            config.speech_command = Some(cmd.clone());
        }
    }
}

fn open_high_score_store() -> Box<dyn HighScoreStore> {
    match SqliteHighScoreStore::open_default() {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(%err, "high score database unavailable; scores will not be kept");
            Box::new(MemoryHighScoreStore::new())
        }
    }
}

fn speaker_for(config: &Config) -> Box<dyn Speaker> {
    match config
        .speech_command
        .as_deref()
        .and_then(CommandSpeaker::parse)
    {
        Some(speaker) => {
            info!(program = speaker.program(), "speech enabled");
            Box::new(speaker)
        }
        None => Box::new(SilentSpeaker),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_dir = AppDirs::log_dir().unwrap_or_else(|| PathBuf::from("logs"));
    let _log_guard = logging::init_tracing(&log_dir, &cli.log_level);

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    info!(path = %config_store.path().display(), "settings loaded");
    cli.apply(&mut config);

    let controller = GameController::new(SystemClock, open_high_score_store())
        .with_speaker(speaker_for(&config));
    let mut app = App::new(controller, config).with_config_store(Box::new(config_store));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = app::run(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting");
    result?;
    Ok(())
}
