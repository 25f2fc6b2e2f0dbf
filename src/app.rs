use std::io;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use tracing::warn;

use crate::config::{Config, ConfigStore};
use crate::controller::GameController;
use crate::runtime::{AppEvent, EventSource, Runner, Ticker};
use crate::session::{GameSnapshot, Modality, SessionConfig};
use crate::timer::{Clock, SystemClock};
use crate::ui;

const INTERVAL_STEP_MS: u64 = 250;
const EVENTS_STEP: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Home,
    Game,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Terminal front end state: which screen is up, plus the controller it
/// sends intents to.
pub struct App<C: Clock = SystemClock> {
    pub controller: GameController<C>,
    pub config: Config,
    pub state: AppState,
    config_store: Option<Box<dyn ConfigStore>>,
}

impl<C: Clock> App<C> {
    pub fn new(mut controller: GameController<C>, mut config: Config) -> Self {
        if let Err(err) = controller.configure(config.session_config()) {
            warn!(%err, "ignoring saved settings");
        }
        config.update_from_session(controller.config());

        Self {
            controller,
            config,
            state: AppState::Home,
            config_store: None,
        }
    }

    /// Settings changed from the home screen are saved through `store`.
    pub fn with_config_store(mut self, store: Box<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.controller.snapshot()
    }

    pub fn on_tick(&mut self) {
        self.controller.on_tick();
    }

    pub fn start_game(&mut self) {
        if self.controller.start() {
            self.state = AppState::Game;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Quit;
        }

        match self.state {
            AppState::Home => self.on_home_key(key.code),
            AppState::Game => self.on_game_key(key.code),
        }
    }

    fn on_home_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Enter | KeyCode::Char('s') => self.start_game(),
            KeyCode::Char('v') => self.adjust(|s| s.modality = Modality::Visual),
            KeyCode::Char('a') => self.adjust(|s| s.modality = Modality::Audio),
            KeyCode::Tab => self.adjust(|s| s.modality = s.modality.toggled()),
            KeyCode::Char('n') => self.adjust(|s| s.back_distance += 1),
            KeyCode::Char('N') => {
                self.adjust(|s| s.back_distance = s.back_distance.saturating_sub(1).max(1))
            }
            KeyCode::Char('i') => {
                self.adjust(|s| s.interval += Duration::from_millis(INTERVAL_STEP_MS))
            }
            KeyCode::Char('I') => self.adjust(|s| {
                let step = Duration::from_millis(INTERVAL_STEP_MS);
                s.interval = s.interval.saturating_sub(step).max(step)
            }),
            KeyCode::Char('e') => self.adjust(|s| s.sequence_length += EVENTS_STEP),
            KeyCode::Char('E') => self.adjust(|s| {
                s.sequence_length = s.sequence_length.saturating_sub(EVENTS_STEP).max(1)
            }),
            _ => {}
        }
        Action::Continue
    }

    fn on_game_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char(' ') | KeyCode::Char('m') => {
                self.controller.check_match();
            }
            KeyCode::Char('r') => self.start_game(),
            KeyCode::Enter if !self.controller.is_running() => self.start_game(),
            KeyCode::Char('b') | KeyCode::Backspace if !self.controller.is_running() => {
                self.state = AppState::Home;
            }
            _ => {}
        }
        Action::Continue
    }

    fn adjust(&mut self, change: impl FnOnce(&mut SessionConfig)) {
        let mut next = self.controller.config().clone();
        change(&mut next);
        if let Err(err) = self.controller.configure(next) {
            warn!(%err, "settings change rejected");
            return;
        }
        self.config.update_from_session(self.controller.config());
        self.persist_config();
    }

    fn persist_config(&self) {
        if let Some(store) = &self.config_store {
            if let Err(err) = store.save(&self.config) {
                warn!(%err, "failed to save settings");
            }
        }
    }
}

/// Drives the app until the user quits: every step lets due timers run,
/// applies the key (if any) and redraws.
pub fn run<B, E, T, C>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &Runner<E, T>,
) -> io::Result<()>
where
    B: Backend,
    E: EventSource,
    T: Ticker,
    C: Clock,
{
    terminal.draw(|f| ui::draw(app.state, &app.snapshot(), f))?;

    loop {
        let event = runner.step();
        app.on_tick();

        if let AppEvent::Key(key) = event {
            if app.on_key(key) == Action::Quit {
                break;
            }
        }

        terminal.draw(|f| ui::draw(app.state, &app.snapshot(), f))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfigStore;
    use crate::highscore::MemoryHighScoreStore;
    use crate::sequence::FixedSequence;
    use crate::timer::ManualClock;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(seq: Vec<u32>) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let controller = GameController::new(clock.clone(), Box::new(MemoryHighScoreStore::new()))
            .with_generator(Box::new(FixedSequence::new(seq.clone())));
        let config = Config {
            number_of_events: seq.len(),
            interval_ms: 1000,
            ..Config::default()
        };
        (App::new(controller, config), clock)
    }

    fn tick_through(app: &mut App<ManualClock>, clock: &ManualClock, intervals: u32) {
        for _ in 0..intervals {
            clock.advance(Duration::from_millis(1000));
            app.on_tick();
        }
    }

    #[test]
    fn starts_on_home_with_config_applied() {
        let (app, _clock) = app_with(vec![1, 2, 1, 2]);
        assert_eq!(app.state, AppState::Home);
        assert_eq!(app.controller.config().sequence_length, 4);
        assert_eq!(app.controller.config().interval, Duration::from_millis(1000));
    }

    #[test]
    fn invalid_saved_config_falls_back() {
        let controller =
            GameController::new(ManualClock::new(), Box::new(MemoryHighScoreStore::new()));
        let config = Config {
            n_back: 0,
            ..Config::default()
        };
        let app = App::new(controller, config);
        assert_eq!(app.config.n_back, 2);
    }

    #[test]
    fn enter_starts_game() {
        let (mut app, _clock) = app_with(vec![1, 2, 1, 2]);
        assert_eq!(app.on_key(key(KeyCode::Enter)), Action::Continue);
        assert_eq!(app.state, AppState::Game);
        assert!(app.controller.is_running());
    }

    #[test]
    fn space_signals_match() {
        let (mut app, clock) = app_with(vec![1, 2, 1, 2]);
        app.on_key(key(KeyCode::Enter));
        tick_through(&mut app, &clock, 2);
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.snapshot().score, 1);
    }

    #[test]
    fn back_only_after_session_ends() {
        let (mut app, clock) = app_with(vec![1, 2, 1, 2]);
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Char('b')));
        assert_eq!(app.state, AppState::Game);

        tick_through(&mut app, &clock, 4);
        assert!(!app.controller.is_running());
        app.on_key(key(KeyCode::Char('b')));
        assert_eq!(app.state, AppState::Home);
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let (mut app, _clock) = app_with(vec![1, 2, 1, 2]);
        assert_eq!(app.on_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.on_key(key(KeyCode::Esc)), Action::Quit);
    }

    #[test]
    fn home_keys_adjust_settings() {
        let (mut app, _clock) = app_with(vec![1, 2, 1, 2, 1, 2]);

        app.on_key(key(KeyCode::Char('a')));
        assert_eq!(app.controller.config().modality, Modality::Audio);
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.controller.config().modality, Modality::Visual);

        app.on_key(key(KeyCode::Char('n')));
        assert_eq!(app.config.n_back, 3);
        app.on_key(key(KeyCode::Char('N')));
        app.on_key(key(KeyCode::Char('N')));
        app.on_key(key(KeyCode::Char('N')));
        assert_eq!(app.config.n_back, 1);

        app.on_key(key(KeyCode::Char('i')));
        assert_eq!(app.config.interval_ms, 1250);
        for _ in 0..10 {
            app.on_key(key(KeyCode::Char('I')));
        }
        assert_eq!(app.config.interval_ms, INTERVAL_STEP_MS);

        app.on_key(key(KeyCode::Char('e')));
        assert_eq!(app.config.number_of_events, 11);
        for _ in 0..5 {
            app.on_key(key(KeyCode::Char('E')));
        }
        assert_eq!(app.config.number_of_events, 1);
    }

    #[test]
    fn settings_are_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let (app, _clock) = app_with(vec![1, 2, 1, 2]);
        let mut app = app.with_config_store(Box::new(FileConfigStore::with_path(&path)));

        app.on_key(key(KeyCode::Char('a')));

        let saved = FileConfigStore::with_path(&path).load();
        assert_eq!(saved.modality, Modality::Audio);
        assert_eq!(saved.number_of_events, 4);
    }

    #[test]
    fn restart_key_supersedes_session() {
        let (mut app, clock) = app_with(vec![1, 2, 1, 2]);
        app.on_key(key(KeyCode::Enter));
        tick_through(&mut app, &clock, 2);
        app.on_key(key(KeyCode::Char('m')));
        assert_eq!(app.snapshot().score, 1);

        app.on_key(key(KeyCode::Char('r')));
        let snap = app.snapshot();
        assert_eq!(snap.score, 0);
        assert_eq!(snap.current_index, 0);
        assert!(snap.running);
    }
}
