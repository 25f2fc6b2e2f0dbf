use ratatui::Frame;

use crate::app::AppState;
use crate::session::GameSnapshot;
use crate::ui::{GameView, HomeView};

/// A UI Screen boundary: renders one app state from a controller snapshot
pub trait Screen {
    fn render(&self, snapshot: &GameSnapshot, f: &mut Frame);
}

/// Settings, high score and modality picker
pub struct HomeScreen;

impl Screen for HomeScreen {
    fn render(&self, snapshot: &GameSnapshot, f: &mut Frame) {
        f.render_widget(HomeView { snapshot }, f.area());
    }
}

/// Running (or just finished) session
pub struct GameScreen;

impl Screen for GameScreen {
    fn render(&self, snapshot: &GameSnapshot, f: &mut Frame) {
        f.render_widget(GameView { snapshot }, f.area());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Home => Box::new(HomeScreen),
        AppState::Game => Box::new(GameScreen),
    }
}
