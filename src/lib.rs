// Library surface for the binary, headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod error;
pub mod highscore;
pub mod logging;
pub mod runtime;
pub mod sequence;
pub mod session;
pub mod speech;
pub mod timer;
pub mod ui;

pub use controller::GameController;
pub use error::{NbackError, Result};
pub use session::{Feedback, GameSnapshot, Modality, SessionConfig, SessionState, SessionSummary};
