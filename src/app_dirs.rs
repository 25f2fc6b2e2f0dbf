use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "nback";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/nback`, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("nback.db"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("logs"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_state_dir() {
        if let Some(state) = AppDirs::state_dir() {
            assert_eq!(AppDirs::db_path(), Some(state.join("nback.db")));
            assert_eq!(AppDirs::log_dir(), Some(state.join("logs")));
        }
    }

    #[test]
    fn config_file_is_json() {
        if let Some(path) = AppDirs::config_path() {
            assert_eq!(path.file_name().unwrap(), "config.json");
        }
    }
}
