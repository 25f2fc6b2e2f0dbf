use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::session::{
    Modality, SessionConfig, DEFAULT_BACK_DISTANCE, DEFAULT_CARDINALITY, DEFAULT_INTERVAL_MS,
    DEFAULT_MATCH_PERCENT, DEFAULT_NUMBER_OF_EVENTS,
};

/// User settings remembered between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub n_back: usize,
    pub interval_ms: u64,
    pub number_of_events: usize,
    pub cardinality: u32,
    pub modality: Modality,
    pub match_percent: u8,
    /// External text-to-speech command for audio mode, e.g. `espeak`
    pub speech_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            n_back: DEFAULT_BACK_DISTANCE,
            interval_ms: DEFAULT_INTERVAL_MS,
            number_of_events: DEFAULT_NUMBER_OF_EVENTS,
            cardinality: DEFAULT_CARDINALITY,
            modality: Modality::Visual,
            match_percent: DEFAULT_MATCH_PERCENT,
            speech_command: None,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sequence_length: self.number_of_events,
            cardinality: self.cardinality,
            back_distance: self.n_back,
            interval: Duration::from_millis(self.interval_ms),
            modality: self.modality,
            match_percent: self.match_percent,
        }
    }

    /// Copies the session-shaping fields back, leaving the rest untouched
    pub fn update_from_session(&mut self, session: &SessionConfig) {
        self.n_back = session.back_distance;
        self.interval_ms = session.interval.as_millis() as u64;
        self.number_of_events = session.sequence_length;
        self.cardinality = session.cardinality;
        self.modality = session.modality;
        self.match_percent = session.match_percent;
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("nback_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            n_back: 3,
            interval_ms: 1500,
            number_of_events: 25,
            cardinality: 6,
            modality: Modality::Audio,
            match_percent: 40,
            speech_command: Some("espeak -s 140".into()),
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "n_back": 4, "modality": "audio" }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.n_back, 4);
        assert_eq!(cfg.modality, Modality::Audio);
        assert_eq!(cfg.interval_ms, DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn session_config_roundtrip() {
        let mut cfg = Config::default();
        let mut session = cfg.session_config();
        assert_eq!(session, SessionConfig::default());

        session.back_distance = 3;
        session.interval = Duration::from_millis(1750);
        cfg.update_from_session(&session);
        assert_eq!(cfg.n_back, 3);
        assert_eq!(cfg.interval_ms, 1750);
    }
}
