use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::error::{NbackError, Result};

const HIGH_SCORE_KEY: &str = "highscore";

/// Persistence collaborator: a single best score.
pub trait HighScoreStore {
    /// Current best, 0 when nothing has been stored yet.
    fn read_high_score(&self) -> u32;
    fn write_high_score(&mut self, score: u32) -> Result<()>;

    /// When the current best was stored, if the store keeps track.
    fn updated_at(&self) -> Option<DateTime<Local>> {
        None
    }
}

/// High score kept in a `preferences` table of a SQLite database
#[derive(Debug)]
pub struct SqliteHighScoreStore {
    conn: Connection,
}

impl SqliteHighScoreStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Opens the database under the user's state directory
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("nback.db"));
        Self::open(path)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl HighScoreStore for SqliteHighScoreStore {
    fn read_high_score(&self) -> u32 {
        let value: rusqlite::Result<Option<i64>> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [HIGH_SCORE_KEY],
                |row| row.get(0),
            )
            .optional();

        match value {
            Ok(Some(v)) => u32::try_from(v).unwrap_or(0),
            Ok(None) => 0,
            Err(err) => {
                warn!(%err, "failed to read high score");
                0
            }
        }
    }

    fn write_high_score(&mut self, score: u32) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![HIGH_SCORE_KEY, score as i64, Local::now().to_rfc3339()],
        )?;
        info!(score, "high score saved");
        Ok(())
    }

    fn updated_at(&self) -> Option<DateTime<Local>> {
        let stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM preferences WHERE key = ?1",
                [HIGH_SCORE_KEY],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten();

        stamp
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Local))
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    score: u32,
    updated_at: Option<DateTime<Local>>,
    writes: Vec<u32>,
    fail_writes: bool,
}

/// In-memory store that records every write. Clones share state, so a test
/// can keep one clone while the controller owns another.
#[derive(Debug, Default, Clone)]
pub struct MemoryHighScoreStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryHighScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: u32) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().score = score;
        store
    }

    /// Changes the stored score without counting it as a write, as another
    /// writer would.
    pub fn set_external(&self, score: u32) {
        self.inner.borrow_mut().score = score;
    }

    pub fn writes(&self) -> Vec<u32> {
        self.inner.borrow().writes.clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn read_high_score(&self) -> u32 {
        self.inner.borrow().score
    }

    fn write_high_score(&mut self, score: u32) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.writes.push(score);
        if inner.fail_writes {
            return Err(NbackError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store unavailable",
            )));
        }
        inner.score = score;
        inner.updated_at = Some(Local::now());
        Ok(())
    }

    fn updated_at(&self) -> Option<DateTime<Local>> {
        self.inner.borrow().updated_at
    }
}
