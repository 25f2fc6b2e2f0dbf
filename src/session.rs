use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{NbackError, Result};
use crate::speech::ALPHABET;

pub const DEFAULT_BACK_DISTANCE: usize = 2;
pub const DEFAULT_INTERVAL_MS: u64 = 2500;
pub const DEFAULT_NUMBER_OF_EVENTS: usize = 10;
pub const DEFAULT_CARDINALITY: u32 = 9;
pub const DEFAULT_MATCH_PERCENT: u8 = 30;

/// How long correct/incorrect feedback stays visible after a match signal.
pub const FEEDBACK_RESET: Duration = Duration::from_millis(300);

/// Stimulus type: a lit grid cell or a spoken letter
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[default]
    Visual,
    Audio,
}

impl Modality {
    pub fn toggled(self) -> Self {
        match self {
            Modality::Visual => Modality::Audio,
            Modality::Audio => Modality::Visual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Feedback {
    #[default]
    None,
    Correct,
    Incorrect,
}

/// Settings for a single session. Fixed once the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub sequence_length: usize,
    pub cardinality: u32,
    pub back_distance: usize,
    pub interval: Duration,
    pub modality: Modality,
    /// Share of trials (0..=100) the generator should make matches.
    pub match_percent: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_NUMBER_OF_EVENTS,
            cardinality: DEFAULT_CARDINALITY,
            back_distance: DEFAULT_BACK_DISTANCE,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            modality: Modality::Visual,
            match_percent: DEFAULT_MATCH_PERCENT,
        }
    }
}

impl SessionConfig {
    /// Rejects configs no session can be built from.
    ///
    /// A back distance at or past the sequence length is accepted: such a
    /// session runs normally but never has an index eligible for a match.
    pub fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 {
            return Err(NbackError::InvalidConfig(
                "sequence length must be positive".into(),
            ));
        }
        if self.cardinality == 0 {
            return Err(NbackError::InvalidConfig(
                "stimulus cardinality must be positive".into(),
            ));
        }
        if self.cardinality as usize > ALPHABET.len() {
            return Err(NbackError::InvalidConfig(format!(
                "stimulus cardinality {} exceeds the {} available symbols",
                self.cardinality,
                ALPHABET.len()
            )));
        }
        if self.back_distance == 0 {
            return Err(NbackError::InvalidConfig(
                "back distance must be positive".into(),
            ));
        }
        if self.interval.is_zero() {
            return Err(NbackError::InvalidConfig(
                "event interval must be positive".into(),
            ));
        }
        if self.match_percent > 100 {
            return Err(NbackError::InvalidConfig(format!(
                "match percent {} is above 100",
                self.match_percent
            )));
        }
        Ok(())
    }

    /// Whether any index can ever be checked for a match.
    pub fn has_eligible_indices(&self) -> bool {
        self.back_distance < self.sequence_length
    }

    /// A stimulus sequence is usable with this config if its length and
    /// values fit.
    pub fn accepts(&self, sequence: &[u32]) -> bool {
        sequence.len() == self.sequence_length && sequence.iter().all(|&v| v < self.cardinality)
    }
}

/// Mutable state of the current (or last) session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_index: usize,
    /// Number of stimuli shown so far, for "event i / total" displays.
    pub presented: usize,
    pub running: bool,
    pub score: u32,
    pub incorrect: u32,
    pub matched_indices: BTreeSet<usize>,
    pub feedback: Feedback,
    /// `None` when nothing is on screen (before the first and after the last stimulus).
    pub stimulus: Option<u32>,
}

impl SessionState {
    pub fn started() -> Self {
        Self {
            running: true,
            ..Self::default()
        }
    }
}

/// Outcome of a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub score: u32,
    pub incorrect: u32,
    /// Match opportunities the player never signalled.
    pub missed: u32,
    pub opportunities: u32,
    pub new_high_score: bool,
}

impl SessionSummary {
    pub fn accuracy(&self) -> f64 {
        let attempts = self.score + self.incorrect + self.missed;
        if attempts == 0 {
            return 0.0;
        }
        (self.score as f64 / attempts as f64 * 100.0).round()
    }
}

/// Read-only view handed to the display layer
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub modality: Modality,
    pub stimulus: Option<u32>,
    pub running: bool,
    pub current_index: usize,
    pub presented: usize,
    pub total_events: usize,
    pub score: u32,
    pub incorrect: u32,
    pub high_score: u32,
    /// When the high score was stored, if known
    pub high_score_set: Option<DateTime<Local>>,
    pub feedback: Feedback,
    pub back_distance: usize,
    pub interval: Duration,
    pub cardinality: u32,
    pub summary: Option<SessionSummary>,
}
