use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Local};
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::error::{NbackError, Result};
use crate::highscore::HighScoreStore;
use crate::sequence::{match_opportunities, RandomSequence, SequenceSource};
use crate::session::{
    Feedback, GameSnapshot, Modality, SessionConfig, SessionState, SessionSummary, FEEDBACK_RESET,
};
use crate::speech::{symbol, SilentSpeaker, Speaker};
use crate::timer::{Clock, Scheduler, SystemClock, TimerId};

/// Runs n-back sessions: owns the stimulus sequence, steps through it on a
/// repeating timer, scores match signals and keeps the high score.
///
/// Everything happens on the caller's thread. Time only moves forward for
/// the controller when `on_tick` (or `check_match`) is called, so the owner
/// is expected to call `on_tick` regularly while a session runs.
pub struct GameController<C: Clock = SystemClock> {
    clock: C,
    config: SessionConfig,
    sequence: Vec<u32>,
    state: SessionState,
    high_score: u32,
    high_score_set: Option<DateTime<Local>>,
    summary: Option<SessionSummary>,
    timers: Scheduler,
    presentation: Option<TimerId>,
    feedback_reset: Option<TimerId>,
    generator: Box<dyn SequenceSource>,
    store: Box<dyn HighScoreStore>,
    speaker: Box<dyn Speaker>,
    subscribers: Vec<Sender<GameSnapshot>>,
}

impl<C: Clock> GameController<C> {
    pub fn new(clock: C, store: Box<dyn HighScoreStore>) -> Self {
        let high_score = store.read_high_score();
        let high_score_set = store.updated_at();
        Self {
            clock,
            config: SessionConfig::default(),
            sequence: Vec::new(),
            state: SessionState::default(),
            high_score,
            high_score_set,
            summary: None,
            timers: Scheduler::new(),
            presentation: None,
            feedback_reset: None,
            generator: Box::new(RandomSequence::new()),
            store,
            speaker: Box::new(SilentSpeaker),
            subscribers: Vec::new(),
        }
    }

    pub fn with_generator(mut self, generator: Box<dyn SequenceSource>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_speaker(mut self, speaker: Box<dyn Speaker>) -> Self {
        self.speaker = speaker;
        self
    }

    pub fn set_speaker(&mut self, speaker: Box<dyn Speaker>) {
        self.speaker = speaker;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn sequence(&self) -> &[u32] {
        &self.sequence
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Replaces the session settings. Only allowed between sessions.
    pub fn configure(&mut self, config: SessionConfig) -> Result<()> {
        if self.state.running {
            return Err(NbackError::SessionRunning);
        }
        config.validate()?;
        if !config.has_eligible_indices() {
            warn!(
                back_distance = config.back_distance,
                sequence_length = config.sequence_length,
                "back distance leaves no index eligible for a match"
            );
        }
        self.config = config;
        self.publish();
        Ok(())
    }

    pub fn set_modality(&mut self, modality: Modality) -> Result<()> {
        self.configure(SessionConfig {
            modality,
            ..self.config.clone()
        })
    }

    /// Picks up a high score written by someone else.
    pub fn refresh_high_score(&mut self) {
        self.high_score = self.store.read_high_score();
        self.high_score_set = self.store.updated_at();
    }

    /// Starts a new session over a freshly generated sequence, superseding
    /// any session in progress. Returns false if no session could start.
    pub fn start(&mut self) -> bool {
        let sequence = self.generator.generate(
            self.config.sequence_length,
            self.config.cardinality,
            self.config.match_percent,
            self.config.back_distance,
        );
        self.start_with(sequence)
    }

    /// Like `start`, over the given sequence. A sequence that does not fit
    /// the current config is ignored.
    pub fn start_with(&mut self, sequence: Vec<u32>) -> bool {
        if !self.config.accepts(&sequence) {
            warn!(
                len = sequence.len(),
                expected = self.config.sequence_length,
                "sequence does not fit session config; not starting"
            );
            return false;
        }

        self.cancel_timers();
        self.refresh_high_score();

        debug!(sequence = %sequence.iter().join(","), "session sequence");
        self.sequence = sequence;
        self.state = SessionState::started();
        self.summary = None;

        let now = self.clock.now();
        self.presentation = Some(self.timers.schedule_repeating(now, self.config.interval));

        info!(
            n_back = self.config.back_distance,
            events = self.config.sequence_length,
            modality = %self.config.modality,
            "session started"
        );
        self.present(0);
        true
    }

    /// Signals that the current stimulus matches the one `back_distance`
    /// steps earlier. Returns whether the signal was right, or `None` when
    /// the signal was not eligible and nothing changed.
    pub fn check_match(&mut self) -> Option<bool> {
        self.on_tick();

        if !self.state.running {
            return None;
        }
        let index = self.state.current_index;
        let back = self.config.back_distance;
        if index < back || !self.state.matched_indices.insert(index) {
            return None;
        }

        let correct = self.sequence[index] == self.sequence[index - back];
        if correct {
            self.state.score += 1;
            self.state.feedback = Feedback::Correct;
        } else {
            self.state.incorrect += 1;
            self.state.feedback = Feedback::Incorrect;
        }
        debug!(index, correct, score = self.state.score, "match checked");

        if let Some(id) = self.feedback_reset.take() {
            self.timers.cancel(id);
        }
        self.feedback_reset = Some(self.timers.schedule_once(self.clock.now(), FEEDBACK_RESET));

        self.publish();
        Some(correct)
    }

    /// Delivers every timer that has come due: stimulus advances and
    /// feedback resets. A tick that arrives late moves the presentation on
    /// by one stimulus only, and that stimulus then gets a full interval.
    pub fn on_tick(&mut self) {
        let now = self.clock.now();
        for fired in self.timers.poll(now) {
            if Some(fired.id) == self.presentation {
                self.advance();
            } else if Some(fired.id) == self.feedback_reset {
                self.feedback_reset = None;
                self.state.feedback = Feedback::None;
                self.publish();
            }
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            modality: self.config.modality,
            stimulus: self.state.stimulus,
            running: self.state.running,
            current_index: self.state.current_index,
            presented: self.state.presented,
            total_events: self.config.sequence_length,
            score: self.state.score,
            incorrect: self.state.incorrect,
            high_score: self.high_score,
            high_score_set: self.high_score_set,
            feedback: self.state.feedback,
            back_distance: self.config.back_distance,
            interval: self.config.interval,
            cardinality: self.config.cardinality,
            summary: self.summary,
        }
    }

    /// Receives a snapshot now and after every state change.
    pub fn subscribe(&mut self) -> Receiver<GameSnapshot> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.snapshot());
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    fn cancel_timers(&mut self) {
        if let Some(id) = self.presentation.take() {
            self.timers.cancel(id);
        }
        if let Some(id) = self.feedback_reset.take() {
            self.timers.cancel(id);
        }
    }

    fn present(&mut self, index: usize) {
        let value = self.sequence[index];
        if self.config.modality == Modality::Audio {
            if let Some(letter) = symbol(value) {
                self.speaker.speak(letter);
            }
        }
        self.state.current_index = index;
        self.state.presented = index + 1;
        self.state.stimulus = Some(value);
        self.publish();
    }

    fn advance(&mut self) {
        let next = self.state.current_index + 1;
        if next < self.sequence.len() {
            self.present(next);
        } else {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if let Some(id) = self.presentation.take() {
            self.timers.cancel(id);
        }
        self.state.running = false;
        self.state.current_index = self.sequence.len();
        self.state.stimulus = None;

        let score = self.state.score;
        let new_high_score = score > self.high_score;
        if new_high_score {
            match self.store.write_high_score(score) {
                Ok(()) => {
                    self.high_score = score;
                    self.high_score_set = self.store.updated_at();
                }
                Err(err) => warn!(%err, score, "failed to persist high score"),
            }
        }

        let back = self.config.back_distance;
        let opportunities: Vec<usize> = match_opportunities(&self.sequence, back).collect();
        let missed = opportunities
            .iter()
            .filter(|&&i| !self.state.matched_indices.contains(&i))
            .count();

        let summary = SessionSummary {
            score,
            incorrect: self.state.incorrect,
            missed: missed as u32,
            opportunities: opportunities.len() as u32,
            new_high_score,
        };
        info!(
            score,
            incorrect = summary.incorrect,
            missed = summary.missed,
            new_high_score,
            "session finished"
        );
        self.summary = Some(summary);
        self.publish();
    }
}
