use std::time::Duration;

use proptest::collection::vec;
use proptest::prelude::*;

use nback::controller::GameController;
use nback::highscore::MemoryHighScoreStore;
use nback::sequence::{match_opportunities, FixedSequence, RandomSequence};
use nback::session::{Modality, SessionConfig};
use nback::timer::ManualClock;

const STEP: Duration = Duration::from_millis(100);

fn session_config() -> impl Strategy<Value = SessionConfig> {
    (1usize..40, 1u32..=26, 1usize..6, 0u8..=100).prop_map(|(len, cardinality, n, pct)| {
        SessionConfig {
            sequence_length: len,
            cardinality,
            back_distance: n,
            interval: STEP,
            modality: Modality::Visual,
            match_percent: pct,
        }
    })
}

fn fixed(
    sequence: &[u32],
    cardinality: u32,
    back_distance: usize,
    store: &MemoryHighScoreStore,
) -> (GameController<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let mut c = GameController::new(clock.clone(), Box::new(store.clone()))
        .with_generator(Box::new(FixedSequence::new(sequence.to_vec())));
    c.configure(SessionConfig {
        sequence_length: sequence.len(),
        cardinality,
        back_distance,
        interval: STEP,
        ..SessionConfig::default()
    })
    .unwrap();
    (c, clock)
}

proptest! {
    #[test]
    fn generated_sessions_fit_their_config(cfg in session_config(), seed in any::<u64>()) {
        let mut c = GameController::new(ManualClock::new(), Box::new(MemoryHighScoreStore::new()))
            .with_generator(Box::new(RandomSequence::seeded(seed)));
        c.configure(cfg.clone()).unwrap();

        prop_assert!(c.start());
        prop_assert_eq!(c.sequence().len(), cfg.sequence_length);
        prop_assert!(c.sequence().iter().all(|&v| v < cfg.cardinality));
        if cfg.has_eligible_indices() {
            prop_assert!(match_opportunities(c.sequence(), cfg.back_distance).count() >= 1);
        }
    }

    #[test]
    fn signals_score_exactly_the_n_back_matches(
        seq in vec(0u32..4, 2..30),
        n in 1usize..5,
        signals in vec(any::<bool>(), 30),
    ) {
        let store = MemoryHighScoreStore::new();
        let (mut c, clock) = fixed(&seq, 4, n, &store);
        c.start();

        let mut expected = 0;
        let mut wrong = 0;
        for i in 0..seq.len() {
            prop_assert_eq!(c.state().current_index, i);
            if signals[i] {
                let result = c.check_match();
                if i < n {
                    prop_assert_eq!(result, None);
                } else {
                    let correct = seq[i] == seq[i - n];
                    prop_assert_eq!(result, Some(correct));
                    if correct { expected += 1 } else { wrong += 1 }
                }
                // a second signal for the same stimulus never counts
                prop_assert_eq!(c.check_match(), None);
            }
            prop_assert_eq!(c.state().score, expected);
            prop_assert_eq!(c.state().incorrect, wrong);
            clock.advance(STEP);
            c.on_tick();
        }

        prop_assert!(!c.is_running());
        let summary = *c.summary().unwrap();
        prop_assert_eq!(summary.score, expected);
        prop_assert_eq!(summary.incorrect, wrong);
        prop_assert_eq!(
            summary.opportunities as usize,
            match_opportunities(&seq, n).count()
        );
    }

    #[test]
    fn high_score_is_written_only_when_beaten(
        len in 2usize..20,
        hits in 0usize..20,
        stored in 0u32..10,
    ) {
        let store = MemoryHighScoreStore::with_score(stored);
        let seq = vec![0u32; len];
        let (mut c, clock) = fixed(&seq, 1, 1, &store);
        c.start();

        let hits = hits.min(len - 1);
        for _ in 0..hits {
            clock.advance(STEP);
            prop_assert_eq!(c.check_match(), Some(true));
        }
        for _ in 0..len {
            clock.advance(STEP);
            c.on_tick();
        }
        prop_assert!(!c.is_running());

        let score = hits as u32;
        if score > stored {
            prop_assert_eq!(store.writes(), vec![score]);
            prop_assert_eq!(c.high_score(), score);
        } else {
            prop_assert!(store.writes().is_empty());
            prop_assert_eq!(c.high_score(), stored);
        }
    }

    #[test]
    fn irregular_ticks_present_every_stimulus(
        seq in vec(0u32..4, 1..15),
        gaps in vec(1u64..500, 1..200),
    ) {
        let store = MemoryHighScoreStore::new();
        let (mut c, clock) = fixed(&seq, 4, 1, &store);
        let rx = c.subscribe();
        c.start();

        for gap in gaps {
            clock.advance(Duration::from_millis(gap));
            c.on_tick();
        }

        let indices: Vec<usize> = rx.try_iter().map(|s| s.current_index).collect();
        for pair in indices.windows(2) {
            prop_assert!(pair[1] <= pair[0] + 1, "skipped from {} to {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn restart_discards_the_previous_session(
        seq in vec(0u32..3, 4..20),
        steps in 0usize..4,
    ) {
        let store = MemoryHighScoreStore::new();
        let (mut c, clock) = fixed(&seq, 3, 1, &store);
        c.start();
        for _ in 0..steps {
            clock.advance(STEP);
            c.check_match();
        }

        clock.advance(STEP / 2);
        prop_assert!(c.start());
        prop_assert_eq!(c.state().score, 0);
        prop_assert_eq!(c.state().incorrect, 0);
        prop_assert!(c.state().matched_indices.is_empty());

        // where the old loop would have ticked
        clock.advance(STEP / 2);
        c.on_tick();
        prop_assert_eq!(c.state().current_index, 0);
    }
}
