use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Indices `i >= back_distance` whose stimulus repeats the one shown
/// `back_distance` steps earlier.
pub fn match_opportunities(
    sequence: &[u32],
    back_distance: usize,
) -> impl Iterator<Item = usize> + '_ {
    (back_distance..sequence.len())
        .filter(move |&i| back_distance > 0 && sequence[i] == sequence[i - back_distance])
}

/// Produces the stimulus sequence for a session
pub trait SequenceSource {
    fn generate(
        &mut self,
        length: usize,
        cardinality: u32,
        match_percent: u8,
        back_distance: usize,
    ) -> Vec<u32>;
}

/// Random sequences with a target share of match trials and at least one
/// match whenever the length allows it.
#[derive(Debug)]
pub struct RandomSequence {
    rng: StdRng,
}

impl RandomSequence {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn different_from(&mut self, value: u32, cardinality: u32) -> u32 {
        let draw = self.rng.gen_range(0..cardinality - 1);
        if draw >= value {
            draw + 1
        } else {
            draw
        }
    }
}

impl Default for RandomSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceSource for RandomSequence {
    fn generate(
        &mut self,
        length: usize,
        cardinality: u32,
        match_percent: u8,
        back_distance: usize,
    ) -> Vec<u32> {
        if length == 0 || cardinality == 0 {
            return Vec::new();
        }

        let mut sequence: Vec<u32> = Vec::with_capacity(length);
        for i in 0..length {
            let value = if back_distance > 0 && i >= back_distance {
                let earlier = sequence[i - back_distance];
                if cardinality == 1 || self.rng.gen_range(0..100u8) < match_percent {
                    earlier
                } else {
                    self.different_from(earlier, cardinality)
                }
            } else {
                self.rng.gen_range(0..cardinality)
            };
            sequence.push(value);
        }

        let can_match = back_distance > 0 && length > back_distance;
        if can_match && match_opportunities(&sequence, back_distance).next().is_none() {
            let i = self.rng.gen_range(back_distance..length);
            sequence[i] = sequence[i - back_distance];
        }

        sequence
    }
}

/// Replays a predetermined sequence regardless of the requested shape
#[derive(Debug, Clone)]
pub struct FixedSequence {
    sequence: Vec<u32>,
}

impl FixedSequence {
    pub fn new(sequence: Vec<u32>) -> Self {
        Self { sequence }
    }
}

impl SequenceSource for FixedSequence {
    fn generate(
        &mut self,
        _length: usize,
        _cardinality: u32,
        _match_percent: u8,
        _back_distance: usize,
    ) -> Vec<u32> {
        self.sequence.clone()
    }
}
