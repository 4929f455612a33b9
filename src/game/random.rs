use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of the two random decisions a round makes.
///
/// `GameState` always calls `sample_distinct` first and `pick_index` second
/// when it starts a round.
pub trait RandomSource {
    /// `amount` distinct indices from `0..len`, in display order.
    fn sample_distinct(&mut self, len: usize, amount: usize) -> Vec<usize>;

    /// A uniform index in `0..len`.
    fn pick_index(&mut self, len: usize) -> usize;
}

pub struct StdRandom<R = StdRng> {
    rng: R,
}

impl StdRandom<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomSource for StdRandom<R> {
    fn sample_distinct(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, len, amount).into_vec()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays queued rounds, then falls back to a fixed rotation over the pool
/// with the first option correct.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    rounds: VecDeque<(Vec<usize>, usize)>,
    pending_correct: Option<usize>,
    offset: usize,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_round(&mut self, options: Vec<usize>, correct: usize) -> &mut Self {
        self.rounds.push_back((options, correct));
        self
    }

    pub fn with_round(mut self, options: Vec<usize>, correct: usize) -> Self {
        self.push_round(options, correct);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn sample_distinct(&mut self, len: usize, amount: usize) -> Vec<usize> {
        if let Some((options, correct)) = self.rounds.pop_front() {
            self.pending_correct = Some(correct);
            return options;
        }

        let start = self.offset;
        self.offset = (self.offset + 1) % len.max(1);
        (0..amount).map(|i| (start + i) % len).collect()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.pending_correct.take().unwrap_or(0) % len.max(1)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn std_random_samples_distinct_indices() {
        let mut rng = StdRandom::seeded(7);
        for _ in 0..200 {
            let picked = rng.sample_distinct(12, 3);
            assert_eq!(picked.len(), 3);
            assert!(picked.iter().all(|&i| i < 12));
            assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);
            assert!(rng.pick_index(3) < 3);
        }
    }

    #[test]
    fn std_random_reaches_every_correct_index() {
        let mut rng = StdRandom::seeded(42);
        let seen: HashSet<usize> = (0..100).map(|_| rng.pick_index(3)).collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn scripted_replays_then_rotates() {
        let mut rng = ScriptedRandom::new().with_round(vec![1, 2, 3], 1);
        assert_eq!(rng.sample_distinct(4, 3), vec![1, 2, 3]);
        assert_eq!(rng.pick_index(3), 1);

        assert_eq!(rng.sample_distinct(4, 3), vec![0, 1, 2]);
        assert_eq!(rng.pick_index(3), 0);
        assert_eq!(rng.sample_distinct(4, 3), vec![1, 2, 3]);
        assert_eq!(rng.sample_distinct(4, 3), vec![2, 3, 0]);
    }
}
