use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ConfigError, Rules};

use super::country::{Country, CountryPool};
use super::random::RandomSource;

/// Source of game numbers; unique for the lifetime of the process.
static NEXT_GAME: AtomicU64 = AtomicU64::new(1);

fn next_game() -> u64 {
    NEXT_GAME.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingInput,
    ShowingFeedback,
    SessionOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOptions {
    countries: Vec<Country>,
    correct_index: usize,
}

impl RoundOptions {
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn correct(&self) -> &Country {
        &self.countries[self.correct_index]
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

/// Result of an accepted tap, shown during the feedback interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub game: u64,
    /// 1-based number of the round the tap belongs to.
    pub round: u32,
    pub options: Vec<Country>,
    pub choice: usize,
    pub correct_index: usize,
    pub score: u32,
}

impl Feedback {
    pub fn is_correct(&self) -> bool {
        self.choice == self.correct_index
    }

    pub fn chosen(&self) -> &Country {
        &self.options[self.choice]
    }

    pub fn answer(&self) -> &Country {
        &self.options[self.correct_index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    NextRound,
    SessionOver,
}

/// Read-only projection handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Changes on every new game and every reset.
    pub game: u64,
    pub options: Vec<Country>,
    pub correct_index: usize,
    pub correct_country: String,
    pub selection: Option<usize>,
    pub score: u32,
    pub rounds_played: u32,
    pub rounds_per_session: u32,
    pub phase: Phase,
    pub game_over: bool,
}

#[derive(Debug, Clone)]
pub struct GameState {
    game: u64,
    pool: Arc<CountryPool>,
    rules: Rules,
    options: RoundOptions,
    selection: Option<usize>,
    rounds_played: u32,
    score: u32,
    phase: Phase,
}

impl GameState {
    pub fn new(
        pool: Arc<CountryPool>,
        rules: Rules,
        rng: &mut dyn RandomSource,
    ) -> Result<Self, ConfigError> {
        rules.validate(&pool)?;

        let options = draw_options(&pool, rules.options_per_round, rng);
        Ok(Self {
            game: next_game(),
            pool,
            rules,
            options,
            selection: None,
            rounds_played: 0,
            score: 0,
            phase: Phase::AwaitingInput,
        })
    }

    pub fn start_new_round(&mut self, rng: &mut dyn RandomSource) {
        self.options = draw_options(&self.pool, self.rules.options_per_round, rng);
        self.selection = None;
        self.phase = Phase::AwaitingInput;
        debug!(
            round = self.rounds_played + 1,
            answer = self.options.correct().name(),
            "new round"
        );
    }

    /// Records a tap. Returns `None` and changes nothing when input is
    /// locked, the session is over, or `choice` is out of range.
    pub fn submit_choice(&mut self, choice: usize) -> Option<Feedback> {
        debug_assert!(
            choice < self.options.len(),
            "choice {choice} out of range for {} options",
            self.options.len()
        );
        if choice >= self.options.len() {
            warn!(choice, "ignoring out-of-range choice");
            return None;
        }
        if self.input_locked() || self.is_game_over() {
            return None;
        }

        self.selection = Some(choice);
        self.phase = Phase::ShowingFeedback;
        if choice == self.options.correct_index {
            self.score += 1;
        }

        Some(Feedback {
            game: self.game,
            round: self.rounds_played + 1,
            options: self.options.countries.clone(),
            choice,
            correct_index: self.options.correct_index,
            score: self.score,
        })
    }

    /// Ends the feedback interval. Only acts while feedback is showing.
    pub fn finish_round(&mut self, rng: &mut dyn RandomSource) -> Option<RoundOutcome> {
        if self.phase != Phase::ShowingFeedback {
            return None;
        }

        self.rounds_played += 1;
        if self.is_game_over() {
            self.phase = Phase::SessionOver;
            Some(RoundOutcome::SessionOver)
        } else {
            self.start_new_round(rng);
            Some(RoundOutcome::NextRound)
        }
    }

    pub fn reset_game(&mut self, rng: &mut dyn RandomSource) {
        self.game = next_game();
        self.rounds_played = 0;
        self.score = 0;
        self.start_new_round(rng);
    }

    pub fn options(&self) -> &RoundOptions {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.options.correct_index
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn game(&self) -> u64 {
        self.game
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn input_locked(&self) -> bool {
        self.phase != Phase::AwaitingInput
    }

    pub fn is_game_over(&self) -> bool {
        self.rounds_played >= self.rules.rounds_per_session
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            game: self.game,
            options: self.options.countries.clone(),
            correct_index: self.options.correct_index,
            correct_country: self.options.correct().name().to_owned(),
            selection: self.selection,
            score: self.score,
            rounds_played: self.rounds_played,
            rounds_per_session: self.rules.rounds_per_session,
            phase: self.phase,
            game_over: self.is_game_over(),
        }
    }
}

fn draw_options(pool: &CountryPool, amount: usize, rng: &mut dyn RandomSource) -> RoundOptions {
    let picked = rng.sample_distinct(pool.len(), amount);
    debug_assert_eq!(picked.len(), amount);

    let countries: Vec<Country> = picked
        .iter()
        .filter_map(|&idx| pool.get(idx).cloned())
        .collect();
    let correct_index = rng.pick_index(countries.len());

    RoundOptions {
        countries,
        correct_index,
    }
}
