pub mod country;
pub mod random;
pub mod state;

pub use country::{Country, CountryPool};
pub use random::{RandomSource, ScriptedRandom, StdRandom};
pub use state::{Feedback, GameState, Phase, RoundOptions, RoundOutcome, Snapshot};
