use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{ConfigError, GameConfig};
use crate::game::{Feedback, GameState, RandomSource, RoundOutcome, Snapshot};

/// Published whenever the session moves on without a direct call from the
/// presentation layer, or after a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RoundStarted(Snapshot),
    SessionOver(Snapshot),
}

struct Shared {
    state: GameState,
    rng: Box<dyn RandomSource + Send>,
}

/// Owns one game and the deferred "advance after feedback" continuation.
///
/// Dropping the session turns any pending continuation into a no-op.
pub struct Session {
    id: Uuid,
    shared: Arc<Mutex<Shared>>,
    feedback_delay: Duration,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    pub fn new(
        config: &GameConfig,
        mut rng: Box<dyn RandomSource + Send>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), ConfigError> {
        let state = GameState::new(Arc::new(config.pool.clone()), config.rules, rng.as_mut())?;
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            id: Uuid::new_v4(),
            shared: Arc::new(Mutex::new(Shared {
                state,
                rng,
            })),
            feedback_delay: config.feedback_delay,
            events,
        };
        info!(session = %session.id, "session created");

        Ok((session, receiver))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.shared.lock().await.state.snapshot()
    }

    /// Applies a tap and schedules the advance. `None` means the tap was
    /// ignored and nothing was scheduled.
    #[instrument(level = "debug", skip(self), fields(session = %self.id))]
    pub async fn submit_choice(&self, choice: usize) -> Option<Feedback> {
        let mut shared = self.shared.lock().await;
        self.accept(&mut shared, choice)
    }

    /// Like [`Session::submit_choice`], but ignores taps aimed at another
    /// game or at a round other than the current one (1-based), and indices
    /// outside the round. Meant for input that arrives from outside the
    /// process.
    #[instrument(level = "debug", skip(self), fields(session = %self.id))]
    pub async fn submit_choice_in_round(
        &self,
        game: u64,
        round: u32,
        choice: usize,
    ) -> Option<Feedback> {
        let mut shared = self.shared.lock().await;
        if shared.state.game() != game || shared.state.rounds_played() + 1 != round {
            debug!("ignoring stale tap");
            return None;
        }
        if choice >= shared.state.options().len() {
            warn!("ignoring tap outside the round");
            return None;
        }
        self.accept(&mut shared, choice)
    }

    fn accept(&self, shared: &mut Shared, choice: usize) -> Option<Feedback> {
        let feedback = shared.state.submit_choice(choice)?;
        info!(
            round = feedback.round,
            correct = feedback.is_correct(),
            score = feedback.score,
            "choice accepted"
        );

        self.schedule_advance(shared.state.game());
        Some(feedback)
    }

    #[instrument(level = "debug", skip(self), fields(session = %self.id))]
    pub async fn reset_game(&self) -> Snapshot {
        let mut guard = self.shared.lock().await;
        let shared = &mut *guard;
        shared.state.reset_game(shared.rng.as_mut());
        let snapshot = shared.state.snapshot();
        info!("session reset");

        let _ = self.events.send(SessionEvent::RoundStarted(snapshot.clone()));
        snapshot
    }

    /// The advance only applies while the state is still on `game`; a reset
    /// in between starts a new game and turns it into a no-op.
    fn schedule_advance(&self, game: u64) {
        let shared = Arc::downgrade(&self.shared);
        let events = self.events.clone();
        let delay = self.feedback_delay;
        let id = self.id;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            advance(shared, game, events, id).await;
        });
    }
}

async fn advance(
    shared: Weak<Mutex<Shared>>,
    game: u64,
    events: mpsc::UnboundedSender<SessionEvent>,
    id: Uuid,
) {
    let Some(shared) = shared.upgrade() else {
        debug!(session = %id, "session dropped before feedback ended");
        return;
    };
    let mut guard = shared.lock().await;
    let shared = &mut *guard;
    if shared.state.game() != game {
        debug!(session = %id, "session reset before feedback ended");
        return;
    }

    let event = match shared.state.finish_round(shared.rng.as_mut()) {
        Some(RoundOutcome::NextRound) => SessionEvent::RoundStarted(shared.state.snapshot()),
        Some(RoundOutcome::SessionOver) => {
            info!(
                session = %id,
                score = shared.state.score(),
                rounds = shared.state.rounds_played(),
                "session over"
            );
            SessionEvent::SessionOver(shared.state.snapshot())
        }
        None => return,
    };
    // The receiver is gone once the presentation layer stops listening.
    let _ = events.send(event);
}
