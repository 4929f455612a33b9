//! Round and session flow driven through the public API.

use std::time::Duration;

use flagquizbot::config::{ConfigError, GameConfig};
use flagquizbot::game::{Country, Phase, RandomSource, ScriptedRandom, StdRandom};
use flagquizbot::session::{Session, SessionEvent};

fn abcd() -> GameConfig {
    GameConfig::from_lookup(|key| match key {
        "QUIZ_COUNTRIES" => Some("AA=A,BB=B,CC=C,DD=D".to_owned()),
        _ => None,
    })
    .unwrap()
}

/// Options [B, C, D] with C correct, then whatever the rotation yields.
fn forced_first_round() -> Box<dyn RandomSource + Send> {
    Box::new(ScriptedRandom::new().with_round(vec![1, 2, 3], 1))
}

fn names(options: &[Country]) -> Vec<&str> {
    options.iter().map(Country::name).collect()
}

#[tokio::test(start_paused = true)]
async fn correct_tap_scores_and_advances_after_delay() {
    let (session, mut events) = Session::new(&abcd(), forced_first_round()).unwrap();
    let first = session.snapshot().await;
    assert_eq!(names(&first.options), ["B", "C", "D"]);
    assert_eq!(first.correct_index, 1);

    let feedback = session.submit_choice(1).await.unwrap();
    assert!(feedback.is_correct());

    let showing = session.snapshot().await;
    assert_eq!(showing.selection, Some(1));
    assert_eq!(showing.phase, Phase::ShowingFeedback);
    assert_eq!(showing.score, 1);

    let Some(SessionEvent::RoundStarted(next)) = events.recv().await else {
        panic!("expected the next round");
    };
    assert_eq!(next.rounds_played, 1);
    assert_eq!(next.phase, Phase::AwaitingInput);
    assert_eq!(next.selection, None);
    assert_eq!(next.score, 1);
    assert_eq!(next.options.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn wrong_tap_keeps_score() {
    let (session, mut events) = Session::new(&abcd(), forced_first_round()).unwrap();

    let feedback = session.submit_choice(0).await.unwrap();
    assert!(!feedback.is_correct());
    assert_eq!(feedback.chosen().name(), "B");
    assert_eq!(feedback.answer().name(), "C");

    let Some(SessionEvent::RoundStarted(next)) = events.recv().await else {
        panic!("expected the next round");
    };
    assert_eq!(next.score, 0);
    assert_eq!(next.rounds_played, 1);
}

#[tokio::test(start_paused = true)]
async fn ten_correct_taps_end_the_session() {
    let (session, mut events) =
        Session::new(&abcd(), Box::new(StdRandom::seeded(2022))).unwrap();

    for round in 1..=10 {
        let snapshot = session.snapshot().await;
        session.submit_choice(snapshot.correct_index).await.unwrap();

        match events.recv().await {
            Some(SessionEvent::RoundStarted(next)) if round < 10 => {
                assert_eq!(next.rounds_played, round);
            }
            Some(SessionEvent::SessionOver(last)) if round == 10 => {
                assert_eq!(last.score, 10);
                assert_eq!(last.rounds_played, 10);
                assert!(last.game_over);
                assert_eq!(last.phase, Phase::SessionOver);
            }
            other => panic!("round {round}: unexpected {other:?}"),
        }
    }

    let over = session.snapshot().await;
    assert_eq!(session.submit_choice(over.correct_index).await, None);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(session.snapshot().await, over);
}

#[tokio::test(start_paused = true)]
async fn double_tap_counts_once() {
    let (session, mut events) = Session::new(&abcd(), forced_first_round()).unwrap();

    assert!(session.submit_choice(1).await.is_some());
    assert_eq!(session.submit_choice(1).await, None);
    assert_eq!(session.submit_choice(0).await, None);
    assert_eq!(session.snapshot().await.selection, Some(1));

    let Some(SessionEvent::RoundStarted(next)) = events.recv().await else {
        panic!("expected the next round");
    };
    assert_eq!(next.rounds_played, 1);
    assert_eq!(next.score, 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(session.snapshot().await.rounds_played, 1);
}

#[tokio::test(start_paused = true)]
async fn play_again_after_game_over_starts_fresh() {
    let (session, mut events) = Session::new(&abcd(), Box::new(StdRandom::seeded(5))).unwrap();
    for _ in 0..10 {
        session.submit_choice(0).await.unwrap();
        events.recv().await.unwrap();
    }
    assert!(session.snapshot().await.game_over);

    let fresh = session.reset_game().await;
    assert_eq!(fresh.rounds_played, 0);
    assert_eq!(fresh.score, 0);
    assert_eq!(fresh.selection, None);
    assert_eq!(fresh.phase, Phase::AwaitingInput);
    assert!(!fresh.game_over);
    assert_eq!(events.recv().await, Some(SessionEvent::RoundStarted(fresh)));
}

#[test]
fn pool_smaller_than_a_round_is_rejected() {
    let err = GameConfig::from_lookup(|key| match key {
        "QUIZ_COUNTRIES" => Some("AA=A,BB=B".to_owned()),
        _ => None,
    })
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::PoolTooSmall {
            available: 2,
            required: 3
        }
    );
}
