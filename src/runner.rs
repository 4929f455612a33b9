use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, Message, ParseMode, ReplyMarkup},
    utils::html,
    Bot,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    game::{Feedback, Snapshot},
    keyboard::{feedback_keyboard, flags_keyboard, play_again_keyboard, Pick, PLAY},
    registry::SessionRegistry,
    session::SessionEvent,
    state::QuizState,
    HandlerResult, UserDialogue,
};

pub(crate) fn round_text(snapshot: &Snapshot) -> String {
    format!(
        "Round {}/{}\nTap the flag of\n<b>{}</b>\n\nScore: {}",
        snapshot.rounds_played + 1,
        snapshot.rounds_per_session,
        html::escape(&snapshot.correct_country),
        snapshot.score
    )
}

pub(crate) fn feedback_text(feedback: &Feedback, rounds_per_session: u32) -> String {
    let verdict = if feedback.is_correct() {
        format!(
            "✅ Correct! That's the flag of <b>{}</b>.",
            html::escape(feedback.answer().name())
        )
    } else {
        format!(
            "❌ Wrong! That's the flag of <b>{}</b>.",
            html::escape(feedback.chosen().name())
        )
    };

    format!(
        "Round {}/{}\n{}\n\nScore: {}",
        feedback.round, rounds_per_session, verdict, feedback.score
    )
}

pub(crate) fn summary_text(snapshot: &Snapshot) -> String {
    format!(
        "<b>Game Over</b>\nYou guessed {} flags right out of {}",
        snapshot.score, snapshot.rounds_per_session
    )
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn play(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    registry: Arc<SessionRegistry>,
) -> HandlerResult {
    start_game(&bot, msg.chat.id, dialogue, &registry).await
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn idle(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    registry: Arc<SessionRegistry>,
) -> HandlerResult {
    match msg.text() {
        Some(PLAY) | Some("Play") | Some("play") => {
            start_game(&bot, msg.chat.id, dialogue, &registry).await?;
        }
        other => {
            info!(chat = msg.chat.id.0, "invalid input '{:?}'", other);
            bot.send_message(
                msg.chat.id,
                "Unable to handle the message. Enter /help to see usages.",
            )
            .await?;
        }
    }
    Ok(())
}

pub(crate) async fn playing(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Tap one of the flags above, or send /cancel to stop.",
    )
    .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn take_answer(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    registry: Arc<SessionRegistry>,
) -> HandlerResult {
    let Some(chat_id) = q.chat_id() else {
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };

    match q.data.as_deref().map(str::parse::<Pick>) {
        Some(Ok(Pick::Flag { game, round, index })) => {
            let Some(session) = registry.get(chat_id).await else {
                bot.answer_callback_query(&q.id)
                    .text("No game in progress. Send /play.")
                    .await?;
                return Ok(());
            };

            let Some(feedback) = session.submit_choice_in_round(game, round, index).await else {
                bot.answer_callback_query(&q.id)
                    .text("Wait for the next round.")
                    .await?;
                return Ok(());
            };

            bot.answer_callback_query(&q.id).await?;
            if let Some(message) = &q.message {
                let rounds = registry.config().rules.rounds_per_session;
                bot.edit_message_text(chat_id, message.id(), feedback_text(&feedback, rounds))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(feedback_keyboard(&feedback))
                    .await?;
            }
        }
        Some(Ok(Pick::PlayAgain)) => {
            let Some(session) = registry.get(chat_id).await else {
                bot.answer_callback_query(&q.id).await?;
                return start_game(&bot, chat_id, dialogue, &registry).await;
            };

            if session.snapshot().await.game_over {
                bot.answer_callback_query(&q.id).await?;
                // The renderer posts the first round of the new game.
                session.reset_game().await;
                dialogue.update(QuizState::Playing).await?;
            } else {
                bot.answer_callback_query(&q.id)
                    .text("A game is already running.")
                    .await?;
            }
        }
        other => {
            warn!(chat = chat_id.0, "unexpected callback data {:?}", other);
            bot.answer_callback_query(&q.id).await?;
        }
    }

    Ok(())
}

async fn start_game(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: UserDialogue,
    registry: &Arc<SessionRegistry>,
) -> HandlerResult {
    let (session, events) = registry.start(chat_id).await?;
    info!(chat = chat_id.0, session = %session.id(), "starting a game");

    bot.send_message(chat_id, "Let's begin!")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    send_round(bot, chat_id, &session.snapshot().await).await?;
    dialogue.update(QuizState::Playing).await?;

    spawn_renderer(bot.clone(), chat_id, dialogue, registry.clone(), session.id(), events);
    Ok(())
}

async fn send_round(bot: &Bot, chat_id: ChatId, snapshot: &Snapshot) -> HandlerResult {
    bot.send_message(chat_id, round_text(snapshot))
        .parse_mode(ParseMode::Html)
        .reply_markup(flags_keyboard(snapshot))
        .await?;
    Ok(())
}

/// Posts what the session publishes after each feedback interval. Stops once
/// the session is dropped. A finished session leaves the registry right after
/// its summary, so "Play Again" usually starts a new one.
fn spawn_renderer(
    bot: Bot,
    chat_id: ChatId,
    dialogue: UserDialogue,
    registry: Arc<SessionRegistry>,
    session: Uuid,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let finished = matches!(event, SessionEvent::SessionOver(_));
            if let Err(err) = render(&bot, chat_id, &dialogue, event).await {
                warn!(chat = chat_id.0, "failed to render session event: {err}");
            }
            if finished {
                registry.end_finished(chat_id, session).await;
            }
        }
        debug!(chat = chat_id.0, "renderer stopped");
    });
}

async fn render(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    event: SessionEvent,
) -> HandlerResult {
    match event {
        SessionEvent::RoundStarted(snapshot) => {
            send_round(bot, chat_id, &snapshot).await?;
        }
        SessionEvent::SessionOver(snapshot) => {
            bot.send_message(chat_id, summary_text(&snapshot))
                .parse_mode(ParseMode::Html)
                .reply_markup(play_again_keyboard())
                .await?;
            dialogue.update(QuizState::Finished).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Country, Phase};

    fn snapshot() -> Snapshot {
        Snapshot {
            game: 1,
            options: vec![
                Country::new("IE", "Ireland").unwrap(),
                Country::new("IT", "Italy").unwrap(),
                Country::new("GB", "UK & NI").unwrap(),
            ],
            correct_index: 2,
            correct_country: "UK & NI".to_owned(),
            selection: None,
            score: 3,
            rounds_played: 6,
            rounds_per_session: 10,
            phase: Phase::AwaitingInput,
            game_over: false,
        }
    }

    #[test]
    fn round_text_names_the_country() {
        assert_eq!(
            round_text(&snapshot()),
            "Round 7/10\nTap the flag of\n<b>UK &amp; NI</b>\n\nScore: 3"
        );
    }

    #[test]
    fn feedback_text_names_the_tapped_country_when_wrong() {
        let snapshot = snapshot();
        let wrong = Feedback {
            game: 1,
            round: 7,
            options: snapshot.options.clone(),
            choice: 1,
            correct_index: 2,
            score: 3,
        };
        assert!(feedback_text(&wrong, 10).contains("❌ Wrong! That's the flag of <b>Italy</b>."));

        let right = Feedback {
            choice: 2,
            score: 4,
            ..wrong
        };
        let text = feedback_text(&right, 10);
        assert!(text.starts_with("Round 7/10\n✅ Correct!"));
        assert!(text.ends_with("Score: 4"));
    }

    #[test]
    fn summary_reports_score_out_of_session_length() {
        let mut snapshot = snapshot();
        snapshot.score = 8;
        assert!(summary_text(&snapshot).ends_with("You guessed 8 flags right out of 10"));
    }
}
