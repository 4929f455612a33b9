use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters, prelude::Requester, types::Message, utils::command::BotCommands,
    Bot,
};
use tracing::{info, instrument};

use crate::{
    keyboard::start_keyboard, registry::SessionRegistry, state::QuizState, HandlerResult,
    UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the bot")]
    Start,
    #[command(description = "play a new game of ten rounds")]
    Play,
    #[command(description = "show the score of the current game")]
    Score,
    #[command(description = "abandon the current game")]
    Cancel,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn start(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    registry: Arc<SessionRegistry>,
) -> HandlerResult {
    if let Some(session) = registry.end(msg.chat.id).await {
        info!(chat = msg.chat.id.0, session = %session.id(), "game abandoned by /start");
    }
    bot.send_message(
        msg.chat.id,
        "Guess The Flag! I name a country, you tap its flag. Ready?",
    )
    .reply_markup(start_keyboard())
    .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    registry: Arc<SessionRegistry>,
) -> HandlerResult {
    match registry.end(msg.chat.id).await {
        Some(session) => {
            info!(chat = msg.chat.id.0, session = %session.id(), "game abandoned");
            bot.send_message(msg.chat.id, "Game cancelled.")
                .reply_markup(start_keyboard())
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "No game in progress.").await?;
        }
    }
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

pub(crate) async fn score(
    bot: Bot,
    msg: Message,
    registry: Arc<SessionRegistry>,
) -> HandlerResult {
    let text = match registry.get(msg.chat.id).await {
        Some(session) => {
            let snapshot = session.snapshot().await;
            format!(
                "Score: {} after {} of {} rounds",
                snapshot.score, snapshot.rounds_played, snapshot.rounds_per_session
            )
        }
        None => "No game in progress. Send /play to start one.".to_owned(),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}
