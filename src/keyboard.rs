use std::str::FromStr;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::game::{Feedback, Snapshot};

pub(crate) const PLAY: &str = "Play🏁";

const FLAG_PREFIX: &str = "flag";
const PLAY_AGAIN: &str = "again";

/// Decoded callback data of an inline button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pick {
    Flag { game: u64, round: u32, index: usize },
    PlayAgain,
}

impl Pick {
    pub(crate) fn encode(&self) -> String {
        match self {
            Pick::Flag { game, round, index } => {
                format!("{FLAG_PREFIX}:{game}:{round}:{index}")
            }
            Pick::PlayAgain => PLAY_AGAIN.to_owned(),
        }
    }
}

impl FromStr for Pick {
    type Err = String;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        if data == PLAY_AGAIN {
            return Ok(Pick::PlayAgain);
        }

        let fields: Vec<&str> = data.split(':').collect();
        match fields.as_slice() {
            [FLAG_PREFIX, game, round, index] => Ok(Pick::Flag {
                game: game.parse().map_err(|_| data.to_owned())?,
                round: round.parse().map_err(|_| data.to_owned())?,
                index: index.parse().map_err(|_| data.to_owned())?,
            }),
            _ => Err(data.to_owned()),
        }
    }
}

pub(crate) fn start_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(PLAY)]])
}

/// One flag per row, labelled with the flag only.
pub(crate) fn flags_keyboard(snapshot: &Snapshot) -> InlineKeyboardMarkup {
    let game = snapshot.game;
    let round = snapshot.rounds_played + 1;
    let keyboard: Vec<Vec<InlineKeyboardButton>> = snapshot
        .options
        .iter()
        .enumerate()
        .map(|(index, country)| {
            vec![InlineKeyboardButton::callback(
                country.flag(),
                Pick::Flag { game, round, index }.encode(),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

/// Same buttons as the round, with the answer and the tapped flag marked.
pub(crate) fn feedback_keyboard(feedback: &Feedback) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = feedback
        .options
        .iter()
        .enumerate()
        .map(|(index, country)| {
            let label = if index == feedback.correct_index {
                format!("✅ {}", country.flag())
            } else if index == feedback.choice {
                format!("❌ {} {}", country.flag(), country.name())
            } else {
                country.flag()
            };
            let data = Pick::Flag {
                game: feedback.game,
                round: feedback.round,
                index,
            };
            vec![InlineKeyboardButton::callback(label, data.encode())]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn play_again_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Play Again",
        Pick::PlayAgain.encode(),
    )]])
}
