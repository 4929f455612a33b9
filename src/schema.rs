use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        UpdateFilterExt, UpdateHandler,
    },
    dptree,
    types::Update,
};

use crate::{
    commands::{cancel, help, score, start, Command},
    runner,
    state::QuizState,
};

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Play].endpoint(runner::play))
        .branch(case![Command::Score].endpoint(score))
        .branch(case![Command::Cancel].endpoint(cancel));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![QuizState::Start].endpoint(runner::idle))
        .branch(case![QuizState::Playing].endpoint(runner::playing))
        .branch(case![QuizState::Finished].endpoint(runner::idle));

    let callback_handler = Update::filter_callback_query().endpoint(runner::take_answer);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(message_handler)
        .branch(callback_handler)
}
