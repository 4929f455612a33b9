use state::QuizState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod commands;
pub mod config;
pub mod game;
pub mod keyboard;
pub mod registry;
pub mod runner;
pub mod schema;
pub mod session;
pub mod state;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
