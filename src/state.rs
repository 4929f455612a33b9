/// Per-chat dialogue state. Game data itself lives in the session registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuizState {
    #[default]
    Start,
    Playing,
    Finished,
}
