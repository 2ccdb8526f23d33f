use miette::Diagnostic;
use thiserror::Error;

pub type PromptResult<T> = Result<T, PromptError>;

#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("prompt book validation failed: {0}")]
    #[diagnostic(code("prompt.invalid_book"))]
    InvalidBook(String),
    #[error("choice index out of range")]
    #[diagnostic(code("prompt.invalid_choice"))]
    ChoiceOutOfRange,
    #[error("no dialog active for player {0}")]
    #[diagnostic(code("prompt.no_dialog"))]
    NoActiveDialog(usize),
    #[error("player index {0} out of range")]
    #[diagnostic(code("prompt.invalid_player"))]
    PlayerOutOfRange(usize),
    #[error("resource limit exceeded: {0}")]
    #[diagnostic(code("prompt.resource_limit"))]
    ResourceLimit(String),
    #[error("serialization error: {0}")]
    #[diagnostic(code("prompt.serialization"))]
    Serialization(String),
}
