use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("No cards left in deck")]
    EmptyDeck,
}
