//! defuse-engine: cards, deck and the draw-resolution state machine

pub mod cards;
pub mod deck;
pub mod errors;
pub mod game;
pub mod logger;

pub use cards::{Card, CardKind};
pub use deck::Deck;
pub use errors::GameError;
pub use game::{Draw, DrawOutcome, DrawStatus, GameSession, PlayerId, SessionId, SessionState};
