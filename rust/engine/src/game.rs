//! Single-player game session and its draw-resolution state machine.
//!
//! A session is plain data: it is loaded, resolved against one draw and handed
//! back for persistence. Resolution never mutates the session it is called on;
//! the resulting session travels inside the returned [`DrawOutcome`].

use crate::cards::{Card, CardKind};
use crate::deck::Deck;
use crate::errors::GameError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = String;
pub type PlayerId = String;

pub const DEFUSE_POINTS: i64 = 1;
pub const EXPLODE_POINTS: i64 = -1;
pub const WIN_POINTS: i64 = 2;

/// Lifecycle of a session, named by its last resolution outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Active,
    Won,
    Lost,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Won | SessionState::Lost)
    }
}

/// Status tag reported for a single draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    Continue,
    Defused,
    Exploded,
    Shuffled,
    Won,
}

impl DrawStatus {
    /// Score change this status carries, `None` for non-scoring draws.
    pub fn score_delta(&self) -> Option<i64> {
        match self {
            DrawStatus::Defused => Some(DEFUSE_POINTS),
            DrawStatus::Exploded => Some(EXPLODE_POINTS),
            DrawStatus::Won => Some(WIN_POINTS),
            DrawStatus::Continue | DrawStatus::Shuffled => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrawStatus::Continue => "continue",
            DrawStatus::Defused => "defused",
            DrawStatus::Exploded => "exploded",
            DrawStatus::Shuffled => "shuffled",
            DrawStatus::Won => "won",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    id: SessionId,
    #[serde(rename = "username")]
    owner: PlayerId,
    deck: Deck,
    has_defuse: bool,
    points: i64,
    #[serde(default)]
    state: SessionState,
}

impl GameSession {
    /// Starts a game for `owner` with a freshly shuffled deck and a new id.
    pub fn new<R: Rng + ?Sized>(owner: impl Into<PlayerId>, rng: &mut R) -> Self {
        Self::with_deck(Uuid::new_v4().to_string(), owner, Deck::new(rng))
    }

    pub fn with_deck(id: impl Into<SessionId>, owner: impl Into<PlayerId>, deck: Deck) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            deck,
            has_defuse: false,
            points: 0,
            state: SessionState::Active,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn owner(&self) -> &PlayerId {
        &self.owner
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn has_defuse(&self) -> bool {
        self.has_defuse
    }

    /// Sum of the score deltas earned within this session.
    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Draws the front card and resolves it.
    ///
    /// Fails with [`GameError::EmptyDeck`] when nothing is left to draw. A
    /// shuffle card replaces the whole session, drawing fresh randomness from
    /// `rng`; every other kind mutates a copy of this session.
    pub fn resolve_draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Draw, GameError> {
        let mut next = self.clone();
        let card = next.deck.draw().ok_or(GameError::EmptyDeck)?;

        let outcome = match card.kind {
            CardKind::Bomb if next.has_defuse => {
                next.has_defuse = false;
                next.into_scored(DrawStatus::Defused)
            }
            CardKind::Bomb => {
                next.state = SessionState::Lost;
                next.into_scored(DrawStatus::Exploded)
            }
            CardKind::Defuse => {
                next.has_defuse = true;
                DrawOutcome::Continue(next)
            }
            CardKind::Shuffle => DrawOutcome::Replaced(GameSession::new(next.owner, rng)),
            CardKind::Cat if next.deck.is_empty() => {
                next.state = SessionState::Won;
                next.into_scored(DrawStatus::Won)
            }
            CardKind::Cat => DrawOutcome::Continue(next),
        };

        Ok(Draw { card, outcome })
    }

    fn into_scored(mut self, status: DrawStatus) -> DrawOutcome {
        if let Some(delta) = status.score_delta() {
            self.points += delta;
        }
        DrawOutcome::Scored {
            status,
            session: self,
        }
    }
}

/// One resolved draw: the card taken and what it did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub card: Card,
    pub outcome: DrawOutcome,
}

impl Draw {
    pub fn status(&self) -> DrawStatus {
        self.outcome.status()
    }
}

/// Session produced by a draw. Callers persist whichever session is carried
/// here, which for `Replaced` has a different id than the one drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    Continue(GameSession),
    Replaced(GameSession),
    Scored {
        status: DrawStatus,
        session: GameSession,
    },
}

impl DrawOutcome {
    pub fn status(&self) -> DrawStatus {
        match self {
            DrawOutcome::Continue(_) => DrawStatus::Continue,
            DrawOutcome::Replaced(_) => DrawStatus::Shuffled,
            DrawOutcome::Scored { status, .. } => *status,
        }
    }

    pub fn score_delta(&self) -> Option<i64> {
        self.status().score_delta()
    }

    pub fn session(&self) -> &GameSession {
        match self {
            DrawOutcome::Continue(session)
            | DrawOutcome::Replaced(session)
            | DrawOutcome::Scored { session, .. } => session,
        }
    }

    pub fn into_session(self) -> GameSession {
        match self {
            DrawOutcome::Continue(session)
            | DrawOutcome::Replaced(session)
            | DrawOutcome::Scored { session, .. } => session,
        }
    }
}
