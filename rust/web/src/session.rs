use crate::events::ConnectionRegistry;
use crate::ledger::{LedgerError, PlayerScore, ScoreLedger};
use crate::store::{Store, StoreError};
use defuse_engine::cards::Card;
use defuse_engine::errors::GameError;
use defuse_engine::game::{DrawStatus, GameSession};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use defuse_engine::game::{PlayerId, SessionId};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const SESSION_KEY_PREFIX: &str = "game:";

/// Saves and loads session snapshots, each under its own expiring key.
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: Arc<dyn Store>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn key(id: &str) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, id)
    }

    /// Writes the snapshot and restarts its expiry.
    pub fn save(&self, session: &GameSession) -> Result<(), SessionError> {
        let data = serde_json::to_string(session)
            .map_err(|err| SessionError::Storage(err.to_string()))?;
        self.store
            .set(&Self::key(session.id()), data, Some(self.ttl))?;
        Ok(())
    }

    pub fn load(&self, id: &str) -> Result<GameSession, SessionError> {
        let key = Self::key(id);
        let data = self
            .store
            .get(&key)?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        serde_json::from_str(&data).map_err(|err| {
            SessionError::from(StoreError::Corrupt {
                key,
                reason: err.to_string(),
            })
        })
    }
}

/// Body of a draw response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawResult {
    pub game: GameSession,
    pub card: Card,
    pub status: DrawStatus,
}

/// Entry point for every game operation. Owns no game state itself: sessions
/// come from the store, scores from the ledger, and score changes go out
/// through the connection registry.
#[derive(Debug)]
pub struct SessionManager {
    sessions: SessionStore,
    ledger: Arc<ScoreLedger>,
    registry: Arc<ConnectionRegistry>,
    rng: Mutex<ChaCha8Rng>,
}

impl SessionManager {
    pub fn new(
        sessions: SessionStore,
        ledger: Arc<ScoreLedger>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self::with_rng(sessions, ledger, registry, ChaCha8Rng::from_entropy())
    }

    /// Same as [`SessionManager::new`] with reproducible deck shuffles.
    pub fn with_seed(
        sessions: SessionStore,
        ledger: Arc<ScoreLedger>,
        registry: Arc<ConnectionRegistry>,
        seed: u64,
    ) -> Self {
        Self::with_rng(sessions, ledger, registry, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(
        sessions: SessionStore,
        ledger: Arc<ScoreLedger>,
        registry: Arc<ConnectionRegistry>,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            sessions,
            ledger,
            registry,
            rng: Mutex::new(rng),
        }
    }

    pub fn create_session(&self, owner: &str) -> Result<GameSession, SessionError> {
        let owner = require("username", owner)?;
        let session = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            GameSession::new(owner, &mut *rng)
        };
        self.ledger.ensure_player(owner)?;
        self.sessions.save(&session)?;
        info!(session_id = %session.id(), player = owner, "game created");
        Ok(session)
    }

    pub fn resume(&self, session_id: &str) -> Result<GameSession, SessionError> {
        let session_id = require("gameId", session_id)?;
        self.sessions.load(session_id)
    }

    /// Draws the front card of a stored session.
    ///
    /// Scoring draws update the ledger and broadcast the change before the
    /// resulting session is saved; a failed save does not undo either.
    pub fn draw(&self, session_id: &str) -> Result<DrawResult, SessionError> {
        let session_id = require("gameId", session_id)?;
        let session = self.sessions.load(session_id)?;
        if session.state().is_terminal() {
            return Err(SessionError::GameOver(session_id.to_string()));
        }

        let draw = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            session.resolve_draw(&mut *rng)
        }
        .map_err(|err| match err {
            GameError::EmptyDeck => SessionError::EmptyDeck(session_id.to_string()),
        })?;

        let status = draw.status();
        debug!(session_id, card = %draw.card.kind, status = status.as_str(), "draw resolved");

        if let Some(delta) = draw.outcome.score_delta() {
            let update = self.ledger.apply_delta(session.owner(), delta)?;
            let delivered = self.registry.broadcast(&update);
            debug!(delivered, "score update broadcast");
        }

        let game = draw.outcome.into_session();
        if let Err(err) = self.sessions.save(&game) {
            warn!(session_id = %game.id(), error = %err, "failed to save session after draw");
            return Err(err);
        }

        Ok(DrawResult {
            game,
            card: draw.card,
            status,
        })
    }

    /// Leaderboard ordered by score, highest first, ties by name.
    pub fn leaderboard(&self) -> Result<Vec<PlayerScore>, SessionError> {
        let mut scores = self.ledger.list_scores()?;
        scores.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.username.cmp(&b.username)));
        Ok(scores)
    }

    pub fn score(&self, player: &str) -> Result<i64, SessionError> {
        Ok(self.ledger.score(player)?)
    }

    pub fn cleanup_expired_sessions(&self) -> usize {
        let purged = self.sessions.store.purge_expired();
        if purged > 0 {
            debug!(purged, "expired entries purged");
        }
        purged
    }

    pub fn ledger(&self) -> Arc<ScoreLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, SessionError> {
    let value = value.trim();
    if value.is_empty() {
        Err(SessionError::InvalidRequest(format!("{} is required", field)))
    } else {
        Ok(value)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Game not found: {0}")]
    NotFound(SessionId),
    #[error("Game is over: {0}")]
    GameOver(SessionId),
    #[error("No cards left in deck: {0}")]
    EmptyDeck(SessionId),
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Storage(err.to_string())
    }
}

impl From<LedgerError> for SessionError {
    fn from(err: LedgerError) -> Self {
        SessionError::Storage(err.to_string())
    }
}
