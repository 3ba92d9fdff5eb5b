use crate::events::ScoreUpdate;
use crate::store::{Store, StoreError};
use defuse_engine::game::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

/// Hash key holding one field per player.
pub const PLAYERS_KEY: &str = "players";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub username: PlayerId,
    pub score: i64,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Stored score for {player} is not an integer: {raw:?}")]
    InvalidScore { player: PlayerId, raw: String },
}

/// Durable per-player score counter, floored at zero.
///
/// Updates for the same player are serialized behind a per-player lock, so
/// the read-clamp-write sequence never loses a concurrent update. Updates for
/// different players proceed independently.
#[derive(Debug)]
pub struct ScoreLedger {
    store: Arc<dyn Store>,
    locks: Mutex<HashMap<PlayerId, Arc<Mutex<()>>>>,
}

impl ScoreLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Adds `delta` to the player's score and clamps the result at zero.
    pub fn apply_delta(&self, player: &str, delta: i64) -> Result<ScoreUpdate, LedgerError> {
        let lock = self.player_lock(player);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = self.read(player)?.unwrap_or(0);
        let score = previous.saturating_add(delta).max(0);
        self.store.hset(PLAYERS_KEY, player, score.to_string())?;

        info!(player, delta, previous, score, "score updated");
        Ok(ScoreUpdate::new(player, score, previous))
    }

    /// Creates a zero record for a player that has none yet.
    pub fn ensure_player(&self, player: &str) -> Result<(), LedgerError> {
        let lock = self.player_lock(player);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.read(player)?.is_none() {
            self.store.hset(PLAYERS_KEY, player, "0".to_string())?;
            debug!(player, "player record created");
        }
        Ok(())
    }

    pub fn score(&self, player: &str) -> Result<i64, LedgerError> {
        Ok(self.read(player)?.unwrap_or(0))
    }

    /// Every recorded player, in no particular order.
    pub fn list_scores(&self) -> Result<Vec<PlayerScore>, LedgerError> {
        self.store
            .hgetall(PLAYERS_KEY)?
            .into_iter()
            .map(|(username, raw)| {
                let score = parse_score(&username, &raw)?;
                Ok(PlayerScore { username, score })
            })
            .collect()
    }

    fn read(&self, player: &str) -> Result<Option<i64>, LedgerError> {
        match self.store.hget(PLAYERS_KEY, player)? {
            Some(raw) => parse_score(player, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn player_lock(&self, player: &str) -> Arc<Mutex<()>> {
        let mut guard = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(guard.entry(player.to_string()).or_default())
    }
}

fn parse_score(player: &str, raw: &str) -> Result<i64, LedgerError> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.trim()
        .parse()
        .map_err(|_| LedgerError::InvalidScore {
            player: player.to_string(),
            raw: raw.to_string(),
        })
}
