//! Key/value persistence used for game sessions and the players hash.
//!
//! The [`Store`] trait mirrors the small slice of a Redis-style API the game
//! needs: plain values with optional expiry, and string hash fields.
//! [`MemoryStore`] is the in-process implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("Key {0} holds the wrong kind of value")]
    WrongType(String),
}

pub trait Store: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`. A `ttl` restarts the expiry clock on every write.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError>;

    fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    fn hset(&self, key: &str, field: &str, value: String) -> Result<(), StoreError>;

    fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// Drops expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize {
        0
    }
}

#[derive(Debug)]
enum Value {
    Text(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        match self.entries.read() {
            Ok(guard) => guard.values().filter(|e| !e.is_expired(now)).count(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.entries.read().map_err(|_| poisoned())?;
        match guard.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => Ok(None),
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut guard = self.entries.write().map_err(|_| poisoned())?;
        guard.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let guard = self.entries.read().map_err(|_| poisoned())?;
        match guard.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => Ok(None),
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    fn hset(&self, key: &str, field: &str, value: String) -> Result<(), StoreError> {
        let mut guard = self.entries.write().map_err(|_| poisoned())?;
        let now = Instant::now();
        if guard.get(key).map_or(false, |entry| entry.is_expired(now)) {
            guard.remove(key);
        }
        let entry = guard.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Hash(fields) => {
                fields.insert(field.to_string(), value);
                Ok(())
            }
            Value::Text(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        let guard = self.entries.read().map_err(|_| poisoned())?;
        match guard.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => Ok(Vec::new()),
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn purge_expired(&self) -> usize {
        let mut guard = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, entry| !entry.is_expired(now));
        before - guard.len()
    }
}
