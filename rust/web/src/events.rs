use defuse_engine::game::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

pub type ConnectionId = u64;
pub type EventSender = mpsc::UnboundedSender<ScoreUpdate>;
pub type EventReceiver = mpsc::UnboundedReceiver<ScoreUpdate>;

/// Score change pushed to every live client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "score_update")]
pub struct ScoreUpdate {
    pub username: PlayerId,
    pub score: i64,
    pub previous: i64,
}

impl ScoreUpdate {
    pub fn new(username: impl Into<PlayerId>, score: i64, previous: i64) -> Self {
        Self {
            username: username.into(),
            score,
            previous,
        }
    }
}

/// Registry side of a live channel.
#[derive(Debug)]
pub struct LiveSink {
    events: EventSender,
    close: oneshot::Sender<()>,
}

impl LiveSink {
    fn close(self) {
        let _ = self.close.send(());
    }
}

/// Client side of a live channel. Ends when the registry drops or displaces
/// its entry.
#[derive(Debug)]
pub struct LiveSubscription {
    id: ConnectionId,
    events: EventReceiver,
    closed: Option<oneshot::Receiver<()>>,
}

impl LiveSubscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Already-delivered event, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<ScoreUpdate> {
        self.events.try_recv().ok()
    }

    /// Next pushed event, or `None` once the channel has been closed.
    pub async fn recv(&mut self) -> Option<ScoreUpdate> {
        let Some(closed) = self.closed.as_mut() else {
            return self.events.recv().await;
        };
        tokio::select! {
            biased;
            event = self.events.recv() => event,
            _ = closed => {
                self.closed = None;
                self.events.close();
                None
            }
        }
    }
}

/// Creates both ends of an unregistered live channel.
pub fn live_channel() -> (LiveSink, EventReceiver, oneshot::Receiver<()>) {
    let (events, rx) = mpsc::unbounded_channel();
    let (close, closed) = oneshot::channel();
    (LiveSink { events, close }, rx, closed)
}

#[derive(Debug)]
struct Connection {
    id: ConnectionId,
    sink: LiveSink,
}

/// Player to live-channel mapping with fan-out to every registered channel.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<PlayerId, Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh channel for `player` and returns its client side.
    pub fn subscribe(&self, player: impl Into<PlayerId>) -> LiveSubscription {
        let player = player.into();
        let (sink, events, closed) = live_channel();
        let id = self.register(player, sink);
        LiveSubscription {
            id,
            events,
            closed: Some(closed),
        }
    }

    /// Inserts or replaces the channel for `player`. A displaced channel is
    /// closed before this returns.
    pub fn register(&self, player: impl Into<PlayerId>, sink: LiveSink) -> ConnectionId {
        let player = player.into();
        let id = self.next_id.fetch_add(1, Ordering::AcqRel);
        let displaced = {
            let mut guard = self.write();
            guard.insert(player.clone(), Connection { id, sink })
        };
        if let Some(old) = displaced {
            info!(%player, old = old.id, new = id, "live connection displaced");
            old.sink.close();
        } else {
            info!(%player, connection = id, "live connection registered");
        }
        id
    }

    /// Removes the channel for `player`, whichever connection holds it.
    pub fn deregister(&self, player: &str) -> bool {
        let removed = self.write().remove(player);
        match removed {
            Some(conn) => {
                debug!(player, connection = conn.id, "live connection deregistered");
                conn.sink.close();
                true
            }
            None => false,
        }
    }

    /// Removes the channel for `player` only if it is still `id`, so a stale
    /// connection shutting down cannot evict its replacement.
    pub fn release(&self, player: &str, id: ConnectionId) -> bool {
        let removed = {
            let mut guard = self.write();
            match guard.get(player) {
                Some(conn) if conn.id == id => guard.remove(player),
                _ => None,
            }
        };
        match removed {
            Some(conn) => {
                debug!(player, connection = id, "live connection released");
                conn.sink.close();
                true
            }
            None => false,
        }
    }

    /// Delivers `event` to every registered channel and returns how many
    /// accepted it. Channels whose receiver is gone are dropped from the
    /// registry.
    pub fn broadcast(&self, event: &ScoreUpdate) -> usize {
        let targets: Vec<(PlayerId, ConnectionId, EventSender)> = {
            let guard = self.read();
            guard
                .iter()
                .map(|(player, conn)| (player.clone(), conn.id, conn.sink.events.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (player, id, sender) in targets {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                warn!(%player, connection = id, "live delivery failed; dropping connection");
                failed.push((player, id));
            }
        }
        for (player, id) in failed {
            self.release(&player, id);
        }
        delivered
    }

    /// Closes and removes every channel.
    pub fn close_all(&self) -> usize {
        let drained: Vec<Connection> = self.write().drain().map(|(_, conn)| conn).collect();
        let count = drained.len();
        for conn in drained {
            conn.sink.close();
        }
        count
    }

    pub fn connection_count(&self) -> usize {
        self.read().len()
    }

    pub fn is_registered(&self, player: &str) -> bool {
        self.read().contains_key(player)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<PlayerId, Connection>> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<PlayerId, Connection>> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
