use crate::events::ConnectionRegistry;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use warp::ws::{Message, WebSocket, Ws};
use warp::Reply;

#[derive(Debug, Default, Deserialize)]
pub struct LiveQuery {
    #[serde(default)]
    pub username: Option<String>,
}

pub fn upgrade(ws: Ws, query: LiveQuery, registry: Arc<ConnectionRegistry>) -> impl Reply {
    ws.on_upgrade(move |socket| serve_live(socket, query.username, registry))
}

/// Pushes score updates to one client until either side closes. Frames sent
/// by the client are read and dropped.
async fn serve_live(socket: WebSocket, username: Option<String>, registry: Arc<ConnectionRegistry>) {
    let (mut tx, mut rx) = socket.split();

    let Some(player) = username
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
    else {
        debug!("live connection without username; closing");
        let _ = tx.close().await;
        return;
    };

    let mut subscription = registry.subscribe(player.clone());
    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(update) => {
                    let text = match serde_json::to_string(&update) {
                        Ok(text) => text,
                        Err(err) => {
                            warn!(error = %err, "failed to encode score update");
                            continue;
                        }
                    };
                    if let Err(err) = tx.send(Message::text(text)).await {
                        warn!(%player, error = %err, "live write failed");
                        break;
                    }
                }
                None => break,
            },
            incoming = rx.next() => match incoming {
                Some(Ok(msg)) if msg.is_close() => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(%player, error = %err, "live read failed");
                    break;
                }
                None => break,
            },
        }
    }

    registry.release(&player, subscription.id());
    let _ = tx.close().await;
    debug!(%player, "live connection closed");
}
