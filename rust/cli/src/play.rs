use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use defuse_engine::game::{DrawStatus, GameSession};
use defuse_engine::logger::{DrawLogger, DrawRecord};
use defuse_web::events::ConnectionRegistry;
use defuse_web::ledger::ScoreLedger;
use defuse_web::session::{SessionError, SessionManager, SessionStore, DEFAULT_SESSION_TTL};
use defuse_web::store::{MemoryStore, Store};

#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub player: String,
    pub seed: Option<u64>,
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaySummary {
    pub draws: u32,
    pub games: u32,
    pub score: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Plays a local game against an in-memory store, one command per input line.
pub fn play<R: BufRead>(
    opts: &PlayOptions,
    input: R,
    out: &mut dyn Write,
) -> Result<PlaySummary, PlayError> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let ledger = Arc::new(ScoreLedger::new(Arc::clone(&store)));
    let sessions = SessionStore::new(store, DEFAULT_SESSION_TTL);
    let manager = match opts.seed {
        Some(seed) => SessionManager::with_seed(sessions, ledger, Arc::clone(&registry), seed),
        None => SessionManager::new(sessions, ledger, Arc::clone(&registry)),
    };
    let mut logger = match &opts.log {
        Some(path) => Some(DrawLogger::create(path)?),
        None => None,
    };
    let mut live = registry.subscribe(opts.player.clone());

    let mut game = manager.create_session(&opts.player)?;
    let mut summary = PlaySummary {
        draws: 0,
        games: 1,
        score: 0,
    };
    writeln!(out, "Game {} started for {}", game.id(), game.owner())?;
    writeln!(out, "Commands: d=draw n=new s=score q=quit")?;

    for line in input.lines() {
        let line = line?;
        match line.trim() {
            "" | "d" | "draw" => {
                match manager.draw(game.id()) {
                    Ok(result) => {
                        summary.draws += 1;
                        writeln!(
                            out,
                            "Drew {}: {} ({} left)",
                            result.card.kind,
                            result.status.as_str(),
                            result.game.deck().len()
                        )?;
                        writeln!(out, "{}", describe(result.status, &result.game))?;
                        if let Some(logger) = logger.as_mut() {
                            let record = DrawRecord {
                                draw_id: logger.next_id(),
                                session_id: game.id().clone(),
                                player: game.owner().clone(),
                                card: result.card,
                                status: result.status,
                                remaining: result.game.deck().len(),
                                ts: None,
                            };
                            logger.write(&record)?;
                        }
                        game = result.game;
                    }
                    Err(SessionError::GameOver(_)) => {
                        writeln!(out, "Game over. Press n for a new game.")?;
                    }
                    Err(SessionError::EmptyDeck(_)) => {
                        writeln!(out, "No cards left. Press n for a new game.")?;
                    }
                    Err(err) => return Err(err.into()),
                }
                while let Some(update) = live.try_recv() {
                    writeln!(
                        out,
                        "[live] {}: {} -> {}",
                        update.username, update.previous, update.score
                    )?;
                }
            }
            "n" | "new" => {
                game = manager.create_session(&opts.player)?;
                summary.games += 1;
                writeln!(out, "Game {} started for {}", game.id(), game.owner())?;
            }
            "s" | "score" => {
                writeln!(
                    out,
                    "Score: {} = {}",
                    opts.player,
                    manager.score(&opts.player)?
                )?;
            }
            "q" | "quit" => break,
            other => {
                writeln!(out, "Unknown command: {} (d=draw n=new s=score q=quit)", other)?;
            }
        }
    }

    summary.score = manager.score(&opts.player)?;
    writeln!(out, "Final score: {} = {}", opts.player, summary.score)?;
    writeln!(out, "Draws: {} Games: {}", summary.draws, summary.games)?;
    Ok(summary)
}

fn describe(status: DrawStatus, game: &GameSession) -> String {
    match status {
        DrawStatus::Continue if game.has_defuse() => "You hold a defuse. Keep playing.".into(),
        DrawStatus::Continue => "Keep playing.".into(),
        DrawStatus::Defused => "Bomb defused! You can continue playing.".into(),
        DrawStatus::Exploded => "BOOM! Game over.".into(),
        DrawStatus::Won => "Congratulations! You won!".into(),
        DrawStatus::Shuffled => format!("Deck shuffled! New game {} started.", game.id()),
    }
}
