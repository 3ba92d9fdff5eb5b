pub mod events;
pub mod handlers;
pub mod ledger;
pub mod server;
pub mod session;
pub mod store;

pub use events::{ConnectionRegistry, LiveSubscription, ScoreUpdate};
pub use ledger::{LedgerError, PlayerScore, ScoreLedger};
pub use server::{routes, AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use session::{DrawResult, SessionError, SessionId, SessionManager, SessionStore};
pub use store::{MemoryStore, Store, StoreError};
