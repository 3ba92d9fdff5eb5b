use crate::events::ConnectionRegistry;
use crate::handlers;
use crate::ledger::ScoreLedger;
use crate::session::{SessionError, SessionManager, SessionStore, DEFAULT_SESSION_TTL};
use crate::store::{MemoryStore, Store};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use warp::http::{header, Method};
use warp::{Filter, Reply};

pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    session_ttl: Duration,
    allowed_origins: Vec<String>,
    purge_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", 8080)
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            session_ttl: DEFAULT_SESSION_TTL,
            allowed_origins: vec!["*".to_string()],
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }

    pub fn for_tests() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn purge_interval(&self) -> Duration {
        self.purge_interval
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.session_ttl.is_zero() {
            return Err(ServerError::ConfigError("session_ttl must be >0".into()));
        }
        if self.purge_interval.is_zero() {
            return Err(ServerError::ConfigError("purge_interval must be >0".into()));
        }
        if self.allowed_origins.is_empty() {
            return Err(ServerError::ConfigError(
                "allowed_origins must not be empty".into(),
            ));
        }
        for origin in &self.allowed_origins {
            let scheme_ok = origin.starts_with("http://") || origin.starts_with("https://");
            if origin != "*" && !scheme_ok {
                return Err(ServerError::ConfigError(format!(
                    "invalid origin {:?}: expected * or http(s)://host",
                    origin
                )));
            }
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ServerError::ConfigError(format!("invalid host {:?}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

#[derive(Debug, Clone)]
pub struct AppContext {
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    sessions: Arc<SessionManager>,
}

impl AppContext {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let ledger = Arc::new(ScoreLedger::new(Arc::clone(&store)));
        let sessions = Arc::new(SessionManager::new(
            SessionStore::new(store, config.session_ttl()),
            ledger,
            Arc::clone(&registry),
        ));
        Ok(Self::new_with_dependencies(config, registry, sessions))
    }

    pub fn new_with_dependencies(
        config: ServerConfig,
        registry: Arc<ConnectionRegistry>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            config,
            registry,
            sessions,
        }
    }

    pub fn new_for_tests() -> Self {
        Self::new(ServerConfig::for_tests()).expect("test context")
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }
}

/// Every HTTP and WebSocket route, with CORS, request tracing and JSON
/// rejection bodies applied.
pub fn routes(
    ctx: &AppContext,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static {
    let sessions = ctx.sessions();
    let with_sessions = warp::any().map(move || Arc::clone(&sessions));
    let registry = ctx.registry();
    let with_registry = warp::any().map(move || Arc::clone(&registry));

    let health = warp::path!("healthz").and(warp::get()).map(|| "ok");

    let new_game = warp::path!("api" / "game" / "new")
        .and(warp::post())
        .and(with_sessions.clone())
        .and(warp::body::json())
        .then(handlers::game::new_game);

    let draw = warp::path!("api" / "game" / "draw")
        .and(warp::post())
        .and(with_sessions.clone())
        .and(warp::body::json())
        .then(handlers::game::draw_card);

    let resume = warp::path!("api" / "game" / "resume")
        .and(warp::post())
        .and(with_sessions.clone())
        .and(warp::body::json())
        .then(handlers::game::resume_game);

    let leaderboard = warp::path!("api" / "leaderboard")
        .and(warp::get())
        .and(with_sessions)
        .then(handlers::game::leaderboard);

    let live = warp::path!("ws")
        .and(warp::ws())
        .and(warp::query::<handlers::live::LiveQuery>())
        .and(with_registry)
        .map(handlers::live::upgrade);

    let cors = cors(ctx.config());

    health
        .or(new_game)
        .or(draw)
        .or(resume)
        .or(leaderboard)
        .or(live)
        .with(cors)
        .with(warp::trace::request())
        .recover(handlers::handle_rejection)
}

fn cors(config: &ServerConfig) -> warp::cors::Cors {
    let builder = warp::cors()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let builder = if config.allows_any_origin() {
        builder.allow_any_origin()
    } else {
        builder.allow_origins(config.allowed_origins().iter().map(String::as_str))
    };
    builder.build()
}

pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        Ok(Self {
            context: AppContext::new(config)?,
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Binds the listener and serves until [`ServerHandle::shutdown`].
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let addr = self.context.config().socket_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let (address, server) = warp::serve(routes(&self.context))
            .try_bind_with_graceful_shutdown(addr, async {
                let _ = shutdown_rx.await;
            })
            .map_err(|err| ServerError::BindError(err.to_string()))?;
        info!(%address, "server listening");

        let sessions = self.context.sessions();
        let interval = self.context.config().purge_interval();
        let purge = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                sessions.cleanup_expired_sessions();
            }
        });

        let registry = self.context.registry();
        let server = tokio::spawn(async move {
            server.await;
            let closed = registry.close_all();
            debug!(closed, "live connections closed");
        });

        Ok(ServerHandle {
            address,
            shutdown: shutdown_tx,
            server,
            purge,
        })
    }
}

pub struct ServerHandle {
    address: SocketAddr,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
    purge: JoinHandle<()>,
}

impl ServerHandle {
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub async fn shutdown(self) -> Result<(), ServerError> {
        let _ = self.shutdown.send(());
        self.purge.abort();
        self.server
            .await
            .map_err(|err| ServerError::Shutdown(err.to_string()))?;
        info!("server stopped");
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Session error: {0}")]
    SessionError(#[from] SessionError),
    #[error("Server task failed: {0}")]
    Shutdown(String),
}
