use defuse_web::server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub session_ttl_secs: u64,
    pub allowed_origins: Vec<String>,
    pub purge_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            session_ttl_secs: 24 * 60 * 60,
            allowed_origins: vec!["*".into()],
            purge_interval_secs: 60,
        }
    }
}

impl Config {
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig::new(self.host.clone(), self.port)
            .with_session_ttl(Duration::from_secs(self.session_ttl_secs))
            .with_allowed_origins(self.allowed_origins.iter().cloned())
            .with_purge_interval(Duration::from_secs(self.purge_interval_secs))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Defaults, then the TOML file named by `DEFUSE_CONFIG`, then environment
/// overrides.
pub fn load() -> Result<Config, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

pub fn load_from<F>(env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| env(key).filter(|v| !v.is_empty());

    let mut cfg = Config::default();
    if let Some(path) = var("DEFUSE_CONFIG") {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.host {
            cfg.host = v;
        }
        if let Some(v) = f.port {
            cfg.port = v;
        }
        if let Some(v) = f.session_ttl_secs {
            cfg.session_ttl_secs = v;
        }
        if let Some(v) = f.allowed_origins {
            cfg.allowed_origins = v;
        }
        if let Some(v) = f.purge_interval_secs {
            cfg.purge_interval_secs = v;
        }
    }

    if let Some(host) = var("DEFUSE_HOST") {
        cfg.host = host;
    }
    // plain PORT is honoured for hosting platforms; the prefixed name wins
    if let Some(port) = var("DEFUSE_PORT").or_else(|| var("PORT")) {
        cfg.port = port
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid port".into()))?;
    }
    if let Some(ttl) = var("DEFUSE_SESSION_TTL_SECS") {
        cfg.session_ttl_secs = ttl
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid session_ttl_secs".into()))?;
    }
    if let Some(origins) = var("DEFUSE_ALLOWED_ORIGINS") {
        cfg.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(secs) = var("DEFUSE_PURGE_SECS") {
        cfg.purge_interval_secs = secs
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid purge_interval_secs".into()))?;
    }

    validate(&cfg)?;
    Ok(cfg)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    session_ttl_secs: Option<u64>,
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    purge_interval_secs: Option<u64>,
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    cfg.to_server_config()
        .validate()
        .map_err(|err| ConfigError::Invalid(format!("Invalid configuration: {}", err)))
}
