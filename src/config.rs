use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::info;

pub const DEFAULT_COMMENTARY_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub battle: BattleConfig,
    pub commentary: CommentaryConfig,
    pub catalog: CatalogConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BattleConfig {
    pub enemy_think_delay_ms: u64,
    pub capture_reveal_delay_ms: u64,
    pub log_capacity: usize,
    pub snapshot_channel_size: usize,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct CommentaryConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_ms: u64,
}

// Keeps the API key out of the startup log
impl std::fmt::Debug for CommentaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentaryConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    pub inactive_timeout_sec: u64,
    pub sweep_interval_sec: u64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        BattleConfig {
            enemy_think_delay_ms: 1500,
            capture_reveal_delay_ms: 1000,
            log_capacity: 5,
            snapshot_channel_size: 32,
        }
    }
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        CommentaryConfig {
            api_key: None,
            model: "gemini-3-flash-preview".to_string(),
            endpoint: DEFAULT_COMMENTARY_ENDPOINT.to_string(),
            timeout_ms: 4000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            battle: BattleConfig::default(),
            commentary: CommentaryConfig::default(),
            catalog: CatalogConfig::default(),
            sessions: SessionConfig {
                inactive_timeout_sec: 1800,
                sweep_interval_sec: 60,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env file if available
        dotenv::dotenv().ok();

        let mut config = Config::default();

        // Server config
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.server.port = port;
            }
        }

        if let Ok(host) = env::var("HOST") {
            if let Ok(host) = host.parse::<IpAddr>() {
                config.server.host = host;
            }
        }

        if let Ok(cors) = env::var("CORS_ORIGINS") {
            config.server.cors_origins = cors.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Battle pacing
        if let Ok(delay) = env::var("ENEMY_THINK_DELAY_MS") {
            if let Ok(delay) = delay.parse::<u64>() {
                config.battle.enemy_think_delay_ms = delay;
            }
        }

        if let Ok(delay) = env::var("CAPTURE_REVEAL_DELAY_MS") {
            if let Ok(delay) = delay.parse::<u64>() {
                config.battle.capture_reveal_delay_ms = delay;
            }
        }

        if let Ok(capacity) = env::var("BATTLE_LOG_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<usize>() {
                if capacity > 0 {
                    config.battle.log_capacity = capacity;
                }
            }
        }

        if let Ok(channel_size) = env::var("SNAPSHOT_CHANNEL_SIZE") {
            if let Ok(channel_size) = channel_size.parse::<usize>() {
                if channel_size > 0 {
                    config.battle.snapshot_channel_size = channel_size;
                }
            }
        }

        // Commentary
        config.commentary.api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        if let Ok(model) = env::var("COMMENTARY_MODEL") {
            config.commentary.model = model;
        }

        if let Ok(endpoint) = env::var("COMMENTARY_ENDPOINT") {
            config.commentary.endpoint = endpoint;
        }

        if let Ok(timeout) = env::var("COMMENTARY_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                config.commentary.timeout_ms = timeout;
            }
        }

        // Catalog
        if let Ok(path) = env::var("CATALOG_PATH") {
            config.catalog.path = Some(path);
        }

        // Sessions
        if let Ok(timeout) = env::var("SESSION_TIMEOUT_SEC") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                config.sessions.inactive_timeout_sec = timeout;
            }
        }

        if let Ok(interval) = env::var("SESSION_SWEEP_INTERVAL_SEC") {
            if let Ok(interval) = interval.parse::<u64>() {
                if interval > 0 {
                    config.sessions.sweep_interval_sec = interval;
                }
            }
        }

        info!("Configuration loaded: {:?}", config);
        config
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}
