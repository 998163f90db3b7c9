use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub collaborator: CollaboratorConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub retry: RetryConfig,
    pub ui: UiConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorBackend {
    Rest,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollaboratorConfig {
    pub backend: CollaboratorBackend,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub sentinel_enabled: bool,
    pub sentinel_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub cookie_name: String,
    pub ttl_secs: u64,  // lifetime of the persisted user key and idle limit of a live context
    pub max_contexts: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub banner_dismiss_secs: u64,
    pub templates_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub max_body_size: usize,  // in bytes
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config/default.toml"))
    }

    /// Layers `APP_*` environment variables (`APP_SERVER__PORT=8080`) over
    /// the given file.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig { host: "127.0.0.1".into(), port: 0 },
            collaborator: CollaboratorConfig {
                backend: CollaboratorBackend::Memory,
                base_url: "http://localhost:3001".into(),
                timeout_secs: 5,
            },
            redis: RedisConfig {
                url: "redis://127.0.0.1/".into(),
                sentinel_enabled: false,
                sentinel_url: None,
            },
            session: SessionConfig {
                backend: SessionBackend::Memory,
                cookie_name: "sid".into(),
                ttl_secs: 3600,
                max_contexts: 1_000,
            },
            auth: AuthConfig { bcrypt_cost: 4 },
            retry: RetryConfig { max_attempts: 3, base_delay_ms: 1, max_delay_ms: 5 },
            ui: UiConfig { banner_dismiss_secs: 3, templates_dir: "templates".into() },
            limits: LimitsConfig { max_body_size: 64 * 1024 },
        }
    }
}
