use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config as cfg;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind_addr")]
    pub bind_addr: String,
    /// Grace period for closing the graph pool once the listener has stopped
    #[serde(default = "ServerConfig::default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    fn default_bind_addr() -> String {
        "0.0.0.0:22600".to_string()
    }

    fn default_shutdown_timeout_secs() -> u64 {
        5
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: Self::default_bind_addr(),
            shutdown_timeout_secs: Self::default_shutdown_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// Externally visible base URL of this service
    #[serde(default = "LinksConfig::default_hierarchy_api_url")]
    pub hierarchy_api_url: String,
    /// Base URL of the code list service
    #[serde(default = "LinksConfig::default_code_list_api_url")]
    pub code_list_api_url: String,
    /// Derive link bases from X-Forwarded-* headers when present
    #[serde(default)]
    pub enable_url_rewriting: bool,
}

impl LinksConfig {
    fn default_hierarchy_api_url() -> String {
        "http://localhost:22600".to_string()
    }

    fn default_code_list_api_url() -> String {
        "http://localhost:22400".to_string()
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            hierarchy_api_url: Self::default_hierarchy_api_url(),
            code_list_api_url: Self::default_code_list_api_url(),
            enable_url_rewriting: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Bolt URI of the graph database (e.g., "bolt://localhost:7687")
    #[serde(default = "GraphConfig::default_uri")]
    pub uri: String,
    #[serde(default = "GraphConfig::default_username")]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,
    /// Database name; the server default is used when unset
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "GraphConfig::default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "GraphConfig::default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl GraphConfig {
    fn default_uri() -> String {
        "bolt://localhost:7687".to_string()
    }

    fn default_username() -> String {
        "neo4j".to_string()
    }

    fn default_max_connections() -> usize {
        5
    }

    fn default_query_timeout_secs() -> u64 {
        10
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            username: Self::default_username(),
            password: None,
            database: None,
            max_connections: Self::default_max_connections(),
            query_timeout_secs: Self::default_query_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "HealthConfig::default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "HealthConfig::default_critical_timeout_secs")]
    pub critical_timeout_secs: u64,
    #[serde(default = "HealthConfig::default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl HealthConfig {
    fn default_interval_secs() -> u64 {
        30
    }

    fn default_critical_timeout_secs() -> u64 {
        90
    }

    fn default_probe_timeout_ms() -> u64 {
        1000
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn critical_timeout(&self) -> Duration {
        Duration::from_secs(self.critical_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: Self::default_interval_secs(),
            critical_timeout_secs: Self::default_critical_timeout_secs(),
            probe_timeout_ms: Self::default_probe_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn default_env() -> String {
        env::var("APP_ENV")
            .ok()
            .or_else(|| env::var("RUST_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    /// ./config/ when it exists, otherwise the working directory.
    pub fn default_config_dir() -> PathBuf {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project_config = cwd.join("config");
        if project_config.exists() {
            project_config
        } else {
            cwd
        }
    }

    /// Load and validate settings from the default config directory and the
    /// `HIERARCHY__*` environment.
    pub fn load() -> Result<Self> {
        let config_dir = Self::default_config_dir();
        let env_name = Self::default_env();
        let settings = Self::load_from_sources(&config_dir, &env_name)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Self> {
        let settings: Settings = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                cfg::Environment::with_prefix("HIERARCHY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.server.bind_addr.trim().is_empty(),
            "server.bind_addr cannot be empty"
        );
        anyhow::ensure!(
            self.server.shutdown_timeout_secs > 0,
            "server.shutdown_timeout_secs must be > 0"
        );
        Url::parse(&self.links.hierarchy_api_url)
            .with_context(|| format!("links.hierarchy_api_url is not a URL: {}", self.links.hierarchy_api_url))?;
        Url::parse(&self.links.code_list_api_url)
            .with_context(|| format!("links.code_list_api_url is not a URL: {}", self.links.code_list_api_url))?;
        anyhow::ensure!(!self.graph.uri.is_empty(), "graph.uri cannot be empty");
        anyhow::ensure!(
            self.graph.max_connections > 0,
            "graph.max_connections must be > 0"
        );
        anyhow::ensure!(
            self.graph.query_timeout_secs > 0,
            "graph.query_timeout_secs must be > 0"
        );
        anyhow::ensure!(
            self.health.probe_timeout_ms > 0,
            "health.probe_timeout_ms must be > 0"
        );
        Ok(())
    }
}
