use crate::constants::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_COLLECTION_TIMEOUT_SECS, DEFAULT_ITEM_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SOURCE_URL,
};
use crate::error::{Result, ScraperError};
use crate::parser::processor::ProcessorSettings;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Prefix for environment overrides, e.g. `FIGHTS_SERVER_PORT`
const ENV_PREFIX: &str = "FIGHTS_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`, with `index.html` served at `/`
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: "frontend".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.resolve(self.port)
    }

    /// Resolve `host` (an IP literal or a host name such as `localhost`)
    /// together with `port`. The first resolved address wins.
    pub fn resolve(&self, port: u16) -> Result<SocketAddr> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ScraperError::Config("server host is required".to_string()));
        }
        (host, port)
            .to_socket_addrs()
            .map_err(|e| ScraperError::Config(format!("invalid server host '{}': {}", host, e)))?
            .next()
            .ok_or_else(|| {
                ScraperError::Config(format!("server host '{}' resolved to no addresses", host))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub source_url: String,
    pub request_timeout_secs: u64,
    pub channel_capacity: usize,
    pub item_timeout_secs: u64,
    pub collection_timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            item_timeout_secs: DEFAULT_ITEM_TIMEOUT_SECS,
            collection_timeout_secs: DEFAULT_COLLECTION_TIMEOUT_SECS,
        }
    }
}

impl ScraperConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            channel_capacity: self.channel_capacity,
            item_timeout: Duration::from_secs(self.item_timeout_secs),
            collection_timeout: Duration::from_secs(self.collection_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub file_name: String,
    /// Used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file_name: "fights.log".to_string(),
            filter: "fight_scraper=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics` on the API server
    pub enabled: bool,
    /// Also run the Prometheus exporter's own listener on this port, bound to
    /// the server host. Setting it turns metrics on.
    pub port: Option<u16>,
}

impl MetricsConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled || self.port.is_some()
    }
}

impl Config {
    /// Load the TOML file at `path` (usually `config.toml`), then apply `.env`
    /// and `FIGHTS_*` environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!(
            "Configuration loaded - server will start on {}:{}",
            config.server.host, config.server.port
        );
        Ok(config)
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file '{}' not found, using default values", path.display());
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&config_content)?;
        info!("Config file loaded: {}", path.display());
        Ok(config)
    }

    /// Apply `FIGHTS_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            self.server.port = parse_override("SERVER_PORT", &port)?;
        }
        if let Some(dir) = var("STATIC_DIR") {
            self.server.static_dir = dir;
        }
        if let Some(url) = var("SOURCE_URL") {
            self.scraper.source_url = url;
        }
        if let Some(secs) = var("REQUEST_TIMEOUT_SECS") {
            self.scraper.request_timeout_secs = parse_override("REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(dir) = var("LOG_DIR") {
            self.logging.dir = dir;
        }
        if let Some(enabled) = var("METRICS_ENABLED") {
            self.metrics.enabled = parse_override("METRICS_ENABLED", &enabled)?;
        }
        if let Some(port) = var("METRICS_PORT") {
            self.metrics.port = Some(parse_override("METRICS_PORT", &port)?);
            self.metrics.enabled = true;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ScraperError::Config("server port is required".to_string()));
        }
        self.server.socket_addr()?;
        match self.metrics.port {
            Some(0) => return Err(ScraperError::Config("metrics port must be positive".to_string())),
            Some(port) if port == self.server.port => {
                return Err(ScraperError::Config(format!(
                    "metrics port {} collides with the server port",
                    port
                )))
            }
            _ => {}
        }

        let url = Url::parse(&self.scraper.source_url).map_err(|e| {
            ScraperError::Config(format!("invalid source URL '{}': {}", self.scraper.source_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScraperError::Config(format!(
                "source URL must be http or https, got '{}'",
                url.scheme()
            )));
        }

        let scraper = &self.scraper;
        if scraper.channel_capacity == 0 {
            return Err(ScraperError::Config("channel_capacity must be positive".to_string()));
        }
        for (name, secs) in [
            ("request_timeout_secs", scraper.request_timeout_secs),
            ("item_timeout_secs", scraper.item_timeout_secs),
            ("collection_timeout_secs", scraper.collection_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ScraperError::Config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}

fn parse_override<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        ScraperError::Config(format!("invalid value for {}{}: '{}' ({})", ENV_PREFIX, name, raw, e))
    })
}
