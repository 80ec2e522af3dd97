use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use danci_review_algo::{ConfigError, EngineConfig};
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite:review.db?mode=rwc";
const DEFAULT_COMMIT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub engine_config_path: Option<PathBuf>,
    pub commit_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read engine config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Engine(#[from] ConfigError),
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let engine_config_path = std::env::var("REVIEW_ENGINE_CONFIG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let commit_timeout_secs = std::env::var("COMMIT_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_COMMIT_TIMEOUT_SECS);

        Self {
            host,
            port,
            log_level,
            database_url,
            engine_config_path,
            commit_timeout: Duration::from_secs(commit_timeout_secs),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Engine parameters from `REVIEW_ENGINE_CONFIG`, or the built-in defaults
    pub fn load_engine_config(&self) -> Result<EngineConfig, ConfigLoadError> {
        let Some(path) = &self.engine_config_path else {
            return Ok(EngineConfig::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(EngineConfig::from_json(&raw)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            log_level: "info".to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            engine_config_path: None,
            commit_timeout: Duration::from_secs(DEFAULT_COMMIT_TIMEOUT_SECS),
        }
    }
}
