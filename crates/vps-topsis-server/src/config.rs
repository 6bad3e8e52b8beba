use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_CATALOG_PATH: &str = "./data/catalog.json";
pub const DEFAULT_HISTORY_PATH: &str = "./data/history.json";
pub const DEFAULT_MAX_BATCH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Stdio,
}

impl Transport {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "stdio" => Some(Self::Stdio),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("VPS_TOPSISD_TRANSPORT must be http or stdio, got {0:?}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: Transport,
    pub http_addr: String,
    pub catalog_path: PathBuf,
    pub history_path: PathBuf,
    pub history_limit: usize,
    pub max_batch: usize,
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Http,
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            history_limit: vps_topsis_storage::DEFAULT_HISTORY_LIMIT,
            max_batch: DEFAULT_MAX_BATCH,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let transport = match std::env::var("VPS_TOPSISD_TRANSPORT") {
            Ok(raw) => Transport::parse(&raw).ok_or(ConfigError::Transport(raw))?,
            Err(_) => defaults.transport,
        };
        Ok(Self {
            transport,
            http_addr: std::env::var("VPS_TOPSIS_HTTP_ADDR").unwrap_or(defaults.http_addr),
            catalog_path: env_path("VPS_TOPSIS_CATALOG").unwrap_or(defaults.catalog_path),
            history_path: env_path("VPS_TOPSIS_HISTORY").unwrap_or(defaults.history_path),
            history_limit: env_usize(
                "VPS_TOPSIS_HISTORY_LIMIT",
                defaults.history_limit,
                1,
                1000,
            ),
            max_batch: env_usize("VPS_TOPSIS_MAX_BATCH", defaults.max_batch, 1, 1024),
            log_dir: env_path("VPS_TOPSIS_LOG_DIR"),
        })
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_usize(name: &str, default: usize, min: usize, max: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_parsing() {
        assert_eq!(Transport::parse("HTTP"), Some(Transport::Http));
        assert_eq!(Transport::parse(" stdio "), Some(Transport::Stdio));
        assert_eq!(Transport::parse("grpc"), None);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.http_addr, "127.0.0.1:8000");
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.max_batch, 64);
        assert!(config.log_dir.is_none());
    }
}
