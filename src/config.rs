use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_CATERPILLAR_PORT: u16 = 50051;
const DEFAULT_MAX_WORKERS: usize = 16;
// 3 days
const DEFAULT_LIFETIME_SECS: u64 = 60 * 60 * 24 * 3;

/// Settings handed to the article fetcher. Fixed once the servicer is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub user_agent: String,
    pub memoize_articles: bool,
    pub fetch_images: bool,
    pub follow_meta_refresh: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("caterpillar/", env!("CARGO_PKG_VERSION")).to_string(),
            memoize_articles: false,
            fetch_images: false,
            follow_meta_refresh: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory the `caterpillar.log` file is written to. `None` logs to stdout.
    pub dir: Option<PathBuf>,
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub feature_url: String,
    pub sentiment_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub caterpillar_addr: SocketAddr,
    pub newspaper_addr: Option<SocketAddr>,
    pub max_workers: usize,
    pub max_lifetime: Duration,
    pub log: LogConfig,
    pub model: Option<ModelConfig>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut service = ServiceConfig::default();
        if let Some(agent) = var("NEWSPAPER_USER_AGENT") {
            service.user_agent = agent;
        }
        if let Some(flag) = var("NEWSPAPER_FOLLOW_META_REFRESH") {
            service.follow_meta_refresh = parse_bool("NEWSPAPER_FOLLOW_META_REFRESH", &flag)?;
        }

        let caterpillar_host = var("CATERPILLAR_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let caterpillar_port = match var("CATERPILLAR_PORT") {
            Some(port) => parse_port("CATERPILLAR_PORT", &port)?,
            None => DEFAULT_CATERPILLAR_PORT,
        };
        let caterpillar_addr = socket_addr("CATERPILLAR_HOST", &caterpillar_host, caterpillar_port)?;

        let newspaper_addr = match var("NEWSPAPER_PORT") {
            Some(port) => {
                let port = parse_port("NEWSPAPER_PORT", &port)?;
                let host = var("NEWSPAPER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
                Some(socket_addr("NEWSPAPER_HOST", &host, port)?)
            }
            None => None,
        };

        let max_workers = match var("MAX_WORKERS") {
            Some(workers) => workers
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|workers| *workers > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("Invalid MAX_WORKERS: {}", workers))
                })?,
            None => DEFAULT_MAX_WORKERS,
        };

        let lifetime_secs = match var("SERVER_LIFETIME_SECS") {
            Some(secs) => secs.trim().parse::<u64>().map_err(|e| {
                AppError::Config(format!("Invalid SERVER_LIFETIME_SECS: {}", e))
            })?,
            None => DEFAULT_LIFETIME_SECS,
        };

        let log = LogConfig {
            dir: var("LOG_FILEPATH").map(PathBuf::from),
            filter: var("LOG_FILTER").unwrap_or_else(|| "info".to_string()),
        };

        let model = match (var("FEATURE_MODEL_URL"), var("SENTIMENT_MODEL_URL")) {
            (Some(feature_url), Some(sentiment_url)) => Some(ModelConfig {
                feature_url,
                sentiment_url,
                api_key: var("MODEL_API_KEY"),
            }),
            _ => None,
        };

        Ok(Config {
            service,
            caterpillar_addr,
            newspaper_addr,
            max_workers,
            max_lifetime: Duration::from_secs(lifetime_secs),
            log,
            model,
        })
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("Invalid {}: {}", key, other))),
    }
}

fn socket_addr(key: &str, host: &str, port: u16) -> Result<SocketAddr> {
    let host = if host.eq_ignore_ascii_case("localhost") {
        DEFAULT_HOST
    } else {
        host.trim()
    };
    let ip = IpAddr::from_str(host)
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))?;
    Ok(SocketAddr::new(ip, port))
}
