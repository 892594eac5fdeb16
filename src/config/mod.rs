//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Human-readable or JSON log lines
    pub log_format: LogFormat,
    /// Directory served for static client assets
    pub static_dir: PathBuf,
    /// Allowed cross-origin clients (comma-separated); empty means same-origin only
    pub client_origin: String,

    /// Max inbound messages per second per connection
    pub input_rate_limit: u32,
    /// Outbound frames queued per connection before new frames are dropped
    pub outbound_buffer: usize,
    /// Max distance a client-reported collision position may sit from the
    /// authoritative position before it is rejected
    pub max_reconcile_distance: f64,
    /// Keep customised display names when players are renumbered
    pub preserve_custom_names: bool,
    /// Seed for the world RNG (spawn placement, ids, colors)
    pub world_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            static_dir: PathBuf::from("./public"),
            client_origin: String::new(),
            input_rate_limit: 120,
            outbound_buffer: 64,
            max_reconcile_distance: 90.0,
            preserve_custom_names: false,
            world_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // PORT wins over SERVER_ADDR for hosted deployments
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?
        } else if let Ok(addr) = env::var("SERVER_ADDR") {
            addr.parse().map_err(|_| ConfigError::InvalidAddress)?
        } else {
            defaults.server_addr
        };

        Ok(Self {
            server_addr,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_var("LOG_FORMAT", defaults.log_format)?,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or(defaults.client_origin),
            input_rate_limit: parse_var("INPUT_RATE_LIMIT", defaults.input_rate_limit)?,
            outbound_buffer: parse_var("OUTBOUND_BUFFER", defaults.outbound_buffer)?,
            max_reconcile_distance: parse_var(
                "MAX_RECONCILE_DISTANCE",
                defaults.max_reconcile_distance,
            )?,
            preserve_custom_names: parse_var(
                "PRESERVE_CUSTOM_NAMES",
                defaults.preserve_custom_names,
            )?,
            world_seed: match env::var("WORLD_SEED") {
                Ok(raw) => Some(parse_value("WORLD_SEED", &raw)?),
                Err(_) => defaults.world_seed,
            },
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
}

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
