use reqwest::Url;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PREDICTION_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
const DEFAULT_SESSION_CAPACITY: usize = 10_000;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub prediction: PredictionConfig,
    pub locations: LocationConfig,
    pub sessions: SessionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let raw_base_url = env::var("PREDICTION_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_PREDICTION_BASE_URL.to_string());
        let base_url = PredictionConfig::parse_base_url(&raw_base_url)?;

        let data_path = env::var("LOCATION_DATA_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let idle_secs = match env::var("SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidSessionSetting("SESSION_IDLE_SECS"))?,
            Err(_) => DEFAULT_SESSION_IDLE_SECS,
        };
        let capacity = match env::var("SESSION_CAPACITY") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or(ConfigError::InvalidSessionSetting("SESSION_CAPACITY"))?,
            Err(_) => DEFAULT_SESSION_CAPACITY,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            prediction: PredictionConfig { base_url },
            locations: LocationConfig { data_path },
            sessions: SessionConfig {
                idle_ttl: Duration::from_secs(idle_secs),
                capacity,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the remote prediction service lives.
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    pub base_url: Url,
}

impl PredictionConfig {
    pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
        let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidBaseUrl {
            value: raw.to_string(),
            reason: err.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidBaseUrl {
                value: raw.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

/// Optional override for the bundled location hierarchy.
#[derive(Debug, Clone, Default)]
pub struct LocationConfig {
    pub data_path: Option<PathBuf>,
}

/// Bounds on the in-memory estimate sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub idle_ttl: Duration,
    pub capacity: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidBaseUrl {
        value: String,
        reason: String,
    },
    InvalidSessionSetting(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBaseUrl { value, reason } => write!(
                f,
                "PREDICTION_BASE_URL must be an absolute http(s) URL, got '{}' ({})",
                value, reason
            ),
            ConfigError::InvalidSessionSetting(name) => {
                write!(f, "{} must be a positive integer", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidBaseUrl { .. }
            | ConfigError::InvalidSessionSetting(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
