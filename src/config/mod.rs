use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::{ApprovedRateTable, FiscalYear, RateSchedule, ScheduleError, YearSequence};

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

/// Top-level configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub provider: ProviderConfig,
    pub schedule: RateSchedule,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment =
            AppEnvironment::from_str(&lookup("APP_ENV").unwrap_or_else(|| "development".into()));

        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = lookup("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let source_url = lookup("RATES_SOURCE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let refresh_interval = Duration::from_secs(parse_secs(
            &lookup,
            "RATES_REFRESH_SECS",
            DEFAULT_REFRESH_SECS,
        )?);
        let fetch_timeout = Duration::from_secs(parse_secs(
            &lookup,
            "RATES_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);

        let schedule = match lookup("RATES_SCHEDULE_FILE") {
            Some(path) => load_schedule_file(Path::new(&path))?,
            None => RateSchedule::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            provider: ProviderConfig {
                source_url,
                refresh_interval,
                fetch_timeout,
            },
            schedule,
        })
    }
}

const DEFAULT_REFRESH_SECS: u64 = 300;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

fn parse_secs<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::InvalidDuration { key, value: raw }),
        },
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

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where historical rates come from and how often they are re-read.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Spreadsheet-backed endpoint; the built-in dataset is used when unset.
    pub source_url: Option<String>,
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleFile {
    fiscal_years: Vec<FiscalYear>,
    #[serde(default)]
    approved_rates: HashMap<FiscalYear, f64>,
}

/// Reads a JSON schedule such as
/// `{"fiscalYears": ["FY25", "FY26"], "approvedRates": {"FY26": 5.0}}`.
pub fn load_schedule_file(path: &Path) -> Result<RateSchedule, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ScheduleRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schedule(&raw).map_err(|err| match err {
        ScheduleParseError::Json(source) => ConfigError::ScheduleParse {
            path: path.to_path_buf(),
            source,
        },
        ScheduleParseError::Invalid(source) => ConfigError::Schedule(source),
    })
}

enum ScheduleParseError {
    Json(serde_json::Error),
    Invalid(ScheduleError),
}

fn parse_schedule(raw: &str) -> Result<RateSchedule, ScheduleParseError> {
    let file: ScheduleFile = serde_json::from_str(raw).map_err(ScheduleParseError::Json)?;
    let years = YearSequence::new(file.fiscal_years).map_err(ScheduleParseError::Invalid)?;
    let approved =
        ApprovedRateTable::new(file.approved_rates).map_err(ScheduleParseError::Invalid)?;
    Ok(RateSchedule::new(years, approved))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("{key} must be a positive number of seconds, got '{value}'")]
    InvalidDuration { key: &'static str, value: String },
    #[error("unable to read rate schedule {}", .path.display())]
    ScheduleRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("rate schedule {} is not valid JSON", .path.display())]
    ScheduleParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid rate schedule: {0}")]
    Schedule(#[source] ScheduleError),
}
