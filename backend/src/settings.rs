//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `STATS_*` environment variables, command-line flags or a
//! configuration file, with the defaults below when nothing is set.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::LoadLimits;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Deployment environment. Production hides internal error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local or test deployments; error messages are passed through.
    #[default]
    Development,
    /// Public deployments; 5xx messages are replaced by generic text.
    Production,
}

impl Environment {
    /// Lower-case name used in configuration and responses.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Whether internal error detail must be withheld from clients.
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(SettingsError::InvalidEnvironment(other.to_owned())),
        }
    }
}

/// Errors raised when configuration values are present but unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `environment` is neither `development` nor `production`.
    #[error("unknown environment `{0}`; expected `development` or `production`")]
    InvalidEnvironment(String),
    /// A limit that must be positive was set to zero.
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Configuration values for the HTTP service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STATS")]
pub struct AppSettings {
    /// Port to listen on.
    pub port: Option<u16>,
    /// Interface to bind.
    pub host: Option<String>,
    /// Redis URL for the visit counter. Unset keeps counters in memory.
    pub redis_url: Option<String>,
    /// PostgreSQL URL for users. Unset keeps users in memory.
    pub database_url: Option<String>,
    /// `development` or `production`.
    pub environment: Option<String>,
    /// Budget for each store call, in milliseconds.
    pub store_timeout_ms: Option<u64>,
    /// Longest accepted load run, in seconds.
    pub max_load_duration_secs: Option<u64>,
    /// Largest accepted load intensity.
    pub max_load_intensity: Option<u32>,
    /// Load runs, detached or synchronous, allowed in progress at once.
    pub max_load_jobs: Option<usize>,
    /// Time allowed for in-flight requests to drain at shutdown, in seconds.
    pub shutdown_timeout_secs: Option<u64>,
    /// Apply embedded database migrations at startup.
    #[ortho_config(default = false)]
    pub run_migrations: bool,
}

impl AppSettings {
    /// Interface to bind, defaulting to all interfaces.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Port to bind, defaulting to 3000.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Parsed deployment environment.
    pub fn environment(&self) -> Result<Environment, SettingsError> {
        self.environment
            .as_deref()
            .map_or(Ok(Environment::default()), str::parse)
    }

    /// Per-call budget for store operations.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms.unwrap_or(DEFAULT_STORE_TIMEOUT_MS))
    }

    /// Graceful shutdown budget.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_timeout_secs
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        )
    }

    /// Load generator limits, rejecting zero maxima.
    pub fn load_limits(&self) -> Result<LoadLimits, SettingsError> {
        let defaults = LoadLimits::default();
        let limits = LoadLimits {
            max_duration_secs: self
                .max_load_duration_secs
                .unwrap_or(defaults.max_duration_secs),
            max_intensity: self.max_load_intensity.unwrap_or(defaults.max_intensity),
            max_running_jobs: self.max_load_jobs.unwrap_or(defaults.max_running_jobs),
        };
        if limits.max_duration_secs == 0 {
            return Err(SettingsError::ZeroLimit("max_load_duration_secs"));
        }
        if limits.max_intensity == 0 {
            return Err(SettingsError::ZeroLimit("max_load_intensity"));
        }
        if limits.max_running_jobs == 0 {
            return Err(SettingsError::ZeroLimit("max_load_jobs"));
        }
        Ok(limits)
    }
}

/// Connection URL with any password masked, for logging.
///
/// # Examples
/// ```
/// use stats_api::settings::redact_url;
///
/// assert_eq!(
///     redact_url("postgres://stats:secret@db:5432/stats"),
///     "postgres://stats:****@db:5432/stats"
/// );
/// ```
pub fn redact_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return "<unparseable url>".to_owned();
    };
    if url.password().is_some() && url.set_password(Some("****")).is_err() {
        return "<unparseable url>".to_owned();
    }
    url.to_string()
}
