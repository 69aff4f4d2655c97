//! Application configuration management.

use chrono_tz::Tz;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour (due-date window, local time zone).
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Window in days for the upcoming-due query.
    #[serde(default = "default_upcoming_days")]
    pub upcoming_days: u32,
    /// IANA time zone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_upcoming_days() -> u32 {
    7
}

fn default_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            upcoming_days: default_upcoming_days(),
            timezone: default_timezone(),
        }
    }
}

impl LedgerConfig {
    /// Parses the configured time zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the time zone name is unknown.
    pub fn tz(&self) -> Result<Tz, config::ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| config::ConfigError::Message(format!("ledger.timezone: {e}")))
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns an error if the time zone is unknown.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.tz().map(|_| ())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "cofre=info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COFRE").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.ledger.validate()?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("COFRE__DATABASE__URL", Some("postgres://localhost/cofre_test")),
                ("COFRE__LEDGER__UPCOMING_DAYS", Some("10")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/cofre_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.ledger.upcoming_days, 10);
                assert_eq!(config.ledger.timezone, "America/Sao_Paulo");
                assert_eq!(config.log.filter, "cofre=info");
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("COFRE__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.upcoming_days, 7);
        assert_eq!(ledger.tz().unwrap(), chrono_tz::America::Sao_Paulo);
        assert!(ledger.validate().is_ok());
    }

    #[test]
    fn test_ledger_validate_rejects_unknown_timezone() {
        let ledger = LedgerConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..LedgerConfig::default()
        };
        assert!(ledger.validate().is_err());
    }
}
