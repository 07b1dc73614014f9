//! Configuration

use std::{io, path::PathBuf, time::Duration};

use clap::Args;
use jiff::civil::Time;
use quarry::policy::{PolicyError, PricingPolicy};
use thiserror::Error;
use tracing::warn;

use crate::domain::orders::IntakeSettings;

/// Errors loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The policy file exists but couldn't be read.
    #[error("failed to read pricing policy {path}")]
    Read {
        /// Path that was read.
        path: PathBuf,

        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The policy file is invalid.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Order intake settings.
#[derive(Debug, Args)]
pub struct IntakeConfig {
    /// Pricing policy YAML (discount tiers, minimum order); built-in defaults when omitted
    #[arg(long, env = "QUARRY_PRICING_POLICY")]
    pub pricing_policy: Option<PathBuf>,

    /// Upper bound on each catalog lookup, in milliseconds
    #[arg(long, env = "QUARRY_CATALOG_TIMEOUT_MS", default_value_t = 2_000)]
    pub catalog_timeout_ms: u64,

    /// Upper bound on each notification, in milliseconds
    #[arg(long, env = "QUARRY_NOTIFICATION_TIMEOUT_MS", default_value_t = 1_000)]
    pub notification_timeout_ms: u64,

    /// Time of day used when an availability slot has a date but no time
    #[arg(long, env = "QUARRY_DEFAULT_AVAILABILITY_TIME", default_value = "09:00")]
    pub default_availability_time: Time,
}

impl IntakeConfig {
    /// Runtime settings for the intake service.
    pub fn settings(&self) -> IntakeSettings {
        IntakeSettings {
            catalog_timeout: Duration::from_millis(self.catalog_timeout_ms),
            notification_timeout: Duration::from_millis(self.notification_timeout_ms),
            default_availability_time: self.default_availability_time,
        }
    }

    /// Load the configured pricing policy. A missing file falls back to the
    /// built-in policy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file can't be read or is invalid.
    pub fn load_policy(&self) -> Result<PricingPolicy, ConfigError> {
        let Some(path) = &self.pricing_policy else {
            return Ok(PricingPolicy::default());
        };

        match std::fs::read_to_string(path) {
            Ok(yaml) => Ok(PricingPolicy::from_yaml_str(&yaml)?),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "pricing policy not found, using defaults");

                Ok(PricingPolicy::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.clone(),
                source,
            }),
        }
    }
}
