//! Engine configuration.
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables prefixed `SCHEDULING_` (nested keys joined by `__`, e.g.
//! `SCHEDULING_LOGGER__LEVEL=debug`).
//!
//! The business window is not configurable; see
//! [`crate::business_hours::BusinessWindow::default`].

use std::path::Path;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::SchedulingError;
use crate::temporal::{parse_timezone, system_timezone};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EngineConfig {
    /// IANA name of the users' local zone. Detected from the OS when unset.
    #[serde(default)]
    pub local_timezone: Option<String>,
    #[serde(default)]
    pub logger: Logger,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Logger {
    #[serde(default)]
    pub level: Level,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<Level> for tracing::Level {
    fn from(value: Level) -> Self {
        match value {
            Level::Trace => tracing::Level::TRACE,
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `path` (if given) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Config`] if the file is missing or
    /// malformed, and [`SchedulingError::InvalidTimezone`] if
    /// `local_timezone` is not an IANA zone.
    pub fn load(path: Option<&Path>) -> Result<Self, SchedulingError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("SCHEDULING")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<EngineConfig>()?;

        if let Some(name) = &config.local_timezone {
            parse_timezone(name)?;
        }
        Ok(config)
    }

    /// The configured local zone, or the OS zone when none is configured.
    pub fn local_zone(&self) -> Tz {
        self.local_timezone
            .as_deref()
            .and_then(|name| parse_timezone(name).ok())
            .unwrap_or_else(system_timezone)
    }
}
