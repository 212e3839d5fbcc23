//! Clock configuration: the column mapping, data class and time format.
//!
//! Stored as TOML:
//!
//! ```toml
//! time_format = "%Y%m%d"
//!
//! [repr]
//! time = "time"
//! ask = "ask"
//! bid = "bid"
//!
//! [class]
//! market = "forex"
//! kind = "tick"
//! ```

use crate::data::{DataError, MarketClock};
use crate::domain::{DataClass, TickRepr};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// strftime-style layout for the time column; auto-detected when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    pub repr: TickRepr,
    pub class: DataClass,
}

impl ClockConfig {
    pub fn new(repr: TickRepr, class: DataClass) -> Self {
        Self {
            time_format: None,
            repr,
            class,
        }
    }

    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = Some(format.into());
        self
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Bind `data` to a new clock using this configuration.
    pub fn bind(&self, data: DataFrame) -> Result<MarketClock, DataError> {
        MarketClock::bind(
            data,
            self.repr.clone(),
            self.class,
            self.time_format.as_deref(),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
