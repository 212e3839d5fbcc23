//! Tick: the fundamental market observation, and the column mapping used to read it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Column names for the logical roles of a tick.
///
/// An empty `volume` means the series carries no volume column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRepr {
    pub time: String,
    pub ask: String,
    pub bid: String,
    #[serde(default)]
    pub volume: String,
}

impl TickRepr {
    pub fn new(
        time: impl Into<String>,
        ask: impl Into<String>,
        bid: impl Into<String>,
        volume: impl Into<String>,
    ) -> Self {
        Self {
            time: time.into(),
            ask: ask.into(),
            bid: bid.into(),
            volume: volume.into(),
        }
    }

    /// The volume column name, if one is configured.
    pub fn volume(&self) -> Option<&str> {
        if self.volume.is_empty() {
            None
        } else {
            Some(&self.volume)
        }
    }

    /// Every column this mapping requires, in validation order.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut cols = vec![self.time.as_str(), self.ask.as_str(), self.bid.as_str()];
        cols.extend(self.volume());
        cols
    }
}

/// One timestamped quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub time: DateTime<Utc>,
    pub ask: Decimal,
    pub bid: Decimal,
    pub volume: i64,
}

impl Tick {
    /// ask - bid
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// (ask + bid) / 2
    pub fn mid(&self) -> Decimal {
        (self.ask + self.bid) / Decimal::TWO
    }
}
