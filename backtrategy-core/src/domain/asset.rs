//! Asset and data-series classifications.
//!
//! Two separate vocabularies: [`AssetType`] describes what an order trades,
//! [`DataClass`] describes what a bound price series contains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of instrument an order or position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Shares,
    Futures,
    Cfd,
    Crypto,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetType::Shares => "shares",
            AssetType::Futures => "futures",
            AssetType::Cfd => "cfd",
            AssetType::Crypto => "crypto",
        };
        f.write_str(s)
    }
}

/// Market a price series was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Stock,
    Forex,
    Crypto,
}

/// Granularity of the rows in a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Aggregated bars.
    Ohlcv,
    /// Top-of-book quotes.
    Tick,
    /// Individual prints.
    Trade,
}

/// Classification attached to a bound series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataClass {
    pub market: Market,
    pub kind: DataKind,
}

impl DataClass {
    pub fn new(market: Market, kind: DataKind) -> Self {
        Self { market, kind }
    }
}

impl fmt::Display for DataClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let market = match self.market {
            Market::Stock => "stock",
            Market::Forex => "forex",
            Market::Crypto => "crypto",
        };
        let kind = match self.kind {
            DataKind::Ohlcv => "ohlcv",
            DataKind::Tick => "tick",
            DataKind::Trade => "trade",
        };
        write!(f, "{market}/{kind}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_class_display() {
        let class = DataClass::new(Market::Forex, DataKind::Tick);
        assert_eq!(class.to_string(), "forex/tick");
    }

    #[test]
    fn asset_type_serializes_snake_case() {
        let json = serde_json::to_string(&AssetType::Cfd).unwrap();
        assert_eq!(json, "\"cfd\"");
        let back: AssetType = serde_json::from_str("\"futures\"").unwrap();
        assert_eq!(back, AssetType::Futures);
    }
}
