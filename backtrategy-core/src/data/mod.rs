//! Tabular market data: loading, time coercion and the replay clock.

pub mod clock;
pub mod ingest;
pub mod timeparse;
pub mod value;

pub use clock::MarketClock;
pub use ingest::{load_csv, DataError};
pub use timeparse::{parse_auto, parse_with_format};
pub use value::{RowView, Value};
