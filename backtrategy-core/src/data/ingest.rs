use crate::domain::TickRepr;
use polars::prelude::*;
use std::path::Path;

/// Load a headered CSV file into a table ready for [`MarketClock::bind`].
///
/// The time column is kept as text so that compact dates such as `20210101`
/// are parsed as calendar dates rather than inferred as integers.
///
/// [`MarketClock::bind`]: crate::data::MarketClock::bind
pub fn load_csv(path: impl AsRef<Path>, repr: &TickRepr) -> Result<DataFrame, DataError> {
    let path = path.as_ref();
    std::fs::metadata(path)?;

    let mut df = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()?
        .collect()?;

    let time_as_text = match df.column(&repr.time) {
        Ok(col) if col.dtype() != &DataType::String => Some(col.cast(&DataType::String)?),
        _ => None,
    };
    if let Some(col) = time_as_text {
        df.with_column(col)?;
    }

    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded csv"
    );
    Ok(df)
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("cannot parse time column '{column}' at row {row}: {value:?}")]
    TimeParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("field not found in current row: {0}")]
    FieldNotFound(String),

    #[error("field '{field}' holds {found}, expected {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
