//! Coercion of the configured time column to UTC nanosecond timestamps.

use super::ingest::DataError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y%m%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

// Month-first for slash dates without a leading year.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%m/%d/%Y"];

pub(crate) fn timestamp_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Nanoseconds, None)
}

/// Replace `column` in `df` with a nanosecond datetime column.
///
/// Text is parsed with `format` when given, otherwise by trying RFC 3339 and
/// a fixed list of common layouts. Integers are epoch nanoseconds unless a
/// format is given, in which case their decimal text is parsed. Any null or
/// unparseable cell fails the whole column.
pub(crate) fn coerce_time_column(
    df: &mut DataFrame,
    column: &str,
    format: Option<&str>,
) -> Result<(), DataError> {
    let series = df
        .column(column)
        .map_err(|_| DataError::MissingColumn(column.to_string()))?
        .as_materialized_series()
        .clone();

    let dtype = series.dtype().clone();
    let coerced = match &dtype {
        DataType::Datetime(TimeUnit::Nanoseconds, _) => series,
        DataType::Datetime(_, tz) => {
            let target = DataType::Datetime(TimeUnit::Nanoseconds, tz.clone());
            series.cast(&target)?
        }
        DataType::Date => series.cast(&timestamp_dtype())?,
        DataType::String => parse_text(&series, format)?,
        dtype if dtype.is_integer() => match format {
            Some(_) => parse_text(&series.cast(&DataType::String)?, format)?,
            None => series.cast(&DataType::Int64)?.cast(&timestamp_dtype())?,
        },
        other => {
            return Err(DataError::TimeParse {
                column: column.to_string(),
                row: 0,
                value: format!("<{other}>"),
            })
        }
    };

    check_no_nulls(&coerced, column)?;
    df.with_column(coerced)?;
    Ok(())
}

fn check_no_nulls(series: &Series, column: &str) -> Result<(), DataError> {
    if series.null_count() == 0 {
        return Ok(());
    }
    let mask = series.is_null();
    let row = (&mask)
        .into_iter()
        .position(|v| v == Some(true))
        .unwrap_or(0);
    Err(DataError::TimeParse {
        column: column.to_string(),
        row,
        value: "null".to_string(),
    })
}

fn parse_text(series: &Series, format: Option<&str>) -> Result<Series, DataError> {
    let text = series.str()?;
    let mut nanos = Vec::with_capacity(text.len());

    for (row, cell) in text.into_iter().enumerate() {
        let failure = |value: &str| DataError::TimeParse {
            column: series.name().to_string(),
            row,
            value: value.to_string(),
        };
        let raw = cell.ok_or_else(|| failure("null"))?;
        let parsed = match format {
            Some(fmt) => parse_with_format(raw.trim(), fmt),
            None => parse_auto(raw.trim()),
        };
        let ns = parsed
            .and_then(|ts| ts.timestamp_nanos_opt())
            .ok_or_else(|| failure(raw))?;
        nanos.push(ns);
    }

    Ok(Series::new(series.name().clone(), nanos).cast(&timestamp_dtype())?)
}

/// Parse one timestamp with an explicit strftime-style format.
///
/// Offsets in the text are honoured; naive values are taken as UTC and a
/// date-only format resolves to midnight.
pub fn parse_with_format(raw: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_str(raw, format) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse one timestamp by trying the supported layouts in turn.
pub fn parse_auto(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}
