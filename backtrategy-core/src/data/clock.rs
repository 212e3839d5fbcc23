//! MarketClock: a forward-only cursor over a time-ordered table.
//!
//! The clock owns one table at a time. Binding validates the configured
//! columns and coerces the time column; from then on the clock exposes the
//! current row and advances one row per call until the series is exhausted.

use super::ingest::DataError;
use super::timeparse::coerce_time_column;
use super::value::{RowView, Value};
use crate::domain::{DataClass, Tick, TickRepr};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    At(usize),
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct MarketClock {
    data: DataFrame,
    repr: TickRepr,
    class: DataClass,
    cursor: Cursor,
    current: Option<RowView>,
}

impl MarketClock {
    /// Bind a table and position the clock on its first row.
    ///
    /// Fails with [`DataError::MissingColumn`] if any configured column is
    /// absent and with [`DataError::TimeParse`] if a time cell cannot be
    /// read. An empty table binds successfully and is exhausted at once.
    pub fn bind(
        data: DataFrame,
        repr: TickRepr,
        class: DataClass,
        time_format: Option<&str>,
    ) -> Result<Self, DataError> {
        let data = prepare(data, &repr, time_format)?;
        let mut clock = Self {
            data,
            repr,
            class,
            cursor: Cursor::Exhausted,
            current: None,
        };
        clock.rewind();
        tracing::info!(
            rows = clock.len(),
            columns = clock.data.width(),
            class = %clock.class,
            "market clock bound"
        );
        Ok(clock)
    }

    /// Replace the bound table, keeping the data class.
    ///
    /// On failure the previous binding and position are left untouched.
    pub fn rebind(
        &mut self,
        data: DataFrame,
        repr: TickRepr,
        time_format: Option<&str>,
    ) -> Result<(), DataError> {
        let data = prepare(data, &repr, time_format)?;
        self.data = data;
        self.repr = repr;
        self.rewind();
        tracing::info!(rows = self.len(), class = %self.class, "market clock rebound");
        Ok(())
    }

    /// Move to the next row and return it, or `None` once past the last row.
    ///
    /// Calling again after exhaustion keeps returning `None`.
    pub fn advance(&mut self) -> Option<RowView> {
        let Cursor::At(row) = self.cursor else {
            return None;
        };
        self.seek(row + 1);
        if self.cursor == Cursor::Exhausted {
            tracing::debug!(rows = self.len(), "market clock exhausted");
        }
        self.current.clone()
    }

    /// Return to the first row without revalidating the table.
    pub fn reset(&mut self) {
        self.rewind();
        tracing::info!(rows = self.len(), "market clock reset");
    }

    pub fn current(&self) -> Option<&RowView> {
        self.current.as_ref()
    }

    /// Value of `name` in the current row.
    ///
    /// Fails with [`DataError::FieldNotFound`] if the column does not exist
    /// or the clock is exhausted.
    pub fn field(&self, name: &str) -> Result<&Value, DataError> {
        self.current
            .as_ref()
            .and_then(|row| row.get(name))
            .ok_or_else(|| DataError::FieldNotFound(name.to_string()))
    }

    /// Timestamp of the current row.
    pub fn current_time(&self) -> Result<DateTime<Utc>, DataError> {
        let name = self.repr.time.as_str();
        let value = self.field(name)?;
        value.as_timestamp().ok_or_else(|| DataError::FieldType {
            field: name.to_string(),
            expected: "timestamp",
            found: value.kind(),
        })
    }

    /// The current row read through the configured column mapping.
    ///
    /// Returns `Ok(None)` once exhausted. Volume reads as 0 when no volume
    /// column is configured or the cell is null.
    pub fn current_tick(&self) -> Result<Option<Tick>, DataError> {
        if self.current.is_none() {
            return Ok(None);
        }
        let volume = match self.repr.volume() {
            Some(name) => match self.field(name)? {
                Value::Null => 0,
                value => value.as_i64().ok_or_else(|| DataError::FieldType {
                    field: name.to_string(),
                    expected: "integer",
                    found: value.kind(),
                })?,
            },
            None => 0,
        };
        Ok(Some(Tick {
            time: self.current_time()?,
            ask: self.decimal_field(&self.repr.ask)?,
            bid: self.decimal_field(&self.repr.bid)?,
            volume,
        }))
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }

    /// Index of the current row, `None` once exhausted.
    pub fn position(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(row) => Some(row),
            Cursor::Exhausted => None,
        }
    }

    /// Number of rows in the bound table.
    pub fn len(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    pub fn repr(&self) -> &TickRepr {
        &self.repr
    }

    pub fn class(&self) -> DataClass {
        self.class
    }

    /// The bound table, with its time column already coerced.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    fn decimal_field(&self, name: &str) -> Result<Decimal, DataError> {
        let value = self.field(name)?;
        value.as_decimal().ok_or_else(|| DataError::FieldType {
            field: name.to_string(),
            expected: "decimal",
            found: value.kind(),
        })
    }

    fn rewind(&mut self) {
        self.seek(0);
    }

    fn seek(&mut self, row: usize) {
        if row < self.data.height() {
            self.cursor = Cursor::At(row);
            self.current = Some(materialize(&self.data, row));
        } else {
            self.cursor = Cursor::Exhausted;
            self.current = None;
        }
    }
}

/// Yields the current row, then steps forward.
impl Iterator for MarketClock {
    type Item = RowView;

    fn next(&mut self) -> Option<RowView> {
        let row = self.current.take()?;
        self.seek(row.index() + 1);
        Some(row)
    }
}

fn prepare(
    mut data: DataFrame,
    repr: &TickRepr,
    time_format: Option<&str>,
) -> Result<DataFrame, DataError> {
    for name in repr.required_columns() {
        if data.column(name).is_err() {
            tracing::debug!(column = name, "bind rejected: missing column");
            return Err(DataError::MissingColumn(name.to_string()));
        }
    }
    coerce_time_column(&mut data, &repr.time, time_format)?;
    Ok(data)
}

fn materialize(data: &DataFrame, row: usize) -> RowView {
    let fields: BTreeMap<String, Value> = data
        .get_columns()
        .iter()
        .map(|col| {
            let value = col
                .as_materialized_series()
                .get(row)
                .map(Value::from_any)
                .unwrap_or(Value::Null);
            (col.name().to_string(), value)
        })
        .collect();
    RowView::new(row, fields)
}
