//! Data Processor Module
//! Converts the loaded DataFrame into a typed strategy log and partitions trade executions.

use crate::data::DataLoader;
use chrono::{DateTime, NaiveDateTime, Utc};
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Invalid timestamp {value:?} at row {row}")]
    InvalidTimestamp { row: usize, value: String },
    #[error("Timestamp at row {row} is earlier than the previous row")]
    NonMonotonicTimestamp { row: usize },
}

/// Trade marker for a single log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
    None,
}

impl TradeSide {
    /// +1 is a buy, -1 a sell, anything else (0, NaN, missing) no trade.
    pub fn from_direction(direction: f64) -> Self {
        if direction == 1.0 {
            TradeSide::Buy
        } else if direction == -1.0 {
            TradeSide::Sell
        } else {
            TradeSide::None
        }
    }
}

/// A single trade execution marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Execution {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Column-oriented strategy log. Every vector has one entry per row.
#[derive(Debug, Clone, Default)]
pub struct StrategyLog {
    pub timestamps: Vec<DateTime<Utc>>,
    pub mid_price: Vec<f64>,
    pub volume: Vec<f64>,
    pub position: Vec<f64>,
    pub pnl: Vec<f64>,
    pub imbalance: Vec<f64>,
    pub trade_direction: Vec<TradeSide>,
    pub trade_price: Vec<f64>,
}

impl StrategyLog {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Split rows into (buys, sells) by trade direction, keeping row order.
    pub fn executions(&self) -> (Vec<Execution>, Vec<Execution>) {
        let mut buys = Vec::new();
        let mut sells = Vec::new();

        for ((ts, side), price) in self
            .timestamps
            .iter()
            .zip(self.trade_direction.iter())
            .zip(self.trade_price.iter())
        {
            let execution = Execution {
                timestamp: *ts,
                price: *price,
            };
            match side {
                TradeSide::Buy => buys.push(execution),
                TradeSide::Sell => sells.push(execution),
                TradeSide::None => {}
            }
        }

        (buys, sells)
    }
}

/// Handles conversion from raw CSV frames to the typed log.
pub struct DataProcessor;

impl DataProcessor {
    /// Build a `StrategyLog` from a DataFrame holding the required columns.
    pub fn to_strategy_log(df: &DataFrame) -> Result<StrategyLog, ProcessorError> {
        let missing = DataLoader::missing_columns(df);
        if !missing.is_empty() {
            return Err(ProcessorError::MissingColumns(missing));
        }

        let timestamps = Self::timestamp_column(df)?;

        let trade_direction = Self::float_column(df, "trade_direction")?
            .into_iter()
            .map(TradeSide::from_direction)
            .collect();

        Ok(StrategyLog {
            timestamps,
            mid_price: Self::float_column(df, "mid_price")?,
            volume: Self::float_column(df, "volume")?,
            position: Self::float_column(df, "position")?,
            pnl: Self::float_column(df, "pnl")?,
            imbalance: Self::float_column(df, "imbalance")?,
            trade_direction,
            trade_price: Self::float_column(df, "trade_price")?,
        })
    }

    /// Parse a timestamp cell. Naive values are taken as UTC.
    pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }

        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    /// Parse the timestamp column and check it never goes backwards.
    fn timestamp_column(df: &DataFrame) -> Result<Vec<DateTime<Utc>>, ProcessorError> {
        let as_str = df.column("timestamp")?.cast(&DataType::String)?;
        let values = as_str.str()?;

        let mut timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(df.height());
        for (row, cell) in values.into_iter().enumerate() {
            let raw = cell.unwrap_or_default();
            let ts = Self::parse_timestamp(raw).ok_or_else(|| ProcessorError::InvalidTimestamp {
                row,
                value: raw.to_string(),
            })?;

            if timestamps.last().is_some_and(|prev| ts < *prev) {
                return Err(ProcessorError::NonMonotonicTimestamp { row });
            }
            timestamps.push(ts);
        }

        Ok(timestamps)
    }

    /// Cast a column to f64; nulls and unparsable cells become NaN.
    fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, ProcessorError> {
        let as_f64 = df.column(name)?.cast(&DataType::Float64)?;
        let values = as_f64.f64()?;

        Ok(values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }
}
