//! CSV Data Loader Module
//! Loads the strategy log with Polars and checks that every required column is present.

use log::debug;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Loads strategy log CSV files.
pub struct DataLoader;

impl DataLoader {
    /// Columns the chart reads, in log order.
    pub const REQUIRED_COLUMNS: [&'static str; 8] = [
        "timestamp",
        "mid_price",
        "volume",
        "position",
        "pnl",
        "imbalance",
        "trade_direction",
        "trade_price",
    ];

    /// Load a CSV file using Polars and validate its columns.
    ///
    /// Required columns are read with fixed types: `timestamp` as text, the
    /// rest as `Float64`. A cell that does not parse fails the whole load.
    pub fn load_csv(file_path: impl AsRef<Path>) -> Result<DataFrame, LoaderError> {
        let file_path = file_path.as_ref();

        let header = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .finish()?
            .collect_schema()?;
        let present: Vec<String> = header.iter_names().map(|s| s.to_string()).collect();

        let missing = Self::missing_from(&present);
        if !missing.is_empty() {
            return Err(LoaderError::MissingColumns(missing));
        }

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_dtype_overwrite(Some(Arc::new(Self::required_schema())))
            .finish()?
            .collect()?;

        for column in df.get_columns() {
            debug!("column {} -> {:?}", column.name(), column.dtype());
        }

        Ok(df)
    }

    /// Column types forced on the required columns.
    fn required_schema() -> Schema {
        Self::REQUIRED_COLUMNS
            .iter()
            .map(|&name| {
                let dtype = if name == "timestamp" {
                    DataType::String
                } else {
                    DataType::Float64
                };
                Field::new(name.into(), dtype)
            })
            .collect()
    }

    /// Required columns absent from `df`.
    pub fn missing_columns(df: &DataFrame) -> Vec<String> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        Self::missing_from(&present)
    }

    fn missing_from(present: &[String]) -> Vec<String> {
        Self::REQUIRED_COLUMNS
            .iter()
            .filter(|name| !present.iter().any(|p| p == *name))
            .map(|name| name.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "imbalance_vis_loader_{}_{}.csv",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_csv() {
        let path = write_temp_csv(
            "valid",
            "timestamp,mid_price,volume,position,pnl,imbalance,trade_direction,trade_price\n\
             2024-01-02 09:30:00,100,50,0,0,0.1,0,\n\
             2024-01-02 09:31:00,101,30,10,5,-0.2,1,101\n",
        );

        let df = DataLoader::load_csv(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 8);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_column_is_named() {
        let path = write_temp_csv(
            "missing",
            "timestamp,mid_price,volume,position,pnl,trade_direction,trade_price\n\
             2024-01-02 09:30:00,100,50,0,0,0,\n",
        );

        match DataLoader::load_csv(&path) {
            Err(LoaderError::MissingColumns(cols)) => assert_eq!(cols, vec!["imbalance"]),
            other => panic!("expected missing column error, got {:?}", other.map(|df| df.height())),
        }

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_fails() {
        let path = std::env::temp_dir().join("imbalance_vis_does_not_exist.csv");
        assert!(DataLoader::load_csv(&path).is_err());
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let df = df!(
            "timestamp" => ["2024-01-02 09:30:00"],
            "mid_price" => [100.0],
            "volume" => [50.0],
            "position" => [0.0],
            "pnl" => [0.0],
            "imbalance" => [0.1],
            "trade_direction" => [0i64],
            "trade_price" => [f64::NAN],
            "bid" => [99.5],
        )
        .unwrap();

        assert!(DataLoader::missing_columns(&df).is_empty());
    }

    fn log_header() -> &'static str {
        "timestamp,mid_price,volume,position,pnl,imbalance,trade_direction,trade_price\n"
    }

    #[test]
    fn test_late_decimal_keeps_value() {
        let mut contents = String::from(log_header());
        for i in 0..10_005 {
            let mid = if i < 10_000 { "5000" } else { "5000.5" };
            let price = if i == 10_004 { "101.25" } else { "101" };
            contents.push_str(&format!(
                "2024-01-02 09:30:{:02}.{:03},{},1,0,0,0,1,{}\n",
                i / 1000,
                i % 1000,
                mid,
                price
            ));
        }
        let path = write_temp_csv("late_decimal", &contents);

        let df = DataLoader::load_csv(&path).unwrap();
        assert_eq!(df.column("mid_price").unwrap().dtype(), &DataType::Float64);

        let mid = df.column("mid_price").unwrap().f64().unwrap();
        assert_eq!(mid.get(9_999), Some(5000.0));
        assert_eq!(mid.get(10_000), Some(5000.5));
        assert_eq!(mid.get(10_004), Some(5000.5));

        let price = df.column("trade_price").unwrap().f64().unwrap();
        assert_eq!(price.get(10_004), Some(101.25));

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_malformed_number_fails() {
        let path = write_temp_csv(
            "malformed",
            &format!(
                "{}2024-01-02 09:30:00,100,50,0,0,0.1,0,\n\
                 2024-01-02 09:31:00,101,lots,10,5,-0.2,1,101\n",
                log_header()
            ),
        );

        assert!(matches!(
            DataLoader::load_csv(&path),
            Err(LoaderError::CsvError(_))
        ));

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_empty_trade_price_is_null() {
        let path = write_temp_csv(
            "empty_price",
            &format!(
                "{}2024-01-02 09:30:00,100,50,0,0,0.1,0,\n\
                 2024-01-02 09:31:00,101,30,10,5,-0.2,1,101\n",
                log_header()
            ),
        );

        let df = DataLoader::load_csv(&path).unwrap();
        let price = df.column("trade_price").unwrap().f64().unwrap();
        assert_eq!(price.get(0), None);
        assert_eq!(price.get(1), Some(101.0));
        assert_eq!(df.column("timestamp").unwrap().dtype(), &DataType::String);

        fs::remove_file(path).ok();
    }
}
