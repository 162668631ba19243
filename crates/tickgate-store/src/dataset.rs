//! Parquet-backed dataset source, read through an in-memory DuckDB session.

use std::path::{Path, PathBuf};

use duckdb::Connection;

use tickgate_core::dataset::{CandleRow, DatasetError, DatasetSource};
use tickgate_core::{Candle, Symbol, TradingDate};

use crate::escape_sql_string;

/// Bulk reader over one parquet file (or glob) with columns
/// `symbol, date, open, high, low, close, volume`.
pub struct ParquetDataset {
    path: PathBuf,
}

impl ParquetDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

impl DatasetSource for ParquetDataset {
    fn load_all(&self) -> Result<Vec<CandleRow>, DatasetError> {
        let connection = Connection::open_in_memory()
            .map_err(|error| DatasetError::new(format!("duckdb session failed: {error}")))?;

        let sql = format!(
            r#"
SELECT
    symbol,
    CAST(date AS VARCHAR),
    open, high, low, close,
    TRY_CAST(volume AS BIGINT)
FROM read_parquet('{path}')
ORDER BY symbol, date
"#,
            path = escape_sql_string(path_to_sql(self.path.as_path()).as_str()),
        );

        let mut statement = connection
            .prepare(sql.as_str())
            .map_err(|error| DatasetError::new(format!("dataset read failed: {error}")))?;
        let mut cursor = statement
            .query([])
            .map_err(|error| DatasetError::new(format!("dataset read failed: {error}")))?;

        let mut rows = Vec::new();
        loop {
            let row = cursor
                .next()
                .map_err(|error| DatasetError::new(format!("dataset read failed: {error}")))?;
            let Some(row) = row else {
                break;
            };

            rows.push(read_candle_row(row)?);
        }

        Ok(rows)
    }
}

fn read_candle_row(row: &duckdb::Row<'_>) -> Result<CandleRow, DatasetError> {
    let raw: Result<(String, String, f64, f64, f64, f64, Option<i64>), duckdb::Error> = (|| {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
        ))
    })();
    let (symbol, date, open, high, low, close, volume) =
        raw.map_err(|error| DatasetError::new(format!("dataset row read failed: {error}")))?;

    let parsed_symbol = Symbol::parse(symbol.as_str())
        .map_err(|error| DatasetError::new(format!("bad symbol '{symbol}': {error}")))?;
    let parsed_date = TradingDate::parse(date.as_str())
        .map_err(|error| DatasetError::new(format!("bad date '{date}': {error}")))?;
    let volume = volume.and_then(|volume| u64::try_from(volume).ok());

    let candle = Candle::new(parsed_date, open, high, low, close, volume)
        .map_err(|error| DatasetError::new(format!("bad candle for '{symbol}': {error}")))?;

    Ok(CandleRow {
        symbol: parsed_symbol,
        candle,
    })
}

fn path_to_sql(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
