pub mod dataset;
pub mod identity_store;
pub mod migrations;
pub mod pool;

use std::env;
use std::path::PathBuf;

use ::duckdb::Connection;
use thiserror::Error;

pub use dataset::ParquetDataset;
pub use identity_store::DuckDbIdentityStore;
pub use pool::{ConnectionPool, PooledConnection};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("corrupt row in '{table}': {detail}")]
    CorruptRow { table: &'static str, detail: String },
}

impl From<BackendError> for tickgate_core::StoreError {
    fn from(error: BackendError) -> Self {
        Self::Unavailable(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub tickgate_home: PathBuf,
    pub db_path: PathBuf,
    pub max_pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let tickgate_home = resolve_tickgate_home();
        let db_path = tickgate_home.join("identities.duckdb");
        Self {
            tickgate_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// `TICKGATE_HOME` wins; otherwise `$HOME/.tickgate`, then a relative
/// `.tickgate` as the last resort.
pub fn resolve_tickgate_home() -> PathBuf {
    if let Some(path) = env::var_os("TICKGATE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tickgate");
    }

    PathBuf::from(".tickgate")
}

/// Dataset location: `TICKGATE_DATASET` if set, else `<home>/dataset.parquet`.
pub fn resolve_dataset_path() -> PathBuf {
    if let Some(path) = env::var_os("TICKGATE_DATASET") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    resolve_tickgate_home().join("dataset.parquet")
}

pub(crate) fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, BackendError>,
) -> Result<T, BackendError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

pub(crate) fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
