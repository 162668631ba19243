//! DuckDB connection pool for the identity database.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use duckdb::Connection;

struct PoolInner {
    db_path: PathBuf,
    max_size: usize,
    idle: Mutex<Vec<Connection>>,
}

/// Hands out read-write connections to the identity database, reusing idle
/// ones up to `max_size`.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    pub fn new(path: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                db_path: path.into(),
                max_size: max_size.max(1),
                idle: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn acquire(&self) -> Result<PooledConnection, duckdb::Error> {
        let reused = self
            .inner
            .idle
            .lock()
            .expect("connection pool mutex poisoned")
            .pop();

        let connection = match reused {
            Some(connection) => connection,
            None => open_connection(self.inner.db_path.as_path())?,
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }
}

/// Connection that returns to the pool when dropped.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut idle = self
            .pool
            .idle
            .lock()
            .expect("connection pool mutex poisoned");
        if idle.len() < self.pool.max_size {
            idle.push(connection);
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection, duckdb::Error> {
    let connection = Connection::open(path)?;
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    Ok(connection)
}
