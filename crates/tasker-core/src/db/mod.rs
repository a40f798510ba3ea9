//! `SQLite` storage handle shared by every store.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` to allow concurrent readers while a writer commits
//! - `busy_timeout` from config (5s by default) to bound lock waits
//! - `foreign_keys = ON` so association rows follow their task
//!
//! A [`Database`] is cheap to clone; all clones share one lazily opened
//! connection behind a mutex, so operations are serialized through it.

pub mod fts;
pub mod schema;

use anyhow::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::StoreError;

/// Owned handle to the task database.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: DatabaseConfig,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    /// Create a handle without touching the filesystem. The connection is
    /// opened by [`Database::initialize`] or on first use.
    #[must_use]
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                conn: Mutex::new(None),
            }),
        }
    }

    /// Open a private in-memory database with the schema applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Self::new(DatabaseConfig::in_memory());
        db.initialize()?;
        Ok(db)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.config.path
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Open the connection and apply the schema. A no-op when already open.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be applied.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(open_connection(&self.inner.config)?);
        }
        drop(guard);
        Ok(())
    }

    /// Release the connection. The next operation reopens it.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` reports a failure while closing; the
    /// connection is dropped either way.
    pub fn close(&self) -> Result<(), StoreError> {
        let taken = self.lock().take();
        let Some(conn) = taken else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| StoreError::Close(e))?;
        info!(path = %self.path().display(), "database closed");
        Ok(())
    }

    /// Run `f` inside a deferred transaction, committing on success.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_transaction(TransactionBehavior::Deferred, f)
    }

    /// Run `f` inside an immediate (write-locked) transaction, committing on
    /// success and rolling back on error.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_transaction(TransactionBehavior::Immediate, f)
    }

    fn with_transaction<T>(
        &self,
        behavior: TransactionBehavior,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(open_connection(&self.inner.config)?);
        }
        let Some(conn) = guard.as_mut() else {
            unreachable!("connection populated above");
        };

        let tx = conn.transaction_with_behavior(behavior)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.inner
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn open_connection(config: &DatabaseConfig) -> Result<Connection, StoreError> {
    let path = config.path.as_path();

    let mut conn = if config.is_in_memory() {
        Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?
    };

    configure_connection(&conn, Duration::from_millis(config.busy_timeout_ms))
        .map_err(StoreError::Configure)?;
    schema::apply(&mut conn)?;

    info!(path = %path.display(), "database initialized");
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    debug!(journal_mode, busy_timeout_ms = busy_timeout.as_millis(), "connection configured");
    Ok(())
}
