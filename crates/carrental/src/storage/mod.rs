//! Storage layer for carrental.
//!
//! This module provides the `SQLite` database handle shared by the car and
//! client registries and the rental lifecycle. The handle holds no open
//! connection: each operation asks for a fresh one through
//! [`Database::connect`] and drops it when done, so no session state is
//! shared between operations.

pub mod columns;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default time a connection waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the rental database.
///
/// Cloning is cheap; clones refer to the same database file.
#[derive(Debug, Clone)]
pub struct Database {
    /// Path to the database file.
    path: PathBuf,
    /// How long a connection waits for a lock held by another connection.
    busy_timeout: Duration,
}

impl Database {
    /// Open or create the database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then runs the storage initializer. Safe to call on every start.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create the database with a custom busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let db = Self { path, busy_timeout };
        db.initialize()?;

        info!("Database opened successfully at {}", db.path.display());
        Ok(db)
    }

    /// Ensure the schema exists and is at the current version.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unreachable or a migration fails.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;

        // WAL is persistent, so setting it once here covers later connections.
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Journal mode is {}", mode);
        conn.execute_batch("PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)
    }

    /// Open a new connection for a single operation.
    ///
    /// Foreign-key enforcement is switched on for every connection since
    /// `SQLite` leaves it off by default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the file cannot be opened.
    pub fn connect(&self) -> Result<Connection> {
        debug!("Opening connection to {}", self.path.display());
        let conn = Connection::open(&self.path).map_err(|source| Error::StorageUnavailable {
            path: self.path.clone(),
            source,
        })?;

        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the busy timeout applied to each connection.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let conn = self.connect()?;

        let cars: i64 = conn.query_row("SELECT COUNT(*) FROM Cars", [], |row| row.get(0))?;
        let clients: i64 = conn.query_row("SELECT COUNT(*) FROM Clients", [], |row| row.get(0))?;
        let (open_rentals, closed_rentals): (i64, i64) = conn.query_row(
            r"
            SELECT
                COALESCE(SUM(CASE WHEN EndTime IS NULL THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN EndTime IS NULL THEN 0 ELSE 1 END), 0)
            FROM Rentals
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = std::fs::metadata(&self.path).map_or(0, |m| m.len());

        Ok(StorageStats {
            cars,
            clients,
            open_rentals,
            closed_rentals,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of registered cars.
    pub cars: i64,
    /// Number of registered clients.
    pub clients: i64,
    /// Rentals without an end time.
    pub open_rentals: i64,
    /// Rentals that have been closed and billed.
    pub closed_rentals: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
