// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and
//! lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Query modules accept `&Database` and call through
//! `connection().call()`. Do NOT create additional Connection instances
//! for writes.

use gramgate_core::GramgateError;
use tracing::debug;

use crate::migrations;

/// A single SQLite connection running on a background thread.
///
/// Opening runs PRAGMA setup and all embedded migrations, so a
/// successfully opened `Database` always has a current schema.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending migrations.
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self, GramgateError> {
        let path = path.as_ref();
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_open_err)?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        })
        .await
        .map_err(map_tr_err)?;
        migrations::run_migrations(&conn).await?;

        debug!(path = %path.display(), "database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database. Test-only convenience.
    pub async fn open_in_memory() -> Result<Self, GramgateError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(map_open_err)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        })
        .await
        .map_err(map_tr_err)?;
        migrations::run_migrations(&conn).await?;
        Ok(Self { conn })
    }

    /// Access the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and flush pending writes.
    pub async fn close(&self) -> Result<(), GramgateError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite call error into the storage variant of the
/// taxonomy.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> GramgateError {
    GramgateError::Storage {
        source: Box::new(e),
    }
}

fn map_open_err(e: rusqlite::Error) -> GramgateError {
    GramgateError::Storage {
        source: Box::new(e),
    }
}
