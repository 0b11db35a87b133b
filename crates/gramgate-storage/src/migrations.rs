// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

use gramgate_core::GramgateError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations on the background connection.
///
/// Refinery tracks applied migrations in its own
/// `refinery_schema_history` table, so reopening an already-migrated
/// database is a no-op.
pub async fn run_migrations(
    conn: &tokio_rusqlite::Connection,
) -> Result<(), GramgateError> {
    conn.call(|conn| embedded::migrations::runner().run(conn).map(|_| ()))
        .await
        .map_err(|e: tokio_rusqlite::Error<refinery::Error>| GramgateError::Storage {
            source: Box::new(e),
        })
}
