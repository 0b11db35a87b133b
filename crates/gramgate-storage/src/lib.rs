// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for gramgate.
//!
//! All access funnels through a single background connection
//! (`tokio-rusqlite`), which serializes writes and keeps WAL simple.
//! Schema changes live in `migrations/` and run at open.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use database::Database;
pub use models::{ApiToken, User};
pub use queries::accounts::AccountPatch;
pub use store::SqliteStore;
