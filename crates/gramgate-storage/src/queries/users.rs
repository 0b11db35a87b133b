// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User rows. Passwords are stored as argon2 hashes produced by the
//! gateway; this module never sees plaintext.

use gramgate_core::UserId;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::User;
use gramgate_core::GramgateError;

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Insert a new user. Returns `None` when the username is already taken.
pub async fn create_user(
    db: &Database,
    username: &str,
    password_hash: &str,
) -> Result<Option<User>, GramgateError> {
    let username = username.to_owned();
    let password_hash = password_hash.to_owned();
    let now = chrono::Utc::now().to_rfc3339();

    db.connection()
        .call(move |conn| {
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                params![username],
                |row| row.get(0),
            )?;
            if taken {
                return Ok(None);
            }
            conn.execute(
                "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
                params![username, password_hash, now],
            )?;
            let id = conn.last_insert_rowid();
            Ok(Some(User {
                id: UserId(id),
                username,
                password_hash,
                created_at: now,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a user by username for login.
pub async fn get_by_username(
    db: &Database,
    username: &str,
) -> Result<Option<User>, GramgateError> {
    let username = username.to_owned();
    db.connection()
        .call(move |conn| {
            let res = conn.query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            );
            match res {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_and_fetch_user() {
        let (db, _dir) = temp_db().await;

        let user = create_user(&db, "alice", "hash-a").await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.id.0 > 0);

        let fetched = get_by_username(&db, "alice").await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.password_hash, "hash-a");
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let (db, _dir) = temp_db().await;

        create_user(&db, "bob", "h1").await.unwrap().unwrap();
        let dup = create_user(&db, "bob", "h2").await.unwrap();
        assert!(dup.is_none());
    }

    #[tokio::test]
    async fn missing_user_is_none() {
        let (db, _dir) = temp_db().await;
        assert!(get_by_username(&db, "nobody").await.unwrap().is_none());
    }
}
