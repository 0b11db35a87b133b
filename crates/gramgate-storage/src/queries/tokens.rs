// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque bearer tokens. Expiry is enforced at lookup time; a periodic
//! purge keeps the table from growing unbounded.

use gramgate_core::{GramgateError, UserId};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::ApiToken;

/// Persist a freshly issued token.
pub async fn insert_token(db: &Database, token: &ApiToken) -> Result<(), GramgateError> {
    let token = token.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO api_tokens (token, user_id, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![token.token, token.user_id.0, token.expires_at, token.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Resolve a bearer token to its owner. Expired or unknown tokens
/// resolve to `None`; callers turn that into an auth failure.
pub async fn user_for_token(
    db: &Database,
    token: &str,
) -> Result<Option<UserId>, GramgateError> {
    let token = token.to_owned();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let res = conn.query_row(
                "SELECT user_id FROM api_tokens WHERE token = ?1 AND expires_at > ?2",
                params![token, now],
                |row| row.get::<_, i64>(0),
            );
            match res {
                Ok(id) => Ok(Some(UserId(id))),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Delete expired tokens. Returns the number removed.
pub async fn purge_expired(db: &Database) -> Result<usize, GramgateError> {
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let n = conn.execute("DELETE FROM api_tokens WHERE expires_at <= ?1", params![now])?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    async fn temp_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();
        (db, dir)
    }

    fn token_for(user_id: UserId, value: &str, hours_from_now: i64) -> ApiToken {
        let now = chrono::Utc::now();
        ApiToken {
            token: value.to_owned(),
            user_id,
            expires_at: (now + chrono::Duration::hours(hours_from_now)).to_rfc3339(),
            created_at: now.to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn valid_token_resolves_owner() {
        let (db, _dir) = temp_db().await;
        let user = users::create_user(&db, "alice", "h").await.unwrap().unwrap();

        insert_token(&db, &token_for(user.id, "tok-1", 24)).await.unwrap();

        let owner = user_for_token(&db, "tok-1").await.unwrap();
        assert_eq!(owner, Some(user.id));
    }

    #[tokio::test]
    async fn expired_token_resolves_none() {
        let (db, _dir) = temp_db().await;
        let user = users::create_user(&db, "bob", "h").await.unwrap().unwrap();

        insert_token(&db, &token_for(user.id, "tok-old", -1)).await.unwrap();

        assert_eq!(user_for_token(&db, "tok-old").await.unwrap(), None);
        assert_eq!(purge_expired(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_token_resolves_none() {
        let (db, _dir) = temp_db().await;
        assert_eq!(user_for_token(&db, "nope").await.unwrap(), None);
    }
}
