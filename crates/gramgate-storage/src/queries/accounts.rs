// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account rows. Phone numbers are unique per owner; ownership scoping
//! happens in SQL so a cross-owner id never leaks a row.

use std::str::FromStr;

use gramgate_core::{Account, AccountId, AccountStatus, GramgateError, SessionBlob, UserId};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

const ACCOUNT_COLUMNS: &str = "id, user_id, phone, api_id, api_hash, session_string, \
     name, status, last_activity, created_at, updated_at";

/// Partial update applied by `update_account`. `None` fields are left
/// untouched.
#[derive(Debug, Default, Clone)]
pub struct AccountPatch {
    pub phone: Option<String>,
    pub api_id: Option<i32>,
    pub api_hash: Option<String>,
    pub name: Option<String>,
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let status: String = row.get(7)?;
    Ok(Account {
        id: AccountId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        phone: row.get(2)?,
        api_id: row.get(3)?,
        api_hash: row.get(4)?,
        session_blob: row
            .get::<_, Option<String>>(5)?
            .map(SessionBlob::new),
        name: row.get(6)?,
        status: AccountStatus::from_str(&status).unwrap_or(AccountStatus::Offline),
        last_activity: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Insert a new account for `owner`. Returns `None` when the owner
/// already registered this phone number.
pub async fn create_account(
    db: &Database,
    owner: UserId,
    phone: &str,
    api_id: i32,
    api_hash: &str,
    name: Option<&str>,
) -> Result<Option<Account>, GramgateError> {
    let phone = phone.to_owned();
    let api_hash = api_hash.to_owned();
    let name = name.map(str::to_owned);
    let now = chrono::Utc::now().to_rfc3339();

    db.connection()
        .call(move |conn| {
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE user_id = ?1 AND phone = ?2)",
                params![owner.0, phone],
                |row| row.get(0),
            )?;
            if taken {
                return Ok(None);
            }
            conn.execute(
                "INSERT INTO accounts
                     (user_id, phone, api_id, api_hash, name, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'offline', ?6, ?6)",
                params![owner.0, phone, api_id, api_hash, name, now],
            )?;
            let id = conn.last_insert_rowid();
            Ok(Some(Account {
                id: AccountId(id),
                user_id: owner,
                phone,
                api_id,
                api_hash,
                session_blob: None,
                name,
                status: AccountStatus::Offline,
                last_activity: None,
                created_at: now.clone(),
                updated_at: now,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch an account only when `owner` owns it.
pub async fn get_for_owner(
    db: &Database,
    id: AccountId,
    owner: UserId,
) -> Result<Option<Account>, GramgateError> {
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1 AND user_id = ?2"
            );
            let res = conn.query_row(&sql, params![id.0, owner.0], account_from_row);
            match res {
                Ok(account) => Ok(Some(account)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List an owner's accounts, newest first.
pub async fn list_for_owner(
    db: &Database,
    owner: UserId,
    offset: i64,
    limit: i64,
) -> Result<Vec<Account>, GramgateError> {
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![owner.0, limit, offset], account_from_row)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update. Returns the updated row, or `None` when the
/// account does not exist or belongs to another owner.
pub async fn update_account(
    db: &Database,
    id: AccountId,
    owner: UserId,
    patch: AccountPatch,
) -> Result<Option<Account>, GramgateError> {
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE accounts SET
                     phone = COALESCE(?3, phone),
                     api_id = COALESCE(?4, api_id),
                     api_hash = COALESCE(?5, api_hash),
                     name = COALESCE(?6, name),
                     updated_at = ?7
                 WHERE id = ?1 AND user_id = ?2",
                params![id.0, owner.0, patch.phone, patch.api_id, patch.api_hash, patch.name, now],
            )?;
            if n == 0 {
                return Ok(None);
            }
            let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
            let account = conn.query_row(&sql, params![id.0], account_from_row)?;
            Ok(Some(account))
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an owner's account. Returns false when nothing matched.
pub async fn delete_account(
    db: &Database,
    id: AccountId,
    owner: UserId,
) -> Result<bool, GramgateError> {
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM accounts WHERE id = ?1 AND user_id = ?2",
                params![id.0, owner.0],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Persist a status transition and touch `last_activity`.
pub async fn update_status(
    db: &Database,
    id: AccountId,
    status: AccountStatus,
) -> Result<bool, GramgateError> {
    let status = status.to_string();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE accounts SET status = ?2, last_activity = ?3, updated_at = ?3
                 WHERE id = ?1",
                params![id.0, status, now],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Store the authorized session blob.
pub async fn update_session(
    db: &Database,
    id: AccountId,
    blob: &SessionBlob,
) -> Result<bool, GramgateError> {
    let blob = blob.as_str().to_owned();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE accounts SET session_string = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.0, blob, now],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Drop the stored session blob after logout.
pub async fn clear_session(db: &Database, id: AccountId) -> Result<bool, GramgateError> {
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE accounts SET session_string = NULL, updated_at = ?2 WHERE id = ?1",
                params![id.0, now],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    async fn seeded() -> (Database, UserId, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();
        let user = users::create_user(&db, "owner", "h").await.unwrap().unwrap();
        (db, user.id, dir)
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let (db, owner, _dir) = seeded().await;

        let account = create_account(&db, owner, "+15550001", 1234, "hash", Some("main"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.status, AccountStatus::Offline);
        assert!(account.session_blob.is_none());

        let fetched = get_for_owner(&db, account.id, owner).await.unwrap().unwrap();
        assert_eq!(fetched.phone, "+15550001");
        assert_eq!(fetched.name.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn duplicate_phone_per_owner_rejected() {
        let (db, owner, _dir) = seeded().await;

        create_account(&db, owner, "+15550001", 1, "h", None).await.unwrap().unwrap();
        let dup = create_account(&db, owner, "+15550001", 2, "h2", None).await.unwrap();
        assert!(dup.is_none());

        // Another owner may register the same phone.
        let other = users::create_user(&db, "other", "h").await.unwrap().unwrap();
        let ok = create_account(&db, other.id, "+15550001", 3, "h3", None).await.unwrap();
        assert!(ok.is_some());
    }

    #[tokio::test]
    async fn cross_owner_access_is_invisible() {
        let (db, owner, _dir) = seeded().await;
        let account = create_account(&db, owner, "+15550002", 1, "h", None)
            .await
            .unwrap()
            .unwrap();

        let other = users::create_user(&db, "intruder", "h").await.unwrap().unwrap();
        assert!(get_for_owner(&db, account.id, other.id).await.unwrap().is_none());
        assert!(!delete_account(&db, account.id, other.id).await.unwrap());
        assert!(
            update_account(&db, account.id, other.id, AccountPatch::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn patch_updates_only_given_fields() {
        let (db, owner, _dir) = seeded().await;
        let account = create_account(&db, owner, "+15550003", 1, "h", Some("old"))
            .await
            .unwrap()
            .unwrap();

        let patch = AccountPatch {
            name: Some("new".to_owned()),
            ..AccountPatch::default()
        };
        let updated = update_account(&db, account.id, owner, patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("new"));
        assert_eq!(updated.phone, "+15550003");
        assert_eq!(updated.api_id, 1);
    }

    #[tokio::test]
    async fn session_and_status_lifecycle() {
        let (db, owner, _dir) = seeded().await;
        let account = create_account(&db, owner, "+15550004", 1, "h", None)
            .await
            .unwrap()
            .unwrap();

        assert!(update_session(&db, account.id, &SessionBlob::new("blob-1")).await.unwrap());
        assert!(update_status(&db, account.id, AccountStatus::Online).await.unwrap());

        let fetched = get_for_owner(&db, account.id, owner).await.unwrap().unwrap();
        assert_eq!(fetched.status, AccountStatus::Online);
        assert_eq!(fetched.session_blob.unwrap().as_str(), "blob-1");
        assert!(fetched.last_activity.is_some());

        assert!(clear_session(&db, account.id).await.unwrap());
        let fetched = get_for_owner(&db, account.id, owner).await.unwrap().unwrap();
        assert!(fetched.session_blob.is_none());
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let (db, owner, _dir) = seeded().await;
        for i in 0..3 {
            create_account(&db, owner, &format!("+1555100{i}"), i, "h", None)
                .await
                .unwrap()
                .unwrap();
        }

        let page = list_for_owner(&db, owner, 0, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        let rest = list_for_owner(&db, owner, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        // Newest first by insertion order.
        assert_eq!(page[0].phone, "+15551002");
    }
}
