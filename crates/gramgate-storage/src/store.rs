// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `SqliteStore` is the storage facade handed to the gateway and the
//! connection manager. It owns the [`Database`] and delegates to the
//! typed query modules.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use gramgate_core::{
    Account, AccountId, AccountRegistry, AccountStatus, GramgateError, SessionBlob, UserId,
};

use crate::database::Database;
use crate::models::{ApiToken, User};
use crate::queries::{accounts, tokens, users};
use crate::queries::accounts::AccountPatch;

#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, GramgateError> {
        let db = Database::open(path).await?;
        Ok(Self { db: Arc::new(db) })
    }

    /// In-memory store for tests.
    pub async fn open_in_memory() -> Result<Self, GramgateError> {
        let db = Database::open_in_memory().await?;
        Ok(Self { db: Arc::new(db) })
    }

    pub async fn close(&self) -> Result<(), GramgateError> {
        self.db.close().await
    }

    // Users.

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, GramgateError> {
        users::create_user(&self.db, username, password_hash).await
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, GramgateError> {
        users::get_by_username(&self.db, username).await
    }

    // Tokens.

    pub async fn insert_token(&self, token: &ApiToken) -> Result<(), GramgateError> {
        tokens::insert_token(&self.db, token).await
    }

    pub async fn user_for_token(&self, token: &str) -> Result<Option<UserId>, GramgateError> {
        tokens::user_for_token(&self.db, token).await
    }

    pub async fn purge_expired_tokens(&self) -> Result<usize, GramgateError> {
        tokens::purge_expired(&self.db).await
    }

    // Accounts.

    pub async fn create_account(
        &self,
        owner: UserId,
        phone: &str,
        api_id: i32,
        api_hash: &str,
        name: Option<&str>,
    ) -> Result<Account, GramgateError> {
        accounts::create_account(&self.db, owner, phone, api_id, api_hash, name)
            .await?
            .ok_or_else(|| GramgateError::AccountExists {
                phone: phone.to_owned(),
            })
    }

    pub async fn list_accounts(
        &self,
        owner: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Account>, GramgateError> {
        accounts::list_for_owner(&self.db, owner, offset, limit).await
    }

    pub async fn update_account(
        &self,
        id: AccountId,
        owner: UserId,
        patch: AccountPatch,
    ) -> Result<Account, GramgateError> {
        accounts::update_account(&self.db, id, owner, patch)
            .await?
            .ok_or(GramgateError::AccountNotFound)
    }

    pub async fn delete_account(&self, id: AccountId, owner: UserId) -> Result<(), GramgateError> {
        if accounts::delete_account(&self.db, id, owner).await? {
            Ok(())
        } else {
            Err(GramgateError::AccountNotFound)
        }
    }
}

#[async_trait]
impl AccountRegistry for SqliteStore {
    async fn account_for_owner(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<Account, GramgateError> {
        accounts::get_for_owner(&self.db, account_id, owner)
            .await?
            .ok_or(GramgateError::AccountNotFound)
    }

    async fn update_status(
        &self,
        account_id: AccountId,
        status: AccountStatus,
    ) -> Result<(), GramgateError> {
        if accounts::update_status(&self.db, account_id, status).await? {
            Ok(())
        } else {
            Err(GramgateError::AccountNotFound)
        }
    }

    async fn update_session_blob(
        &self,
        account_id: AccountId,
        blob: &SessionBlob,
    ) -> Result<(), GramgateError> {
        if accounts::update_session(&self.db, account_id, blob).await? {
            Ok(())
        } else {
            Err(GramgateError::AccountNotFound)
        }
    }

    async fn clear_session_blob(&self, account_id: AccountId) -> Result<(), GramgateError> {
        if accounts::clear_session(&self.db, account_id).await? {
            Ok(())
        } else {
            Err(GramgateError::AccountNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_scopes_by_owner() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let owner = store.create_user("a", "h").await.unwrap().unwrap();
        let other = store.create_user("b", "h").await.unwrap().unwrap();

        let account = store
            .create_account(owner.id, "+15550001", 1, "hash", None)
            .await
            .unwrap();

        assert!(store.account_for_owner(account.id, owner.id).await.is_ok());
        let err = store.account_for_owner(account.id, other.id).await.unwrap_err();
        assert!(matches!(err, GramgateError::AccountNotFound));
    }

    #[tokio::test]
    async fn duplicate_phone_maps_to_account_exists() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let owner = store.create_user("a", "h").await.unwrap().unwrap();

        store.create_account(owner.id, "+15550001", 1, "h", None).await.unwrap();
        let err = store
            .create_account(owner.id, "+15550001", 2, "h", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GramgateError::AccountExists { .. }));
    }

    #[tokio::test]
    async fn status_update_on_missing_account_fails() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let err = store
            .update_status(AccountId(999), AccountStatus::Online)
            .await
            .unwrap_err();
        assert!(matches!(err, GramgateError::AccountNotFound));
    }
}
