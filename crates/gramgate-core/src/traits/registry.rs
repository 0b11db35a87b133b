// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account registry trait: the durable-store collaborator consumed by
//! the connection orchestrator.

use async_trait::async_trait;

use crate::error::GramgateError;
use crate::types::{Account, AccountId, AccountStatus, SessionBlob, UserId};

/// Durable account store consumed by the connection orchestrator.
///
/// Implemented by `gramgate-storage` over SQLite. Ownership checks live
/// here: [`account_for_owner`] reports [`GramgateError::AccountNotFound`]
/// both for missing accounts and for accounts owned by someone else, so
/// existence never leaks across users.
///
/// [`account_for_owner`]: AccountRegistry::account_for_owner
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    /// Fetch an account, enforcing ownership.
    async fn account_for_owner(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<Account, GramgateError>;

    /// Persist a new durable status and touch `last_activity`.
    async fn update_status(
        &self,
        account_id: AccountId,
        status: AccountStatus,
    ) -> Result<(), GramgateError>;

    /// Persist a session blob after a successful authentication.
    async fn update_session_blob(
        &self,
        account_id: AccountId,
        blob: &SessionBlob,
    ) -> Result<(), GramgateError>;

    /// Discard the stored session blob (logout path).
    async fn clear_session_blob(&self, account_id: AccountId) -> Result<(), GramgateError>;
}
