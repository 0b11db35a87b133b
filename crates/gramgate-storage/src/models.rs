// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! [`Account`] is canonical in `gramgate-core` because it crosses the
//! registry trait boundary; user and token rows are private to the
//! persistence layer and its direct consumers.

pub use gramgate_core::types::Account;

use gramgate_core::types::UserId;

/// One application user (account owner).
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[redacted]")
            .finish()
    }
}

/// One issued bearer token.
#[derive(Clone)]
pub struct ApiToken {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: String,
    pub created_at: String,
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiToken")
            .field("token", &"[redacted]")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
