// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Gramgate workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a registered external-platform account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an application user (account owner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable connection status of an account, persisted in the registry.
///
/// `status` always reflects the last observed outcome of an operation;
/// the only in-progress value is `Connecting`, written while a handshake
/// is in flight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Offline,
    Connecting,
    Online,
    Error,
}

/// In-memory phase of an account's connection lifecycle.
///
/// Unlike [`AccountStatus`] this is never persisted; it lives on the
/// pool entry for the duration of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionPhase {
    Disconnected,
    AwaitingCode,
    AwaitingPassword,
    Connected,
    Faulted,
}

/// Opaque serialized credential proving a prior successful
/// authentication. Replayable to skip re-entering a code.
///
/// Debug output intentionally omits the contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBlob(String);

impl SessionBlob {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for SessionBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionBlob").field(&"[redacted]").finish()
    }
}

/// Short-lived handle returned by a "request code" call, required to
/// redeem the verification code.
#[derive(Clone, PartialEq, Eq)]
pub struct ChallengeToken(String);

impl ChallengeToken {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ChallengeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ChallengeToken").field(&"[redacted]").finish()
    }
}

/// One registered external-platform account, as stored in the registry.
#[derive(Clone)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub phone: String,
    pub api_id: i32,
    pub api_hash: String,
    pub session_blob: Option<SessionBlob>,
    pub name: Option<String>,
    pub status: AccountStatus,
    pub last_activity: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("phone", &self.phone)
            .field("api_id", &self.api_id)
            .field("api_hash", &"[redacted]")
            .field("session_blob", &self.session_blob.as_ref().map(|_| "[redacted]"))
            .field("name", &self.name)
            .field("status", &self.status)
            .finish()
    }
}

/// Result of redeeming a verification code against the remote service.
#[derive(Debug, Clone)]
pub enum SignInResult {
    /// Fully authorized; carries the session blob to persist.
    Authorized(SessionBlob),
    /// Code accepted but a two-factor password is still required.
    PasswordRequired { hint: Option<String> },
}

/// Outcome of a `connect` lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Session blob replayed (or already live); account is online.
    Online,
    /// The account was already online; no remote call was issued.
    AlreadyOnline,
    /// A verification code was sent to the account's phone.
    CodeRequired,
}

/// Outcome of a `verify_code` lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyCodeOutcome {
    /// Signed in; account is online and the blob is persisted.
    Connected,
    /// Code accepted; a two-factor password must follow.
    PasswordRequired { hint: Option<String> },
}

/// Read-only projection of one conversation for the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogSummary {
    pub id: i64,
    pub title: Option<String>,
    pub username: Option<String>,
    pub unread_count: i32,
}

/// Read-only projection of one chat folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSummary {
    pub id: i32,
    pub title: String,
}

/// Aggregated per-account view: authorization flag plus a small dialog
/// sample count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOverview {
    pub authorized: bool,
    pub dialogs_sample: usize,
}
