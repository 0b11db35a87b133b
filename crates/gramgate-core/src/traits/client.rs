// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits over the remote messaging SDK.
//!
//! The wire protocol itself is opaque to Gramgate: everything above this
//! seam works in terms of `request code`, `sign in`, `fetch dialogs`.
//! Implementations live in `gramgate-mtproto` (production binding) and
//! `gramgate-test-utils` (scripted double). Implementations must already
//! map their SDK's error types into [`GramgateError`]; no third-party
//! error type crosses this boundary.

use async_trait::async_trait;

use crate::error::GramgateError;
use crate::types::{
    ChallengeToken, DialogSummary, FolderSummary, SessionBlob, SignInResult,
};

/// One live connection to the remote messaging service for a single
/// account.
#[async_trait]
pub trait RawClient: Send + Sync {
    /// Whether the session behind this client is fully authorized.
    async fn is_authorized(&self) -> Result<bool, GramgateError>;

    /// Whether the underlying transport is currently up.
    fn is_connected(&self) -> bool;

    /// Re-establish a dropped transport using the stored session state.
    async fn reconnect(&self) -> Result<(), GramgateError>;

    /// Ask the remote service to send a verification code to `phone`.
    /// Returns the challenge token required to redeem the code.
    async fn request_code(&self, phone: &str) -> Result<ChallengeToken, GramgateError>;

    /// Redeem a verification code against a pending challenge.
    async fn sign_in_code(
        &self,
        phone: &str,
        token: &ChallengeToken,
        code: &str,
    ) -> Result<SignInResult, GramgateError>;

    /// Complete a two-factor sign-in with the account password.
    async fn sign_in_password(&self, password: &str)
        -> Result<SessionBlob, GramgateError>;

    /// Invalidate the session on the remote side.
    async fn sign_out(&self) -> Result<(), GramgateError>;

    /// Close the transport without invalidating the remote session.
    async fn disconnect(&self) -> Result<(), GramgateError>;

    /// Fetch a page of conversation summaries.
    async fn get_dialogs(&self, limit: usize) -> Result<Vec<DialogSummary>, GramgateError>;

    /// Fetch the account's chat folders.
    async fn get_folders(&self) -> Result<Vec<FolderSummary>, GramgateError>;
}

/// Constructs [`RawClient`] instances from an account's API key pair and
/// optional stored session blob.
///
/// Construction fails with [`GramgateError::InvalidApiCredentials`] when
/// the remote side rejects the key pair outright.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(
        &self,
        api_id: i32,
        api_hash: &str,
        session: Option<&SessionBlob>,
    ) -> Result<Box<dyn RawClient>, GramgateError>;
}
