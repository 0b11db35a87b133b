// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Policy wrapper around a raw MTProto client.
//!
//! Every remote call gets a hard deadline, and dropped connections are
//! re-established at most `reconnect_budget` times per client before
//! the account is declared faulted. A timed-out call never applies a
//! durable mutation; callers see [`GramgateError::Timeout`] and decide
//! what to persist.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gramgate_core::{
    ChallengeToken, ClientFactory, DialogSummary, FolderSummary, GramgateError, RawClient,
    SessionBlob, SignInResult,
};
use tracing::{debug, warn};

pub struct ClientAdapter {
    inner: Box<dyn RawClient>,
    timeout: Duration,
    reconnect_budget: u32,
    reconnects_used: AtomicU32,
}

impl ClientAdapter {
    pub fn new(inner: Box<dyn RawClient>, timeout: Duration, reconnect_budget: u32) -> Self {
        Self {
            inner,
            timeout,
            reconnect_budget,
            reconnects_used: AtomicU32::new(0),
        }
    }

    async fn deadline<T, F>(&self, fut: F) -> Result<T, GramgateError>
    where
        F: Future<Output = Result<T, GramgateError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(GramgateError::Timeout {
                duration: self.timeout,
            }),
        }
    }

    /// Re-establish the transport if it dropped, charging the budget.
    async fn ensure_connected(&self) -> Result<(), GramgateError> {
        if self.inner.is_connected() {
            return Ok(());
        }
        let used = self.reconnects_used.fetch_add(1, Ordering::SeqCst);
        if used >= self.reconnect_budget {
            warn!(budget = self.reconnect_budget, "reconnect budget exhausted");
            return Err(GramgateError::Internal(format!(
                "connection lost after {} reconnect attempts",
                self.reconnect_budget
            )));
        }
        debug!(attempt = used + 1, "reconnecting dropped transport");
        self.deadline(self.inner.reconnect()).await
    }
}

#[async_trait]
impl RawClient for ClientAdapter {
    async fn is_authorized(&self) -> Result<bool, GramgateError> {
        self.ensure_connected().await?;
        self.deadline(self.inner.is_authorized()).await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn reconnect(&self) -> Result<(), GramgateError> {
        self.ensure_connected().await
    }

    async fn request_code(&self, phone: &str) -> Result<ChallengeToken, GramgateError> {
        self.ensure_connected().await?;
        self.deadline(self.inner.request_code(phone)).await
    }

    async fn sign_in_code(
        &self,
        phone: &str,
        token: &ChallengeToken,
        code: &str,
    ) -> Result<SignInResult, GramgateError> {
        self.ensure_connected().await?;
        self.deadline(self.inner.sign_in_code(phone, token, code)).await
    }

    async fn sign_in_password(&self, password: &str) -> Result<SessionBlob, GramgateError> {
        self.ensure_connected().await?;
        self.deadline(self.inner.sign_in_password(password)).await
    }

    async fn sign_out(&self) -> Result<(), GramgateError> {
        self.ensure_connected().await?;
        self.deadline(self.inner.sign_out()).await
    }

    async fn disconnect(&self) -> Result<(), GramgateError> {
        // Best effort, still bounded. A dead transport has nothing to
        // tear down.
        if !self.inner.is_connected() {
            return Ok(());
        }
        self.deadline(self.inner.disconnect()).await
    }

    async fn get_dialogs(&self, limit: usize) -> Result<Vec<DialogSummary>, GramgateError> {
        self.ensure_connected().await?;
        self.deadline(self.inner.get_dialogs(limit)).await
    }

    async fn get_folders(&self) -> Result<Vec<FolderSummary>, GramgateError> {
        self.ensure_connected().await?;
        self.deadline(self.inner.get_folders()).await
    }
}

/// Factory that wraps every created client in a [`ClientAdapter`].
pub struct AdapterFactory {
    inner: Box<dyn ClientFactory>,
    timeout: Duration,
    reconnect_budget: u32,
}

impl AdapterFactory {
    pub fn new(inner: Box<dyn ClientFactory>, timeout: Duration, reconnect_budget: u32) -> Self {
        Self {
            inner,
            timeout,
            reconnect_budget,
        }
    }
}

#[async_trait]
impl ClientFactory for AdapterFactory {
    async fn create(
        &self,
        api_id: i32,
        api_hash: &str,
        session: Option<&SessionBlob>,
    ) -> Result<Box<dyn RawClient>, GramgateError> {
        let raw = self.inner.create(api_id, api_hash, session).await?;
        Ok(Box::new(ClientAdapter::new(
            raw,
            self.timeout,
            self.reconnect_budget,
        )))
    }
}
