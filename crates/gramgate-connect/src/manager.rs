// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle orchestration.
//!
//! Every public operation follows the same shape: resolve ownership,
//! lock the account's pool slot, drive the remote client, persist the
//! resulting status. The remote-facing body runs on a detached task so
//! a caller that gives up mid-handshake cannot strand a completed
//! authorization; the caller merely awaits the task's result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gramgate_core::{
    Account, AccountId, AccountOverview, AccountRegistry, AccountStatus, ClientFactory,
    ConnectOutcome, ConnectionPhase, DialogSummary, FolderSummary, GramgateError, SignInResult,
    UserId, VerifyCodeOutcome,
};
use metrics::{counter, gauge};
use tracing::{debug, info, warn};

use crate::attempt::ConnectAttempt;
use crate::pool::{ClientPool, SlotState};

/// Dialogs fetched when building an account overview.
const OVERVIEW_SAMPLE_LIMIT: usize = 10;

#[derive(Clone)]
pub struct ConnectionManager {
    registry: Arc<dyn AccountRegistry>,
    factory: Arc<dyn ClientFactory>,
    pool: Arc<ClientPool>,
    code_ttl: Duration,
}

/// Run an operation body on its own task. Dropping the returned future
/// abandons the wait, not the work.
async fn detached<T, F>(fut: F) -> Result<T, GramgateError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, GramgateError>> + Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(result) => result,
        Err(e) => Err(GramgateError::Internal(format!("lifecycle task failed: {e}"))),
    }
}

impl ConnectionManager {
    pub fn new(
        registry: Arc<dyn AccountRegistry>,
        factory: Arc<dyn ClientFactory>,
        code_ttl: Duration,
    ) -> Self {
        Self {
            registry,
            factory,
            pool: Arc::new(ClientPool::new()),
            code_ttl,
        }
    }

    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }

    /// Begin (or resume) connecting an account.
    ///
    /// Idempotent: a connected account answers `AlreadyOnline` and an
    /// unexpired pending challenge answers `CodeRequired`, neither with
    /// a remote call. A stored session blob is replayed before falling
    /// back to the code handshake.
    pub async fn connect(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<ConnectOutcome, GramgateError> {
        let this = self.clone();
        detached(async move { this.connect_inner(account_id, owner).await }).await
    }

    async fn connect_inner(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<ConnectOutcome, GramgateError> {
        let account = self.registry.account_for_owner(account_id, owner).await?;
        // A slot handed out before a concurrent teardown finished is
        // detached from the pool; take a fresh one instead of reviving
        // it. Teardown removes before marking, so this terminates.
        let mut state = loop {
            let slot = self.pool.slot(account_id);
            let guard = slot.lock_owned().await;
            if !guard.evicted {
                break guard;
            }
        };

        match state.phase {
            ConnectionPhase::Connected => {
                debug!(account = %account_id, "connect on live account is a no-op");
                return Ok(ConnectOutcome::AlreadyOnline);
            }
            ConnectionPhase::AwaitingCode | ConnectionPhase::AwaitingPassword => {
                let fresh = state
                    .attempt
                    .as_ref()
                    .is_some_and(|attempt| !attempt.is_expired());
                if fresh {
                    debug!(account = %account_id, "challenge still pending, not reissuing");
                    return Ok(ConnectOutcome::CodeRequired);
                }
                // Stale challenge; tear down and start over.
                if let Some(client) = state.clear() {
                    if let Err(e) = client.disconnect().await {
                        debug!(account = %account_id, error = %e, "stale client teardown failed");
                    }
                }
            }
            ConnectionPhase::Disconnected | ConnectionPhase::Faulted => {
                if let Some(client) = state.clear() {
                    if let Err(e) = client.disconnect().await {
                        debug!(account = %account_id, error = %e, "leftover client teardown failed");
                    }
                }
            }
        }

        counter!("gramgate_connect_attempts_total").increment(1);
        let prior_status = account.status;
        self.registry
            .update_status(account_id, AccountStatus::Connecting)
            .await?;

        match self.establish(&account, &mut state).await {
            Ok(outcome) => {
                gauge!("gramgate_pooled_clients").set(self.pool.len() as f64);
                Ok(outcome)
            }
            Err(err) => {
                if matches!(err, GramgateError::FloodWait { .. }) {
                    // Rate limiting says nothing about connection
                    // health; undo the transient `connecting` write.
                    if let Err(e) = self.registry.update_status(account_id, prior_status).await {
                        warn!(account = %account_id, error = %e, "status restore failed");
                    }
                } else {
                    self.persist_failure(account_id, &err, &mut state).await;
                }
                Err(err)
            }
        }
    }

    async fn establish(
        &self,
        account: &Account,
        state: &mut SlotState,
    ) -> Result<ConnectOutcome, GramgateError> {
        let client = self
            .factory
            .create(account.api_id, &account.api_hash, account.session_blob.as_ref())
            .await?;

        // Replay the stored session first; a blob that no longer
        // authorizes simply falls back to the code handshake.
        if account.session_blob.is_some() && client.is_authorized().await? {
            state.client = Some(client);
            state.phase = ConnectionPhase::Connected;
            self.registry
                .update_status(account.id, AccountStatus::Online)
                .await?;
            info!(account = %account.id, "session blob replayed, account online");
            return Ok(ConnectOutcome::Online);
        }

        let token = client.request_code(&account.phone).await?;
        state.client = Some(client);
        state.attempt = Some(ConnectAttempt::new(token, self.code_ttl));
        state.phase = ConnectionPhase::AwaitingCode;
        info!(account = %account.id, "login code requested");
        Ok(ConnectOutcome::CodeRequired)
    }

    /// Submit the login code for a pending challenge.
    pub async fn verify_code(
        &self,
        account_id: AccountId,
        owner: UserId,
        code: String,
    ) -> Result<VerifyCodeOutcome, GramgateError> {
        let this = self.clone();
        detached(async move { this.verify_code_inner(account_id, owner, &code).await }).await
    }

    async fn verify_code_inner(
        &self,
        account_id: AccountId,
        owner: UserId,
        code: &str,
    ) -> Result<VerifyCodeOutcome, GramgateError> {
        let account = self.registry.account_for_owner(account_id, owner).await?;
        let slot = self
            .pool
            .get(account_id)
            .ok_or(GramgateError::NotConnected)?;
        let mut state = slot.lock().await;

        if state.phase != ConnectionPhase::AwaitingCode {
            return Err(GramgateError::NotConnected);
        }
        let token = match state.attempt.as_ref() {
            Some(attempt) if attempt.is_expired() => {
                self.expire_challenge(account_id, &mut state).await;
                return Err(GramgateError::ExpiredCode);
            }
            Some(attempt) => attempt.token().clone(),
            None => return Err(GramgateError::NotConnected),
        };

        let result = match state.client.as_ref() {
            Some(client) => client.sign_in_code(&account.phone, &token, code).await,
            None => return Err(GramgateError::NotConnected),
        };

        match result {
            Ok(SignInResult::Authorized(blob)) => {
                self.registry.update_session_blob(account_id, &blob).await?;
                self.registry
                    .update_status(account_id, AccountStatus::Online)
                    .await?;
                state.attempt = None;
                state.phase = ConnectionPhase::Connected;
                counter!("gramgate_authorizations_total").increment(1);
                info!(account = %account_id, "code accepted, account online");
                Ok(VerifyCodeOutcome::Connected)
            }
            Ok(SignInResult::PasswordRequired { hint }) => {
                if let Some(attempt) = state.attempt.as_mut() {
                    attempt.advance_to_password(hint.clone());
                }
                state.phase = ConnectionPhase::AwaitingPassword;
                debug!(account = %account_id, "two-factor password required");
                Ok(VerifyCodeOutcome::PasswordRequired { hint })
            }
            // Wrong code is retryable against the same challenge.
            Err(err @ GramgateError::InvalidCode) => Err(err),
            Err(err @ GramgateError::FloodWait { .. }) => Err(err),
            Err(err @ GramgateError::ExpiredCode) => {
                self.expire_challenge(account_id, &mut state).await;
                Err(err)
            }
            Err(err) => {
                self.persist_failure(account_id, &err, &mut state).await;
                Err(err)
            }
        }
    }

    /// Submit the two-factor password after the code was accepted.
    pub async fn verify_password(
        &self,
        account_id: AccountId,
        owner: UserId,
        password: String,
    ) -> Result<(), GramgateError> {
        let this = self.clone();
        detached(async move { this.verify_password_inner(account_id, owner, &password).await })
            .await
    }

    async fn verify_password_inner(
        &self,
        account_id: AccountId,
        owner: UserId,
        password: &str,
    ) -> Result<(), GramgateError> {
        self.registry.account_for_owner(account_id, owner).await?;
        let slot = self
            .pool
            .get(account_id)
            .ok_or(GramgateError::NotConnected)?;
        let mut state = slot.lock().await;

        if state.phase != ConnectionPhase::AwaitingPassword {
            return Err(GramgateError::NotConnected);
        }
        match state.attempt.as_ref() {
            Some(attempt) if attempt.is_expired() => {
                self.expire_challenge(account_id, &mut state).await;
                return Err(GramgateError::ExpiredCode);
            }
            Some(_) => {}
            None => return Err(GramgateError::NotConnected),
        }

        let result = match state.client.as_ref() {
            Some(client) => client.sign_in_password(password).await,
            None => return Err(GramgateError::NotConnected),
        };

        match result {
            Ok(blob) => {
                self.registry.update_session_blob(account_id, &blob).await?;
                self.registry
                    .update_status(account_id, AccountStatus::Online)
                    .await?;
                state.attempt = None;
                state.phase = ConnectionPhase::Connected;
                counter!("gramgate_authorizations_total").increment(1);
                info!(account = %account_id, "password accepted, account online");
                Ok(())
            }
            // Wrong password is retryable against the same challenge.
            Err(err @ GramgateError::InvalidPassword) => Err(err),
            Err(err @ GramgateError::FloodWait { .. }) => Err(err),
            Err(err @ GramgateError::ExpiredCode) => {
                self.expire_challenge(account_id, &mut state).await;
                Err(err)
            }
            Err(err) => {
                self.persist_failure(account_id, &err, &mut state).await;
                Err(err)
            }
        }
    }

    /// Drop the live client but keep the stored session blob so a later
    /// connect can resume without a new handshake. Idempotent.
    pub async fn disconnect(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<(), GramgateError> {
        let this = self.clone();
        detached(async move { this.disconnect_inner(account_id, owner).await }).await
    }

    async fn disconnect_inner(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<(), GramgateError> {
        self.registry.account_for_owner(account_id, owner).await?;

        if let Some(slot) = self.pool.remove(account_id) {
            let mut state = slot.lock().await;
            if let Some(client) = state.evict() {
                if let Err(e) = client.disconnect().await {
                    warn!(account = %account_id, error = %e, "client disconnect failed");
                }
            }
        }
        self.registry
            .update_status(account_id, AccountStatus::Offline)
            .await?;
        gauge!("gramgate_pooled_clients").set(self.pool.len() as f64);
        info!(account = %account_id, "account disconnected");
        Ok(())
    }

    /// Sign out remotely and forget the stored session blob. The next
    /// connect starts a fresh handshake.
    pub async fn logout(&self, account_id: AccountId, owner: UserId) -> Result<(), GramgateError> {
        let this = self.clone();
        detached(async move { this.logout_inner(account_id, owner).await }).await
    }

    async fn logout_inner(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<(), GramgateError> {
        let account = self.registry.account_for_owner(account_id, owner).await?;

        if let Some(slot) = self.pool.remove(account_id) {
            let mut state = slot.lock().await;
            if let Some(client) = state.evict() {
                if let Err(e) = client.sign_out().await {
                    warn!(account = %account_id, error = %e, "remote sign-out failed");
                }
                if let Err(e) = client.disconnect().await {
                    debug!(account = %account_id, error = %e, "post-logout disconnect failed");
                }
            }
        } else if account.session_blob.is_some() {
            // No live client; revoke the stored session best effort.
            match self
                .factory
                .create(account.api_id, &account.api_hash, account.session_blob.as_ref())
                .await
            {
                Ok(client) => {
                    if let Err(e) = client.sign_out().await {
                        warn!(account = %account_id, error = %e, "remote sign-out failed");
                    }
                    if let Err(e) = client.disconnect().await {
                        debug!(account = %account_id, error = %e, "post-logout disconnect failed");
                    }
                }
                Err(e) => {
                    warn!(account = %account_id, error = %e, "could not reach server for sign-out");
                }
            }
        }

        // Local state is authoritative: the blob is gone even when the
        // remote revocation failed.
        self.registry.clear_session_blob(account_id).await?;
        self.registry
            .update_status(account_id, AccountStatus::Offline)
            .await?;
        info!(account = %account_id, "account logged out, session forgotten");
        Ok(())
    }

    pub async fn get_dialogs(
        &self,
        account_id: AccountId,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<DialogSummary>, GramgateError> {
        let this = self.clone();
        detached(async move { this.with_online_client(account_id, owner, move |client| {
            Box::pin(async move { client.get_dialogs(limit).await })
        })
        .await })
        .await
    }

    pub async fn get_folders(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<Vec<FolderSummary>, GramgateError> {
        let this = self.clone();
        detached(async move { this.with_online_client(account_id, owner, |client| {
            Box::pin(async move { client.get_folders().await })
        })
        .await })
        .await
    }

    pub async fn overview(
        &self,
        account_id: AccountId,
        owner: UserId,
    ) -> Result<AccountOverview, GramgateError> {
        let this = self.clone();
        detached(async move { this.with_online_client(account_id, owner, |client| {
            Box::pin(async move {
                let authorized = client.is_authorized().await?;
                let dialogs = client.get_dialogs(OVERVIEW_SAMPLE_LIMIT).await?;
                Ok(AccountOverview {
                    authorized,
                    dialogs_sample: dialogs.len(),
                })
            })
        })
        .await })
        .await
    }

    /// Shared read-path plumbing: ownership check, online check, run
    /// the closure against the pooled client, touch activity on
    /// success, classify on failure.
    async fn with_online_client<T>(
        &self,
        account_id: AccountId,
        owner: UserId,
        op: impl for<'a> FnOnce(
            &'a dyn gramgate_core::RawClient,
        ) -> std::pin::Pin<
            Box<dyn Future<Output = Result<T, GramgateError>> + Send + 'a>,
        > + Send,
    ) -> Result<T, GramgateError> {
        self.registry.account_for_owner(account_id, owner).await?;
        let slot = self
            .pool
            .get(account_id)
            .ok_or(GramgateError::NotConnected)?;
        let mut state = slot.lock().await;

        if state.phase != ConnectionPhase::Connected {
            return Err(GramgateError::NotConnected);
        }
        let result = match state.client.as_deref() {
            Some(client) => op(client).await,
            None => return Err(GramgateError::NotConnected),
        };

        match result {
            Ok(value) => {
                // Touching status refreshes last_activity.
                self.registry
                    .update_status(account_id, AccountStatus::Online)
                    .await?;
                Ok(value)
            }
            Err(err @ GramgateError::FloodWait { .. }) => Err(err),
            Err(err) => {
                self.persist_failure(account_id, &err, &mut state).await;
                Err(err)
            }
        }
    }

    /// Disconnect every pooled client. Used at shutdown; errors are
    /// logged, never propagated.
    pub async fn disconnect_all(&self) {
        let ids = self.pool.account_ids();
        info!(count = ids.len(), "disconnecting all pooled clients");
        for account_id in ids {
            if let Some(slot) = self.pool.remove(account_id) {
                let mut state = slot.lock().await;
                if let Some(client) = state.evict() {
                    if let Err(e) = client.disconnect().await {
                        warn!(account = %account_id, error = %e, "shutdown disconnect failed");
                    }
                }
                if let Err(e) = self
                    .registry
                    .update_status(account_id, AccountStatus::Offline)
                    .await
                {
                    warn!(account = %account_id, error = %e, "shutdown status write failed");
                }
            }
        }
        gauge!("gramgate_pooled_clients").set(0.0);
    }

    /// An aged-out challenge tears the slot down to `Disconnected`.
    async fn expire_challenge(&self, account_id: AccountId, state: &mut SlotState) {
        debug!(account = %account_id, "challenge expired, evicting");
        if let Some(client) = state.clear() {
            if let Err(e) = client.disconnect().await {
                debug!(account = %account_id, error = %e, "expired-challenge teardown failed");
            }
        }
        if let Err(e) = self
            .registry
            .update_status(account_id, AccountStatus::Offline)
            .await
        {
            warn!(account = %account_id, error = %e, "status write failed during expiry");
        }
    }

    /// Classify a remote failure into durable state. Only fatal errors
    /// persist the `error` status; everything else tears down to
    /// `offline`.
    async fn persist_failure(
        &self,
        account_id: AccountId,
        err: &GramgateError,
        state: &mut SlotState,
    ) {
        counter!("gramgate_connect_failures_total").increment(1);
        if err.is_fatal() {
            // A faulted account keeps no pool entry; the dead client is
            // torn down now rather than lingering in the slot.
            self.pool.remove(account_id);
            if let Some(client) = state.evict() {
                if let Err(e) = client.disconnect().await {
                    debug!(account = %account_id, error = %e, "faulted client teardown failed");
                }
            }
            state.phase = ConnectionPhase::Faulted;
            gauge!("gramgate_pooled_clients").set(self.pool.len() as f64);
            if let Err(e) = self
                .registry
                .update_status(account_id, AccountStatus::Error)
                .await
            {
                warn!(account = %account_id, error = %e, "error status write failed");
            }
            return;
        }

        if let Some(client) = state.clear() {
            if let Err(e) = client.disconnect().await {
                debug!(account = %account_id, error = %e, "failure teardown disconnect failed");
            }
        }
        if let Err(e) = self
            .registry
            .update_status(account_id, AccountStatus::Offline)
            .await
        {
            warn!(account = %account_id, error = %e, "offline status write failed");
        }
    }
}
