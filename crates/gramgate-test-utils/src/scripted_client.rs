// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A scriptable [`RawClient`] double.
//!
//! Tests enqueue outcomes for each remote operation; unscripted calls
//! fall back to a benign default. Call counters let tests assert how
//! many remote round-trips an operation cost.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gramgate_core::{
    ChallengeToken, ClientFactory, DialogSummary, FolderSummary, GramgateError, RawClient,
    SessionBlob, SignInResult,
};

#[derive(Default)]
pub struct CallCounters {
    pub is_authorized: AtomicUsize,
    pub reconnect: AtomicUsize,
    pub request_code: AtomicUsize,
    pub sign_in_code: AtomicUsize,
    pub sign_in_password: AtomicUsize,
    pub sign_out: AtomicUsize,
    pub disconnect: AtomicUsize,
    pub get_dialogs: AtomicUsize,
    pub get_folders: AtomicUsize,
}

#[derive(Default)]
struct Script {
    authorized: VecDeque<Result<bool, GramgateError>>,
    code: VecDeque<Result<ChallengeToken, GramgateError>>,
    sign_in: VecDeque<Result<SignInResult, GramgateError>>,
    password: VecDeque<Result<SessionBlob, GramgateError>>,
    dialogs: VecDeque<Result<Vec<DialogSummary>, GramgateError>>,
    folders: VecDeque<Result<Vec<FolderSummary>, GramgateError>>,
}

pub struct ScriptedClient {
    pub counters: CallCounters,
    connected: AtomicBool,
    default_authorized: AtomicBool,
    script: Mutex<Script>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self {
            counters: CallCounters::default(),
            connected: AtomicBool::new(true),
            default_authorized: AtomicBool::new(false),
            script: Mutex::new(Script::default()),
        }
    }
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Client that reports an already-authorized session.
    pub fn authorized() -> Arc<Self> {
        let client = Self::default();
        client.default_authorized.store(true, Ordering::SeqCst);
        Arc::new(client)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn push_authorized(&self, result: Result<bool, GramgateError>) {
        self.script.lock().unwrap().authorized.push_back(result);
    }

    pub fn push_request_code(&self, result: Result<ChallengeToken, GramgateError>) {
        self.script.lock().unwrap().code.push_back(result);
    }

    pub fn push_sign_in_code(&self, result: Result<SignInResult, GramgateError>) {
        self.script.lock().unwrap().sign_in.push_back(result);
    }

    pub fn push_sign_in_password(&self, result: Result<SessionBlob, GramgateError>) {
        self.script.lock().unwrap().password.push_back(result);
    }

    pub fn push_dialogs(&self, result: Result<Vec<DialogSummary>, GramgateError>) {
        self.script.lock().unwrap().dialogs.push_back(result);
    }

    pub fn push_folders(&self, result: Result<Vec<FolderSummary>, GramgateError>) {
        self.script.lock().unwrap().folders.push_back(result);
    }
}

#[async_trait]
impl RawClient for ScriptedClient {
    async fn is_authorized(&self) -> Result<bool, GramgateError> {
        self.counters.is_authorized.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().authorized.pop_front() {
            Some(result) => result,
            None => Ok(self.default_authorized.load(Ordering::SeqCst)),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn reconnect(&self) -> Result<(), GramgateError> {
        self.counters.reconnect.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn request_code(&self, _phone: &str) -> Result<ChallengeToken, GramgateError> {
        let n = self.counters.request_code.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().code.pop_front() {
            Some(result) => result,
            None => Ok(ChallengeToken::new(format!("challenge-{n}"))),
        }
    }

    async fn sign_in_code(
        &self,
        _phone: &str,
        _token: &ChallengeToken,
        _code: &str,
    ) -> Result<SignInResult, GramgateError> {
        self.counters.sign_in_code.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().sign_in.pop_front() {
            Some(result) => result,
            None => {
                self.default_authorized.store(true, Ordering::SeqCst);
                Ok(SignInResult::Authorized(SessionBlob::new("scripted-blob")))
            }
        }
    }

    async fn sign_in_password(&self, _password: &str) -> Result<SessionBlob, GramgateError> {
        self.counters.sign_in_password.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().password.pop_front() {
            Some(result) => result,
            None => {
                self.default_authorized.store(true, Ordering::SeqCst);
                Ok(SessionBlob::new("scripted-blob-2fa"))
            }
        }
    }

    async fn sign_out(&self) -> Result<(), GramgateError> {
        self.counters.sign_out.fetch_add(1, Ordering::SeqCst);
        self.default_authorized.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), GramgateError> {
        self.counters.disconnect.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn get_dialogs(&self, _limit: usize) -> Result<Vec<DialogSummary>, GramgateError> {
        self.counters.get_dialogs.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().dialogs.pop_front() {
            Some(result) => result,
            None => Ok(Vec::new()),
        }
    }

    async fn get_folders(&self) -> Result<Vec<FolderSummary>, GramgateError> {
        self.counters.get_folders.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().folders.pop_front() {
            Some(result) => result,
            None => Ok(Vec::new()),
        }
    }
}

/// Delegating handle so a test can keep the [`Arc`] and inspect
/// counters after the factory hands the client out.
pub struct SharedClient(pub Arc<ScriptedClient>);

#[async_trait]
impl RawClient for SharedClient {
    async fn is_authorized(&self) -> Result<bool, GramgateError> {
        self.0.is_authorized().await
    }
    fn is_connected(&self) -> bool {
        self.0.is_connected()
    }
    async fn reconnect(&self) -> Result<(), GramgateError> {
        self.0.reconnect().await
    }
    async fn request_code(&self, phone: &str) -> Result<ChallengeToken, GramgateError> {
        self.0.request_code(phone).await
    }
    async fn sign_in_code(
        &self,
        phone: &str,
        token: &ChallengeToken,
        code: &str,
    ) -> Result<SignInResult, GramgateError> {
        self.0.sign_in_code(phone, token, code).await
    }
    async fn sign_in_password(&self, password: &str) -> Result<SessionBlob, GramgateError> {
        self.0.sign_in_password(password).await
    }
    async fn sign_out(&self) -> Result<(), GramgateError> {
        self.0.sign_out().await
    }
    async fn disconnect(&self) -> Result<(), GramgateError> {
        self.0.disconnect().await
    }
    async fn get_dialogs(&self, limit: usize) -> Result<Vec<DialogSummary>, GramgateError> {
        self.0.get_dialogs(limit).await
    }
    async fn get_folders(&self) -> Result<Vec<FolderSummary>, GramgateError> {
        self.0.get_folders().await
    }
}

/// Factory handing out pre-built scripted clients in order. Records the
/// session blob each creation received so tests can assert replay.
pub struct ScriptedFactory {
    queue: Mutex<VecDeque<Arc<ScriptedClient>>>,
    pub created: AtomicUsize,
    pub sessions_seen: Mutex<Vec<Option<String>>>,
}

impl ScriptedFactory {
    pub fn new(clients: impl IntoIterator<Item = Arc<ScriptedClient>>) -> Self {
        Self {
            queue: Mutex::new(clients.into_iter().collect()),
            created: AtomicUsize::new(0),
            sessions_seen: Mutex::new(Vec::new()),
        }
    }

    /// Factory producing a single reusable client.
    pub fn single(client: Arc<ScriptedClient>) -> Self {
        Self::new([client])
    }
}

#[async_trait]
impl ClientFactory for ScriptedFactory {
    async fn create(
        &self,
        _api_id: i32,
        _api_hash: &str,
        session: Option<&SessionBlob>,
    ) -> Result<Box<dyn RawClient>, GramgateError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.sessions_seen
            .lock()
            .unwrap()
            .push(session.map(|b| b.as_str().to_owned()));
        let client = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GramgateError::Internal("scripted factory exhausted".into()))?;
        Ok(Box::new(SharedClient(client)))
    }
}
