// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MTProto binding backed by the `grammers` crates. Compiled only with
//! the `grammers` feature; everything else in the workspace talks to
//! [`RawClient`] and never names this module.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use grammers_client::{Client, Config, InitParams, SignInError};
use grammers_session::Session;
use tokio::sync::Mutex;
use tracing::debug;

use gramgate_core::{
    ChallengeToken, ClientFactory, DialogSummary, FolderSummary, GramgateError, RawClient,
    SessionBlob, SignInResult,
};

/// Map an RPC failure onto the error taxonomy by error name.
fn map_rpc_error(name: &str, value: Option<u32>) -> GramgateError {
    match name {
        "FLOOD_WAIT" => GramgateError::FloodWait {
            seconds: value.unwrap_or(60),
        },
        "PHONE_CODE_INVALID" => GramgateError::InvalidCode,
        "PHONE_CODE_EXPIRED" => GramgateError::ExpiredCode,
        "PHONE_NUMBER_INVALID" | "PHONE_NUMBER_BANNED" => GramgateError::PhoneNumberInvalid,
        "API_ID_INVALID" | "API_ID_PUBLISHED_FLOOD" => GramgateError::InvalidApiCredentials,
        "PASSWORD_HASH_INVALID" => GramgateError::InvalidPassword,
        "AUTH_KEY_UNREGISTERED" | "SESSION_REVOKED" => GramgateError::NotConnected,
        other => GramgateError::Internal(format!("rpc error: {other}")),
    }
}

fn map_invocation(err: grammers_client::InvocationError) -> GramgateError {
    match err {
        grammers_client::InvocationError::Rpc(rpc) => map_rpc_error(&rpc.name, rpc.value),
        other => GramgateError::Internal(other.to_string()),
    }
}

fn encode_session(session: &Session) -> SessionBlob {
    SessionBlob::new(BASE64.encode(session.save()))
}

fn decode_session(blob: &SessionBlob) -> Result<Session, GramgateError> {
    let bytes = BASE64
        .decode(blob.as_str())
        .map_err(|e| GramgateError::Internal(format!("malformed session blob: {e}")))?;
    Session::load(&bytes).map_err(|e| GramgateError::Internal(format!("bad session: {e}")))
}

pub struct GrammersClient {
    client: Client,
    // The login/password tokens never leave the process; callers hold
    // an opaque challenge token that must match the issued one.
    login: Mutex<Option<(String, grammers_client::types::LoginToken)>>,
    password: Mutex<Option<grammers_client::types::PasswordToken>>,
    connected: AtomicBool,
}

impl GrammersClient {
    fn track<T>(&self, res: Result<T, GramgateError>) -> Result<T, GramgateError> {
        if let Err(GramgateError::Internal(_)) = &res {
            self.connected.store(false, Ordering::SeqCst);
        }
        res
    }
}

#[async_trait]
impl RawClient for GrammersClient {
    async fn is_authorized(&self) -> Result<bool, GramgateError> {
        let res = self.client.is_authorized().await.map_err(map_invocation);
        self.track(res)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn reconnect(&self) -> Result<(), GramgateError> {
        // The high-level client reconnects transparently on the next
        // invocation; probe it so failures surface here.
        self.client
            .is_authorized()
            .await
            .map_err(map_invocation)?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn request_code(&self, phone: &str) -> Result<ChallengeToken, GramgateError> {
        let token = self
            .client
            .request_login_code(phone)
            .await
            .map_err(|e| GramgateError::Internal(e.to_string()))?;
        let marker = uuid::Uuid::new_v4().to_string();
        *self.login.lock().await = Some((marker.clone(), token));
        debug!("login code requested");
        Ok(ChallengeToken::new(marker))
    }

    async fn sign_in_code(
        &self,
        _phone: &str,
        token: &ChallengeToken,
        code: &str,
    ) -> Result<SignInResult, GramgateError> {
        let mut slot = self.login.lock().await;
        let (marker, login) = match slot.take() {
            Some(pair) => pair,
            None => return Err(GramgateError::ExpiredCode),
        };
        if marker != token.as_str() {
            return Err(GramgateError::ExpiredCode);
        }

        match self.client.sign_in(&login, code).await {
            Ok(_user) => Ok(SignInResult::Authorized(encode_session(
                self.client.session(),
            ))),
            Err(SignInError::PasswordRequired(password_token)) => {
                let hint = password_token.hint().map(str::to_owned);
                *self.password.lock().await = Some(password_token);
                Ok(SignInResult::PasswordRequired { hint })
            }
            Err(SignInError::InvalidCode) => {
                // Keep the token so the caller may retry the code.
                *slot = Some((marker, login));
                Err(GramgateError::InvalidCode)
            }
            Err(SignInError::InvocationError(e)) => Err(map_invocation(e)),
            Err(other) => Err(GramgateError::Internal(other.to_string())),
        }
    }

    async fn sign_in_password(&self, password: &str) -> Result<SessionBlob, GramgateError> {
        let token = self
            .password
            .lock()
            .await
            .take()
            .ok_or(GramgateError::NotConnected)?;
        match self.client.check_password(token, password).await {
            Ok(_user) => Ok(encode_session(self.client.session())),
            Err(SignInError::InvalidPassword) => Err(GramgateError::InvalidPassword),
            Err(SignInError::InvocationError(e)) => Err(map_invocation(e)),
            Err(other) => Err(GramgateError::Internal(other.to_string())),
        }
    }

    async fn sign_out(&self) -> Result<(), GramgateError> {
        self.client
            .sign_out()
            .await
            .map_err(map_invocation)?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), GramgateError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn get_dialogs(&self, limit: usize) -> Result<Vec<DialogSummary>, GramgateError> {
        let mut iter = self.client.iter_dialogs().limit(limit);
        let mut out = Vec::new();
        loop {
            let dialog = match iter.next().await {
                Ok(Some(d)) => d,
                Ok(None) => break,
                Err(e) => return self.track(Err(map_invocation(e))),
            };
            let chat = dialog.chat();
            out.push(DialogSummary {
                id: chat.id(),
                title: Some(chat.name().to_owned()),
                username: chat.username().map(str::to_owned),
                unread_count: 0,
            });
        }
        Ok(out)
    }

    async fn get_folders(&self) -> Result<Vec<FolderSummary>, GramgateError> {
        use grammers_client::grammers_tl_types as tl;

        let filters = self
            .client
            .invoke(&tl::functions::messages::GetDialogFilters {})
            .await
            .map_err(map_invocation)?;
        let mut out = Vec::new();
        for filter in filters {
            if let tl::enums::DialogFilter::Filter(f) = filter {
                out.push(FolderSummary {
                    id: f.id,
                    title: f.title,
                });
            }
        }
        Ok(out)
    }
}

pub struct GrammersFactory;

#[async_trait]
impl ClientFactory for GrammersFactory {
    async fn create(
        &self,
        api_id: i32,
        api_hash: &str,
        session: Option<&SessionBlob>,
    ) -> Result<Box<dyn RawClient>, GramgateError> {
        let session = match session {
            Some(blob) => decode_session(blob)?,
            None => Session::new(),
        };
        let client = Client::connect(Config {
            session,
            api_id,
            api_hash: api_hash.to_owned(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| GramgateError::Internal(e.to_string()))?;

        Ok(Box::new(GrammersClient {
            client,
            login: Mutex::new(None),
            password: Mutex::new(None),
            connected: AtomicBool::new(true),
        }))
    }
}
