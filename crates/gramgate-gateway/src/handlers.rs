// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account CRUD and connection lifecycle handlers. All handlers run
//! behind the bearer middleware; the owner arrives as an extension.

use std::sync::LazyLock;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use gramgate_core::{
    Account, AccountId, AccountOverview, ConnectOutcome, DialogSummary, FolderSummary,
    GramgateError, UserId, VerifyCodeOutcome,
};
use gramgate_storage::AccountPatch;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::server::AppState;

// E.164: plus sign, then 7 to 15 digits, no leading zero.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("phone pattern"));

fn validate_phone(phone: &str) -> Result<(), GramgateError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(GramgateError::PhoneNumberInvalid)
    }
}

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub phone: String,
    pub api_id: i32,
    pub api_hash: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    pub phone: Option<String>,
    pub api_id: Option<i32>,
    pub api_hash: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct DialogsParams {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

#[derive(Deserialize)]
pub struct VerifyPasswordRequest {
    pub password: String,
}

/// Wire shape of an account. Credentials and session material never
/// leave the server.
#[derive(Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub phone: String,
    pub api_id: i32,
    pub name: Option<String>,
    pub status: String,
    pub has_session: bool,
    pub last_activity: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.0,
            phone: account.phone,
            api_id: account.api_id,
            name: account.name,
            status: account.status.to_string(),
            has_session: account.session_blob.is_some(),
            last_activity: account.last_activity,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

fn validate_create(req: &CreateAccountRequest) -> Result<(), GramgateError> {
    validate_phone(&req.phone)?;
    if req.api_id <= 0 {
        return Err(GramgateError::InvalidApiCredentials);
    }
    if req.api_hash.trim().is_empty() {
        return Err(GramgateError::InvalidApiCredentials);
    }
    Ok(())
}

pub async fn create_account(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    validate_create(&req)?;
    let account = state
        .store
        .create_account(owner, &req.phone, req.api_id, &req.api_hash, req.name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let offset = params.offset.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    let accounts = state.store.list_accounts(owner, offset, limit).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

pub async fn get_account(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, ApiError> {
    use gramgate_core::AccountRegistry as _;
    let account = state.store.account_for_owner(AccountId(id), owner).await?;
    Ok(Json(account.into()))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if let Some(phone) = &req.phone {
        validate_phone(phone)?;
    }
    if matches!(req.api_id, Some(api_id) if api_id <= 0) {
        return Err(GramgateError::InvalidApiCredentials.into());
    }
    let patch = AccountPatch {
        phone: req.phone,
        api_id: req.api_id,
        api_hash: req.api_hash,
        name: req.name,
    };
    let account = state.store.update_account(AccountId(id), owner, patch).await?;
    Ok(Json(account.into()))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    // Disconnect is idempotent, so tearing down a live client first is
    // safe whether or not one is pooled.
    state.manager.disconnect(AccountId(id), owner).await?;
    state.store.delete_account(AccountId(id), owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn connect_body(outcome: ConnectOutcome) -> serde_json::Value {
    match outcome {
        ConnectOutcome::Online => json!({ "outcome": "online", "status": "online" }),
        ConnectOutcome::AlreadyOnline => {
            json!({ "outcome": "already_online", "status": "online", "message": "already connected" })
        }
        ConnectOutcome::CodeRequired => {
            json!({ "outcome": "code_required", "status": "connecting" })
        }
    }
}

pub async fn connect(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state.manager.connect(AccountId(id), owner).await?;
    Ok(Json(connect_body(outcome)))
}

pub async fn verify_code(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state.manager.verify_code(AccountId(id), owner, req.code).await?;
    let body = match outcome {
        VerifyCodeOutcome::Connected => json!({ "outcome": "connected", "status": "online" }),
        VerifyCodeOutcome::PasswordRequired { hint } => {
            json!({ "outcome": "password_required", "status": "connecting", "hint": hint })
        }
    };
    Ok(Json(body))
}

pub async fn verify_password(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
    Json(req): Json<VerifyPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .manager
        .verify_password(AccountId(id), owner, req.password)
        .await?;
    Ok(Json(json!({ "outcome": "connected", "status": "online" })))
}

pub async fn disconnect(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.manager.disconnect(AccountId(id), owner).await?;
    Ok(Json(json!({ "status": "offline" })))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.manager.logout(AccountId(id), owner).await?;
    Ok(Json(json!({ "status": "offline", "session_cleared": true })))
}

pub async fn dialogs(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
    Query(params): Query<DialogsParams>,
) -> Result<Json<Vec<DialogSummary>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(state.dialogs_page_limit)
        .clamp(1, state.dialogs_page_limit);
    let dialogs = state.manager.get_dialogs(AccountId(id), owner, limit).await?;
    Ok(Json(dialogs))
}

pub async fn folders(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<FolderSummary>>, ApiError> {
    let folders = state.manager.get_folders(AccountId(id), owner).await?;
    Ok(Json(folders))
}

pub async fn overview(
    State(state): State<AppState>,
    Extension(owner): Extension<UserId>,
    Path(id): Path<i64>,
) -> Result<Json<AccountOverview>, ApiError> {
    let overview = state.manager.overview(AccountId(id), owner).await?;
    Ok(Json(overview))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_validation_is_e164() {
        assert!(validate_phone("+15551234567").is_ok());
        assert!(validate_phone("+442071838750").is_ok());
        assert!(validate_phone("15551234567").is_err());
        assert!(validate_phone("+0123456").is_err());
        assert!(validate_phone("+1").is_err());
        assert!(validate_phone("+1555123456789012").is_err());
    }

    #[test]
    fn create_validation_rejects_bad_credentials() {
        let mut req = CreateAccountRequest {
            phone: "+15551234567".into(),
            api_id: 12345,
            api_hash: "abcdef".into(),
            name: None,
        };
        assert!(validate_create(&req).is_ok());

        req.api_id = 0;
        assert!(validate_create(&req).is_err());
        req.api_id = 12345;
        req.api_hash = "   ".into();
        assert!(validate_create(&req).is_err());
    }
}
