// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway user auth: registration, login, and the bearer middleware.
//!
//! Tokens are opaque random strings stored server-side with a TTL, so
//! revocation is a row delete. Password hashing runs on the blocking
//! pool; argon2 is deliberately slow.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use gramgate_core::{GramgateError, UserId};
use gramgate_storage::ApiToken;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
}

fn validate_credentials(username: &str, password: &str) -> Result<(), GramgateError> {
    let name_ok = (3..=64).contains(&username.len())
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !name_ok {
        return Err(GramgateError::Validation(
            "username must be 3-64 characters of [a-zA-Z0-9_]".into(),
        ));
    }
    if password.len() < 8 {
        return Err(GramgateError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

async fn hash_password(password: String) -> Result<String, GramgateError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| GramgateError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| GramgateError::Internal(format!("hashing task failed: {e}")))?
}

async fn verify_password(password: String, stored: String) -> Result<bool, GramgateError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored)
            .map_err(|e| GramgateError::Internal(format!("stored hash unreadable: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| GramgateError::Internal(format!("verify task failed: {e}")))?
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(axum::http::StatusCode, Json<RegisterResponse>), ApiError> {
    validate_credentials(&req.username, &req.password)?;
    let hash = hash_password(req.password).await?;

    let user = state
        .store
        .create_user(&req.username, &hash)
        .await?
        .ok_or_else(|| GramgateError::Validation("username already taken".into()))?;

    info!(user = %user.id, "user registered");
    Ok((
        axum::http::StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id.0,
            username: user.username,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // One generic rejection for unknown user and wrong password alike.
    let rejected = || GramgateError::Unauthorized("invalid username or password".into());

    let user = state
        .store
        .user_by_username(&req.username)
        .await?
        .ok_or_else(rejected)?;
    if !verify_password(req.password, user.password_hash.clone()).await? {
        return Err(rejected().into());
    }

    let now = chrono::Utc::now();
    let token = ApiToken {
        token: format!("ggt_{}", uuid::Uuid::new_v4().simple()),
        user_id: user.id,
        expires_at: (now + chrono::Duration::hours(state.token_ttl_hours)).to_rfc3339(),
        created_at: now.to_rfc3339(),
    };
    state.store.insert_token(&token).await?;

    info!(user = %user.id, "login");
    Ok(Json(LoginResponse {
        token: token.token,
        expires_at: token.expires_at,
    }))
}

/// Require a valid bearer token and stash the owner in extensions.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| GramgateError::Unauthorized("missing bearer token".into()))?;

    let user = state
        .store
        .user_for_token(token)
        .await?
        .ok_or_else(|| GramgateError::Unauthorized("invalid or expired token".into()))?;

    request.extensions_mut().insert::<UserId>(user);
    Ok(next.run(request).await)
}
