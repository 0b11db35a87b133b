// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the Gramgate account gateway.
//!
//! Every failure that crosses a crate boundary is one of these variants.
//! Remote-SDK error types are mapped into this closed set at the adapter
//! boundary and never leak further up.

use thiserror::Error;

/// The primary error type used across all Gramgate crates.
///
/// Each variant carries a stable application-level code (see [`code`])
/// that the HTTP layer serializes verbatim, so clients can match on it
/// without parsing human-readable messages.
///
/// [`code`]: GramgateError::code
#[derive(Debug, Error)]
pub enum GramgateError {
    /// The remote service rejected the account's api_id/api_hash pair.
    #[error("invalid api_id/api_hash")]
    InvalidApiCredentials,

    /// The account's phone number was rejected by the remote service.
    #[error("invalid phone number")]
    PhoneNumberInvalid,

    /// The verification code did not match the pending challenge.
    #[error("invalid verification code")]
    InvalidCode,

    /// The pending challenge expired before the code was redeemed.
    #[error("verification code expired, request a new one")]
    ExpiredCode,

    /// The two-factor password was incorrect.
    #[error("invalid two-factor password")]
    InvalidPassword,

    /// Remote-imposed backoff. Callers must not retry before `seconds`.
    #[error("flood wait: retry after {seconds}s")]
    FloodWait { seconds: u32 },

    /// A live client already exists where the operation forbids one.
    #[error("client already connected")]
    AlreadyConnected,

    /// No live client or in-flight handshake exists for the account.
    #[error("client not connected")]
    NotConnected,

    /// The account does not exist, or belongs to a different owner.
    /// Cross-owner access deliberately reports the same error.
    #[error("account not found")]
    AccountNotFound,

    /// An account with this phone number already exists for the owner.
    #[error("account with phone {phone} already exists")]
    AccountExists { phone: String },

    /// Missing or invalid caller credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request payload failed validation before reaching the core.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A capability call exceeded its bounded wait. Retryable; durable
    /// state is never mutated on timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Transport-fatal or unexpected errors. The owning account moves
    /// to the faulted state and its pool entry is evicted.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GramgateError {
    /// Stable application-level error code for the HTTP contract.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidApiCredentials => "INVALID_API_CREDENTIALS",
            Self::PhoneNumberInvalid => "PHONE_NUMBER_INVALID",
            Self::InvalidCode => "INVALID_CODE",
            Self::ExpiredCode => "EXPIRED_CODE",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::FloodWait { .. } => "FLOOD_WAIT",
            Self::AlreadyConnected => "ALREADY_CONNECTED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::AccountExists { .. } => "ACCOUNT_EXISTS",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage { .. } => "INTERNAL_ERROR",
            Self::Timeout { .. } => "INTERNAL_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error moves the owning account to durable `error`
    /// status. Credential, conflict, expiry, and rate-limit errors are
    /// recovered locally; only transport-fatal outcomes escalate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// Retry-after seconds, present only for flood-wait errors.
    pub fn retry_after(&self) -> Option<u32> {
        match self {
            Self::FloodWait { seconds } => Some(*seconds),
            _ => None,
        }
    }
}
