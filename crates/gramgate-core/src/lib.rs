// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Gramgate account gateway.
//!
//! This crate provides the foundational trait definitions, the closed
//! error taxonomy, and the common types used throughout the Gramgate
//! workspace. The protocol client binding, persistence layer, and the
//! connection core all implement or consume seams defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GramgateError;
pub use types::{
    Account, AccountId, AccountOverview, AccountStatus, ChallengeToken, ConnectOutcome,
    ConnectionPhase, DialogSummary, FolderSummary, SessionBlob, SignInResult, UserId,
    VerifyCodeOutcome,
};

// Re-export the seam traits at crate root.
pub use traits::{AccountRegistry, ClientFactory, RawClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_taxonomy_is_closed_over_lifecycle_outcomes() {
        // One construction per variant the state machine produces.
        let _ = GramgateError::InvalidApiCredentials;
        let _ = GramgateError::PhoneNumberInvalid;
        let _ = GramgateError::InvalidCode;
        let _ = GramgateError::ExpiredCode;
        let _ = GramgateError::InvalidPassword;
        let _ = GramgateError::FloodWait { seconds: 10 };
        let _ = GramgateError::AlreadyConnected;
        let _ = GramgateError::NotConnected;
        let _ = GramgateError::AccountNotFound;
        let _ = GramgateError::Internal("x".into());
    }

    #[test]
    fn seam_traits_are_object_safe() {
        fn _assert_raw_client(_: &dyn RawClient) {}
        fn _assert_factory(_: &dyn ClientFactory) {}
        fn _assert_registry(_: &dyn AccountRegistry) {}
    }

    #[test]
    fn account_status_serializes_lowercase() {
        let json = serde_json::to_string(&AccountStatus::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
    }
}
