// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-flight authentication challenge state.
//!
//! An attempt is created when Telegram sends a login code and lives
//! until the handshake completes, the code expires, or the account is
//! evicted from the pool. Expiry is checked on every use, never by a
//! background sweeper.

use std::time::{Duration, Instant};

use gramgate_core::{ChallengeToken, ConnectionPhase, GramgateError};

#[derive(Debug)]
pub struct ConnectAttempt {
    token: ChallengeToken,
    phase: ConnectionPhase,
    password_hint: Option<String>,
    issued_at: Instant,
    ttl: Duration,
}

impl ConnectAttempt {
    pub fn new(token: ChallengeToken, ttl: Duration) -> Self {
        Self {
            token,
            phase: ConnectionPhase::AwaitingCode,
            password_hint: None,
            issued_at: Instant::now(),
            ttl,
        }
    }

    pub fn token(&self) -> &ChallengeToken {
        &self.token
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn password_hint(&self) -> Option<&str> {
        self.password_hint.as_deref()
    }

    pub fn is_expired(&self) -> bool {
        self.issued_at.elapsed() >= self.ttl
    }

    /// Fail with `ExpiredCode` when the challenge has aged out.
    pub fn require_fresh(&self) -> Result<(), GramgateError> {
        if self.is_expired() {
            Err(GramgateError::ExpiredCode)
        } else {
            Ok(())
        }
    }

    /// The code was accepted but the account has 2FA enabled; the same
    /// attempt now waits for the password.
    pub fn advance_to_password(&mut self, hint: Option<String>) {
        self.phase = ConnectionPhase::AwaitingPassword;
        self.password_hint = hint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_attempt_awaits_code() {
        let attempt = ConnectAttempt::new(ChallengeToken::new("t"), Duration::from_secs(300));
        assert_eq!(attempt.phase(), ConnectionPhase::AwaitingCode);
        assert!(!attempt.is_expired());
        assert!(attempt.require_fresh().is_ok());
        assert!(attempt.password_hint().is_none());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let attempt = ConnectAttempt::new(ChallengeToken::new("t"), Duration::ZERO);
        assert!(attempt.is_expired());
        let err = attempt.require_fresh().unwrap_err();
        assert!(matches!(err, GramgateError::ExpiredCode));
    }

    #[test]
    fn advancing_keeps_token_and_sets_hint() {
        let mut attempt = ConnectAttempt::new(ChallengeToken::new("t"), Duration::from_secs(300));
        attempt.advance_to_password(Some("pet name".into()));
        assert_eq!(attempt.phase(), ConnectionPhase::AwaitingPassword);
        assert_eq!(attempt.password_hint(), Some("pet name"));
        assert_eq!(attempt.token().as_str(), "t");
    }
}
