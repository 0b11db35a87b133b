// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MTProto client plumbing.
//!
//! The workspace talks to Telegram through the [`RawClient`] trait in
//! gramgate-core. This crate supplies the policy layer shared by every
//! backing implementation (per-call deadlines, reconnect budget) and,
//! behind the `grammers` feature, a concrete binding.
//!
//! [`RawClient`]: gramgate_core::RawClient

pub mod adapter;
#[cfg(feature = "grammers")]
pub mod grammers;

pub use adapter::{AdapterFactory, ClientAdapter};
#[cfg(feature = "grammers")]
pub use grammers::GrammersFactory;
