// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles shared across the workspace. Not for production use.

pub mod scripted_client;

pub use scripted_client::{CallCounters, ScriptedClient, ScriptedFactory, SharedClient};
