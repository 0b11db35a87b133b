// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account connection lifecycle: the per-account client pool, the
//! in-flight challenge state, and the [`ConnectionManager`] facade that
//! the gateway drives.

pub mod attempt;
pub mod manager;
pub mod pool;

pub use attempt::ConnectAttempt;
pub use manager::ConnectionManager;
pub use pool::{ClientPool, SlotState};
