// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway: bearer-token auth, account CRUD, and the connection
//! lifecycle endpoints, all speaking the stable error-code vocabulary.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, router, serve};
