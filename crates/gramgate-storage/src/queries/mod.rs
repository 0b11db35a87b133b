// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. All functions accept `&Database` and run on the
//! single background writer thread.

pub mod accounts;
pub mod tokens;
pub mod users;
