// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for Gramgate's external seams.

pub mod client;
pub mod registry;

pub use client::{ClientFactory, RawClient};
pub use registry::AccountRegistry;
