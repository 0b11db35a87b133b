// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./gramgate.toml` > `~/.config/gramgate/gramgate.toml`
//! > `/etc/gramgate/gramgate.toml` with environment variable overrides via
//! the `GRAMGATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GramgateConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/gramgate/gramgate.toml` (system-wide)
/// 3. `~/.config/gramgate/gramgate.toml` (user XDG config)
/// 4. `./gramgate.toml` (local directory)
/// 5. `GRAMGATE_*` environment variables
pub fn load_config() -> Result<GramgateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GramgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GramgateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GramgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GramgateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GramgateConfig::default()))
        .merge(Toml::file("/etc/gramgate/gramgate.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("gramgate/gramgate.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("gramgate.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `GRAMGATE_TELEGRAM_CODE_TTL_SECS`
/// must map to `telegram.code_ttl_secs`, not `telegram.code.ttl.secs`.
fn env_provider() -> Env {
    Env::prefixed("GRAMGATE_").map(|key| {
        // `key` arrives with the prefix stripped but in the variable's
        // original case. Example: GRAMGATE_SERVER_PORT -> "SERVER_PORT".
        let lower = key.as_str().to_ascii_lowercase();
        let mapped = lower
            .replacen("server_", "server.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("telegram_", "telegram.", 1);
        mapped.into()
    })
}
