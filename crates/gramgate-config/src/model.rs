// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Gramgate account gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject
//! unrecognized config keys at startup, providing actionable error
//! messages.

use serde::{Deserialize, Serialize};

/// Top-level Gramgate configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GramgateConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// User authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote Telegram client settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// User authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Lifetime of issued bearer tokens, in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_token_ttl_hours() -> u64 {
    24 * 7
}

/// Storage backend configuration. The database always runs in WAL
/// mode; only its location is configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "gramgate.db".to_string()
}

/// Remote Telegram client configuration.
///
/// These knobs are deliberately explicit so failure-injection tests can
/// force deterministic faulted states.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bounded wait for every remote capability call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Lifetime of an in-flight verification challenge, in seconds.
    #[serde(default = "default_code_ttl_secs")]
    pub code_ttl_secs: u64,

    /// Transparent reconnect attempts before an account is faulted.
    #[serde(default = "default_reconnect_budget")]
    pub reconnect_budget: u32,

    /// Default page size for dialog listings.
    #[serde(default = "default_dialogs_page_limit")]
    pub dialogs_page_limit: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            code_ttl_secs: default_code_ttl_secs(),
            reconnect_budget: default_reconnect_budget(),
            dialogs_page_limit: default_dialogs_page_limit(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_code_ttl_secs() -> u64 {
    300
}

fn default_reconnect_budget() -> u32 {
    3
}

fn default_dialogs_page_limit() -> usize {
    50
}
