// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects every failure instead of failing fast.

use crate::diagnostic::ConfigError;
use crate::model::GramgateConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &GramgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.telegram.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "telegram.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.telegram.code_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "telegram.code_ttl_secs must be at least 1".to_string(),
        });
    }

    if config.telegram.dialogs_page_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "telegram.dialogs_page_limit must be at least 1".to_string(),
        });
    }

    if config.auth.token_ttl_hours == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.token_ttl_hours must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GramgateConfig;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&GramgateConfig::default()).is_ok());
    }

    #[test]
    fn empty_host_is_rejected() {
        let mut config = GramgateConfig::default();
        config.server.host = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = GramgateConfig::default();
        config.server.host = String::new();
        config.storage.database_path = String::new();
        config.telegram.request_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn zero_code_ttl_is_rejected() {
        let mut config = GramgateConfig::default();
        config.telegram.code_ttl_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
