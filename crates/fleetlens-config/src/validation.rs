// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: a usable endpoint URL, non-zero attempt budgets, a known
//! log level.

use crate::diagnostic::{ConfigError, suggest_key};
use crate::model::FleetlensConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or all collected validation
/// errors (does not fail fast).
pub fn validate_config(config: &FleetlensConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let endpoint = config.service.endpoint.trim();
    if endpoint.is_empty() {
        errors.push(ConfigError::Validation {
            message: "service.endpoint must not be empty".to_string(),
        });
    } else if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
        errors.push(ConfigError::Validation {
            message: format!("service.endpoint `{endpoint}` must be an http(s) URL"),
        });
    }

    if config.service.service_id.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "service.service_id must not be empty".to_string(),
        });
    }

    if config.service.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "service.request_timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.protocol.create_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "protocol.create_attempts must be at least 1".to_string(),
        });
    }

    if config.protocol.poll_max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "protocol.poll_max_attempts must be at least 1".to_string(),
        });
    }

    if config.cache.default_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "cache.default_ttl_secs must be greater than zero".to_string(),
        });
    }

    if config.cache.fallback_dir.trim().is_empty() {
        let message = if config.cache.demo_mode {
            "cache.fallback_dir must not be empty (demo mode serves fallback files only)"
        } else {
            "cache.fallback_dir must not be empty"
        };
        errors.push(ConfigError::Validation {
            message: message.to_string(),
        });
    }

    let level = config.runtime.log_level.as_str();
    if !LOG_LEVELS.contains(&level) {
        let message = match suggest_key(level, LOG_LEVELS) {
            Some(s) => format!("runtime.log_level `{level}` is not valid; did you mean `{s}`?"),
            None => format!(
                "runtime.log_level `{level}` is not valid; expected one of {}",
                LOG_LEVELS.join(", ")
            ),
        };
        errors.push(ConfigError::Validation { message });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&FleetlensConfig::default()).is_ok());
    }

    #[test]
    fn empty_endpoint_rejected() {
        let mut config = FleetlensConfig::default();
        config.service.endpoint = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("endpoint")));
    }

    #[test]
    fn non_http_endpoint_rejected() {
        let mut config = FleetlensConfig::default();
        config.service.endpoint = "ftp://nope".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = FleetlensConfig::default();
        config.protocol.create_attempts = 0;
        config.protocol.poll_max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn bad_log_level_suggests_correction() {
        let mut config = FleetlensConfig::default();
        config.runtime.log_level = "debgu".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(
            errors[0].to_string().contains("debug"),
            "got: {}",
            errors[0]
        );
    }

    #[test]
    fn all_errors_collected_not_fail_fast() {
        let mut config = FleetlensConfig::default();
        config.service.endpoint = String::new();
        config.cache.default_ttl_secs = 0;
        config.runtime.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
