// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./fleetlens.toml` > `~/.config/fleetlens/fleetlens.toml`
//! > `/etc/fleetlens/fleetlens.toml` with environment variable overrides via
//! the `FLEETLENS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FleetlensConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fleetlens/fleetlens.toml` (system-wide)
/// 3. `~/.config/fleetlens/fleetlens.toml` (user XDG config)
/// 4. `./fleetlens.toml` (local directory)
/// 5. `FLEETLENS_*` environment variables
pub fn load_config() -> Result<FleetlensConfig, figment::Error> {
    base_figment().extract()
}

/// Load configuration from a TOML string only (defaults + string, no XDG
/// lookup, no env). Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FleetlensConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FleetlensConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FleetlensConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FleetlensConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

fn base_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FleetlensConfig::default()))
        .merge(Toml::file("/etc/fleetlens/fleetlens.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("fleetlens/fleetlens.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("fleetlens.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `FLEETLENS_SERVICE_API_TOKEN` must map to
/// `service.api_token`, not `service.api.token`.
fn env_provider() -> Env {
    Env::prefixed("FLEETLENS_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped,
        // e.g. FLEETLENS_SERVICE_API_TOKEN -> "service_api_token".
        key.as_str()
            .replacen("service_", "service.", 1)
            .replacen("protocol_", "protocol.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("runtime_", "runtime.", 1)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_extract_cleanly() {
        let config = load_config_from_str("").expect("defaults should be valid");
        assert_eq!(config.protocol.create_attempts, 3);
        assert_eq!(config.protocol.create_retry_delay_ms, 3_000);
        assert_eq!(config.protocol.poll_first_delay_ms, 8_000);
        assert_eq!(config.protocol.poll_interval_ms, 5_000);
        assert_eq!(config.protocol.poll_max_attempts, 30);
        assert_eq!(config.cache.default_ttl_secs, 900);
        assert!(!config.cache.demo_mode);
    }

    #[test]
    fn env_mapping_targets_dotted_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FLEETLENS_SERVICE_API_TOKEN", "tok-123");
            jail.set_env("FLEETLENS_CACHE_DEMO_MODE", "true");
            let config: FleetlensConfig = Figment::new()
                .merge(Serialized::defaults(FleetlensConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.service.api_token.as_deref(), Some("tok-123"));
            assert!(config.cache.demo_mode);
            Ok(())
        });
    }
}
