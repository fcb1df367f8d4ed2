// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Fleetlens configuration system.

use fleetlens_config::model::FleetlensConfig;
use fleetlens_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_fleetlens_config() {
    let toml = r#"
[service]
endpoint = "https://analytics.internal/rpc"
service_id = "fleet-history"
api_token = "tok-abc"
request_timeout_secs = 20

[protocol]
create_attempts = 2
create_retry_delay_ms = 500
poll_first_delay_ms = 1000
poll_interval_ms = 250
poll_max_attempts = 12

[cache]
fallback_dir = "/var/lib/fleetlens/fallback"
default_ttl_secs = 600
demo_mode = true

[runtime]
log_level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.endpoint, "https://analytics.internal/rpc");
    assert_eq!(config.service.service_id, "fleet-history");
    assert_eq!(config.service.api_token.as_deref(), Some("tok-abc"));
    assert_eq!(config.service.request_timeout_secs, 20);
    assert_eq!(config.protocol.create_attempts, 2);
    assert_eq!(config.protocol.create_retry_delay_ms, 500);
    assert_eq!(config.protocol.poll_first_delay_ms, 1000);
    assert_eq!(config.protocol.poll_interval_ms, 250);
    assert_eq!(config.protocol.poll_max_attempts, 12);
    assert_eq!(config.cache.fallback_dir, "/var/lib/fleetlens/fallback");
    assert_eq!(config.cache.default_ttl_secs, 600);
    assert!(config.cache.demo_mode);
    assert_eq!(config.runtime.log_level, "debug");
}

/// Unknown field in a section is rejected by `deny_unknown_fields`.
#[test]
fn unknown_field_is_rejected() {
    let toml = r#"
[service]
endpont = "https://x"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("endpont"),
        "error should mention the bad key, got: {err_str}"
    );
}

/// Missing sections fall back to defaults that match the protocol contract.
#[test]
fn missing_sections_use_contract_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.protocol.create_attempts, 3);
    assert_eq!(config.protocol.create_retry_delay_ms, 3_000);
    assert_eq!(config.protocol.poll_first_delay_ms, 8_000);
    assert_eq!(config.protocol.poll_interval_ms, 5_000);
    assert_eq!(config.protocol.poll_max_attempts, 30);
    assert_eq!(config.cache.fallback_dir, "fallback");
    assert_eq!(config.runtime.log_level, "info");
    assert!(config.service.api_token.is_none());
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[service]
endpoint = ""

[cache]
default_ttl_secs = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors.len() >= 2, "expected both errors, got {errors:?}");
}

/// A valid config passes the full load-and-validate path.
#[test]
fn load_and_validate_accepts_valid_config() {
    let toml = r#"
[service]
endpoint = "http://localhost:9090/rpc"
"#;

    let config = load_and_validate_str(toml).expect("should pass");
    assert_eq!(config.service.endpoint, "http://localhost:9090/rpc");
}

/// Partial sections merge with defaults instead of replacing them.
#[test]
fn partial_section_keeps_other_defaults() {
    let toml = r#"
[protocol]
poll_interval_ms = 50
"#;

    let config = load_config_from_str(toml).unwrap();
    assert_eq!(config.protocol.poll_interval_ms, 50);
    assert_eq!(config.protocol.poll_max_attempts, 30);
    assert_eq!(config.protocol.create_attempts, 3);
}

/// Defaults round-trip through serde (required for figment Serialized::defaults).
#[test]
fn defaults_round_trip_through_serde() {
    let config = FleetlensConfig::default();
    let toml = toml::to_string(&config).expect("defaults should serialize");
    let back: FleetlensConfig = toml::from_str(&toml).expect("serialized defaults should parse");
    assert_eq!(back.protocol.poll_max_attempts, 30);
    assert_eq!(back.service.service_id, config.service.service_id);
}
