// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Fleetlens query pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Delay and attempt values in `[protocol]` default
//! to the remote service's behavioral contract constants; changing them is
//! an operational decision, not a tuning exercise.

use serde::{Deserialize, Serialize};

/// Top-level Fleetlens configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FleetlensConfig {
    /// Remote analytics service endpoint and identity.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Session-creation retry and polling cadence.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Memory cache and static file fallback settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Process-level settings (logging).
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Remote analytics service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// The single logical RPC endpoint, multiplexed by function name.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Target-service identifier included in every request.
    #[serde(default = "default_service_id")]
    pub service_id: String,

    /// API token. `None` requires the `FLEETLENS_SERVICE_API_TOKEN`
    /// environment variable.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-network-call timeout in seconds. The polling ceiling is separate
    /// and unaffected.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            service_id: default_service_id(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://analytics.fleet.example/rpc".to_string()
}

fn default_service_id() -> String {
    "fleet-analytics".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Session-creation retry and polling cadence.
///
/// Defaults encode the service's observed completion-time band (30-90s):
/// 3 creation attempts 3s apart, an 8s warm-up before the first poll, then a
/// fixed 5s cadence for up to 30 polls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Total session-creation attempts (not retries-after-first).
    #[serde(default = "default_create_attempts")]
    pub create_attempts: u32,

    /// Fixed delay between session-creation attempts, in milliseconds.
    #[serde(default = "default_create_retry_delay_ms")]
    pub create_retry_delay_ms: u64,

    /// Unconditional delay before the first status poll, in milliseconds.
    #[serde(default = "default_poll_first_delay_ms")]
    pub poll_first_delay_ms: u64,

    /// Fixed delay between status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before timing out.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            create_attempts: default_create_attempts(),
            create_retry_delay_ms: default_create_retry_delay_ms(),
            poll_first_delay_ms: default_poll_first_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_attempts: default_poll_max_attempts(),
        }
    }
}

fn default_create_attempts() -> u32 {
    3
}

fn default_create_retry_delay_ms() -> u64 {
    3_000
}

fn default_poll_first_delay_ms() -> u64 {
    8_000
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_poll_max_attempts() -> u32 {
    30
}

/// Memory cache and static file fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Directory holding one pre-baked fallback file per cache key
    /// (filename == key, content shaped like the producer's success value).
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,

    /// Default TTL in seconds for call sites that do not pass their own.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Demo mode: never attempt live or slow calls; serve fallback files only.
    #[serde(default)]
    pub demo_mode: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fallback_dir: default_fallback_dir(),
            default_ttl_secs: default_ttl_secs(),
            demo_mode: false,
        }
    }
}

fn default_fallback_dir() -> String {
    "fallback".to_string()
}

fn default_ttl_secs() -> u64 {
    900
}

/// Process-level runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
