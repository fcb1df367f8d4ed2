// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Fleetlens query pipeline.

use thiserror::Error;

use crate::types::PollStatus;

/// The primary error type used across the Fleetlens workspace.
///
/// The variants mirror the failure taxonomy of the remote protocol: transport
/// failures, explicit remote error envelopes (message forwarded verbatim),
/// schema-shape soft failures, terminal remote statuses, and poll timeouts.
/// Only the cache layer is permitted to convert any of these into a degraded
/// success.
#[derive(Debug, Error)]
pub enum FleetlensError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or HTTP-level failures talking to the remote service.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote service returned an explicit error envelope.
    /// The message is forwarded verbatim.
    #[error("remote service error: {0}")]
    Remote(String),

    /// A structurally successful response was missing a required field.
    #[error("malformed remote response: {0}")]
    Schema(String),

    /// The low-level call wrapper received an empty results list.
    #[error("empty remote result: {0}")]
    EmptyResult(String),

    /// The submission reached a terminal failure status. Never retried.
    #[error("query ended with terminal status {status}")]
    QueryFailed { status: PollStatus },

    /// The polling loop exhausted its attempt budget.
    #[error("polling timed out after {attempts} attempts (~{elapsed_secs}s elapsed)")]
    PollTimeout { attempts: u32, elapsed_secs: u64 },

    /// Demo mode found neither a cache entry nor a fallback file for the key.
    #[error("no fallback file for key `{key}` in demo mode")]
    NoFallback { key: String },

    /// Cache serialization or fallback-file errors.
    #[error("cache error: {0}")]
    Cache(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FleetlensError {
    /// Build a transport error from any underlying error, keeping it as source.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
