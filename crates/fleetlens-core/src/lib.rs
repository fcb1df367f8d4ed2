// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Fleetlens fleet-analytics query pipeline.
//!
//! This crate provides the shared error type, the result and status types
//! exchanged between the protocol client and the cache layer, and the
//! credentials seam. The protocol implementation lives in
//! `fleetlens-protocol`; the cache/fallback layer in `fleetlens-cache`.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FleetlensError;
pub use traits::CredentialsAdapter;
pub use types::{Credentials, Insight, PollStatus, ResultPayload, Row, SessionId, SubmissionId};
