// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-execution protocol for the remote fleet-analytics service.
//!
//! This crate is the hard core of Fleetlens: session creation with retry,
//! prompt submission, the fixed-cadence polling loop, and normalization into
//! the public [`fleetlens_core::Insight`] type. Callers normally go through
//! the cache layer in `fleetlens-cache` rather than using
//! [`ProtocolClient`] directly.

pub mod auth;
pub mod client;
pub mod poller;
pub mod transport;
pub mod types;

pub use auth::StaticCredentials;
pub use client::ProtocolClient;
pub use poller::Poller;
pub use transport::Transport;
