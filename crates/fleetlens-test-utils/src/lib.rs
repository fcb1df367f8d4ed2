// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Fleetlens integration tests.
//!
//! Provides a scripted wiremock mock of the remote analytics service and a
//! harness that assembles the full query stack with fast timings and a temp
//! fallback directory.

pub mod harness;
pub mod mock_service;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_service::MockAnalyticsService;
