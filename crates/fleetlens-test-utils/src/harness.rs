// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full query stack -- protocol client, cache
//! with a temp fallback directory, millisecond-scale retry/poll delays --
//! and provides `ask()` to drive a question through cache and client exactly
//! the way production consumers do.

use std::sync::Arc;
use std::time::Duration;

use fleetlens_cache::{Cached, FallbackCache};
use fleetlens_config::model::{CacheConfig, FleetlensConfig, ProtocolConfig, ServiceConfig};
use fleetlens_core::{FleetlensError, Insight};
use fleetlens_protocol::{ProtocolClient, StaticCredentials};
use serde_json::Value;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    endpoint: Option<String>,
    demo_mode: bool,
    default_ttl: Duration,
    create_attempts: u32,
    fallback_files: Vec<(String, Value)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            endpoint: None,
            demo_mode: false,
            default_ttl: Duration::from_secs(60),
            create_attempts: 3,
            fallback_files: Vec::new(),
        }
    }

    /// Point the client at a mock service endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Point the client at an endpoint nothing listens on.
    pub fn unreachable(mut self) -> Self {
        self.endpoint = Some(crate::MockAnalyticsService::unreachable_endpoint());
        self
    }

    /// Enable demo mode (no live calls, fallback files only).
    pub fn with_demo_mode(mut self) -> Self {
        self.demo_mode = true;
        self
    }

    /// Override the cache's default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Pre-bake a fallback file: `key` becomes the filename, `content` the
    /// bare success value.
    pub fn with_fallback_file(mut self, key: impl Into<String>, content: Value) -> Self {
        self.fallback_files.push((key.into(), content));
        self
    }

    /// Build the harness, writing fallback files into a temp directory.
    pub fn build(self) -> Result<TestHarness, FleetlensError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| FleetlensError::Internal(format!("temp dir: {e}")))?;

        for (key, content) in &self.fallback_files {
            let pretty = serde_json::to_string_pretty(content)
                .map_err(|e| FleetlensError::Internal(format!("fallback file body: {e}")))?;
            std::fs::write(temp_dir.path().join(key), pretty)
                .map_err(|e| FleetlensError::Internal(format!("fallback file write: {e}")))?;
        }

        let config = FleetlensConfig {
            service: ServiceConfig {
                endpoint: self
                    .endpoint
                    .unwrap_or_else(crate::MockAnalyticsService::unreachable_endpoint),
                api_token: Some("test-token".into()),
                request_timeout_secs: 5,
                ..ServiceConfig::default()
            },
            protocol: ProtocolConfig {
                create_attempts: self.create_attempts,
                create_retry_delay_ms: 25,
                poll_first_delay_ms: 5,
                poll_interval_ms: 5,
                poll_max_attempts: 10,
            },
            cache: CacheConfig {
                fallback_dir: temp_dir.path().display().to_string(),
                default_ttl_secs: self.default_ttl.as_secs().max(1),
                demo_mode: self.demo_mode,
            },
            ..FleetlensConfig::default()
        };

        let credentials = Arc::new(StaticCredentials::from_config(&config.service)?);
        let client = ProtocolClient::new(&config.service, &config.protocol, credentials)?;
        let cache = FallbackCache::with_options(temp_dir.path(), self.default_ttl, self.demo_mode);

        Ok(TestHarness {
            client,
            cache,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment: protocol client, cache, temp fallback dir.
pub struct TestHarness {
    pub client: ProtocolClient,
    pub cache: FallbackCache,
    pub config: FleetlensConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Drive a question through cache + client the way production consumers
    /// do, stamping the insight's freshness flag from the cache verdict.
    pub async fn ask(
        &self,
        key: &str,
        ttl: Option<Duration>,
        question: &str,
    ) -> Result<Insight, FleetlensError> {
        let client = &self.client;
        let Cached { mut data, from_cache } = self
            .cache
            .with_fallback::<Insight, _, _>(key, ttl, || async move {
                client.query(question).await
            })
            .await?;
        data.from_cache = from_cache;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockAnalyticsService;
    use serde_json::json;

    #[tokio::test]
    async fn harness_drives_a_full_query() {
        let service = MockAnalyticsService::start().await;
        service.on_create("c-1").await;
        service.on_submit("mg-1").await;
        service
            .on_status_progress_then_done(
                0,
                json!([{"columns": ["km"], "preview_rows": [{"km": 7}]}]),
            )
            .await;

        let harness = TestHarness::builder()
            .with_endpoint(service.endpoint())
            .build()
            .unwrap();

        let insight = harness.ask("t.key", None, "how far?").await.unwrap();
        assert_eq!(insight.rows.len(), 1);
        assert!(!insight.from_cache);
    }

    #[tokio::test]
    async fn harnesses_are_isolated() {
        let h1 = TestHarness::builder().with_demo_mode().build().unwrap();
        let h2 = TestHarness::builder().with_demo_mode().build().unwrap();

        h1.cache.put("k", &json!(1)).await.unwrap();
        assert!(h1.cache.invalidate("k").await);
        assert!(!h2.cache.invalidate("k").await);
    }
}
