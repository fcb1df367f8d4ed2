// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root for the query stack.
//!
//! `AppContext` owns the configured client and cache with an explicit
//! construction lifecycle -- there is no process-global state anywhere in the
//! stack; everything a consumer needs hangs off this object.

use std::sync::Arc;
use std::time::Duration;

use fleetlens_cache::{Cached, FallbackCache};
use fleetlens_config::FleetlensConfig;
use fleetlens_core::{CredentialsAdapter, FleetlensError, Insight};
use fleetlens_protocol::{ProtocolClient, StaticCredentials};

/// Everything the consumers need, wired once at startup.
pub struct AppContext {
    pub config: FleetlensConfig,
    pub client: ProtocolClient,
    pub cache: FallbackCache,
}

impl AppContext {
    pub fn from_config(config: FleetlensConfig) -> Result<Self, FleetlensError> {
        let credentials: Arc<dyn CredentialsAdapter> = if config.cache.demo_mode {
            // Demo mode never talks to the service, so a missing token is fine.
            Arc::new(StaticCredentials::new("demo"))
        } else {
            Arc::new(StaticCredentials::from_config(&config.service)?)
        };
        let client = ProtocolClient::new(&config.service, &config.protocol, credentials)?;
        let cache = FallbackCache::new(&config.cache);
        Ok(Self {
            config,
            client,
            cache,
        })
    }

    /// Ask one question through the cache + client pipeline and stamp the
    /// freshness flag from the cache verdict.
    ///
    /// `bypass_cache` skips the cache for one call; it is ignored in demo
    /// mode, where live calls are forbidden.
    pub async fn ask(
        &self,
        key: &str,
        ttl: Option<Duration>,
        question: &str,
        bypass_cache: bool,
    ) -> Result<Insight, FleetlensError> {
        if bypass_cache && !self.cache.demo_mode() {
            return self.client.query(question).await;
        }

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
