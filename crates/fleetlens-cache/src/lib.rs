// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-tier cache and graceful-degradation layer.
//!
//! [`FallbackCache::with_fallback`] wraps any slow or unreliable async
//! producer with memory-cache, stale-cache, and static-file-fallback
//! semantics. This is the only layer in the system permitted to convert a
//! failure into a degraded success, and it always signals the degradation
//! through [`Cached::from_cache`] so callers never have to infer staleness.
//!
//! Entries are stored as `serde_json::Value` so one process-wide map serves
//! typed producers; fallback files are type-matched per producer and contain
//! the bare success value, no envelope.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use fleetlens_config::model::CacheConfig;
use fleetlens_core::FleetlensError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Divisor applied to the TTL when seeding an entry from a fallback file:
/// the entry starts half-expired, biasing the next call toward a prompt live
/// retry instead of waiting out a full TTL. Tunable.
pub const FALLBACK_SEED_BIAS_DIVISOR: u32 = 2;

/// A producer result plus its provenance.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub data: T,
    /// True when the data came from the memory cache or a fallback file
    /// rather than a fresh producer run.
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.cached_at) < ttl
    }
}

/// Process-wide cache with static file fallback.
///
/// Entries are never proactively expired; freshness is judged lazily at read
/// time. Concurrent misses on one key may each invoke the producer, and the
/// last writer wins for that key -- the lock is never held across a producer
/// await.
pub struct FallbackCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    fallback_dir: PathBuf,
    default_ttl: Duration,
    demo_mode: bool,
}

impl FallbackCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_options(
            &config.fallback_dir,
            Duration::from_secs(config.default_ttl_secs),
            config.demo_mode,
        )
    }

    pub fn with_options(
        fallback_dir: impl AsRef<Path>,
        default_ttl: Duration,
        demo_mode: bool,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fallback_dir: fallback_dir.as_ref().to_path_buf(),
            default_ttl,
            demo_mode,
        }
    }

    /// True when live producers are disabled and only cached or pre-baked
    /// data is served.
    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    /// Run `producer` behind the cache, degrading gracefully on failure.
    ///
    /// Order of preference: fresh memory entry, fresh producer run, stale
    /// memory entry, fallback file named exactly `key`, and finally the
    /// producer's original error unchanged. In demo mode the producer is
    /// never invoked: fresh entry, then fallback file, then a demo-specific
    /// missing-fallback error.
    ///
    /// One key must map to one logical question. In particular, reusing a
    /// single key across an expanding-search-window sequence (retry with 7,
    /// then 30, then 90 days of lookback) breaks the expansion: the
    /// empty-but-successful narrow result gets cached and served verbatim for
    /// every wider window. Such call sites need a distinct key per window.
    pub async fn with_fallback<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<Cached<T>, FleetlensError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FleetlensError>>,
    {
        let ttl = ttl.unwrap_or(self.default_ttl);

        // Fast path: fresh entry, producer not invoked.
        if let Some(data) = self.read_fresh::<T>(key, ttl).await {
            debug!(key, "cache hit");
            return Ok(Cached {
                data,
                from_cache: true,
            });
        }

        if self.demo_mode {
            // Live and slow calls must never run in demo mode.
            return match self.load_fallback_file::<T>(key, ttl).await {
                Some(data) => Ok(Cached {
                    data,
                    from_cache: true,
                }),
                None => Err(FleetlensError::NoFallback {
                    key: key.to_string(),
                }),
            };
        }

        match producer().await {
            Ok(data) => {
                self.store(key, &data, Utc::now()).await?;
                Ok(Cached {
                    data,
                    from_cache: false,
                })
            }
            Err(producer_err) => {
                // Any prior data beats a hard failure.
                if let Some(data) = self.read_any::<T>(key).await {
                    warn!(key, error = %producer_err, "producer failed, serving stale cache entry");
                    return Ok(Cached {
                        data,
                        from_cache: true,
                    });
                }
                if let Some(data) = self.load_fallback_file::<T>(key, ttl).await {
                    warn!(key, error = %producer_err, "producer failed, serving fallback file");
                    return Ok(Cached {
                        data,
                        from_cache: true,
                    });
                }
                Err(producer_err)
            }
        }
    }

    /// Seed an entry without running a producer (e.g. after a background
    /// prefetch). Overwrites any existing entry for the key.
    pub async fn put<T: Serialize>(&self, key: &str, data: &T) -> Result<(), FleetlensError> {
        self.store(key, data, Utc::now()).await
    }

    /// Drop one entry. Returns true when an entry existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop every entry whose key starts with `prefix`. Returns the number
    /// of entries removed.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    async fn store<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        cached_at: DateTime<Utc>,
    ) -> Result<(), FleetlensError> {
        let value = serde_json::to_value(data)
            .map_err(|e| FleetlensError::Cache(format!("failed to serialize `{key}`: {e}")))?;
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                cached_at,
            },
        );
        Ok(())
    }

    async fn read_fresh<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if !entry.is_fresh(ttl, Utc::now()) {
            return None;
        }
        decode(key, &entry.data)
    }

    async fn read_any<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        decode(key, &entries.get(key)?.data)
    }

    /// Load the pre-baked fallback file for `key`, seeding the cache with a
    /// half-expired entry on success.
    async fn load_fallback_file<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        // Keys are opaque caller strings; never let one escape the directory.
        if key.contains('/') || key.contains('\\') || key.contains("..") {
            warn!(key, "cache key is not a safe fallback filename");
            return None;
        }

        let path = self.fallback_dir.join(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) => {
                debug!(key, path = %path.display(), error = %err, "no fallback file");
                return None;
            }
        };

        let value: Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, path = %path.display(), error = %err, "fallback file is not valid JSON");
                return None;
            }
        };
        let data = decode(key, &value)?;

        let bias =
            TimeDelta::from_std(ttl / FALLBACK_SEED_BIAS_DIVISOR).unwrap_or_else(|_| TimeDelta::zero());
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                cached_at: Utc::now() - bias,
            },
        );
        Some(data)
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(data) => Some(data),
        Err(err) => {
            // A type mismatch means the entry belongs to a different producer
            // shape; treat it as absent rather than failing the call.
            warn!(key, error = %err, "cache entry did not match the requested type");
            None
        }
    }
}
