//! Time-bounded cache of upstream weather snapshots
//!
//! Shared mutable state across all concurrent requests. Entries are keyed by
//! coordinates rounded to three decimals and expire after the configured
//! TTL. A miss fetches current conditions and the forecast concurrently;
//! both calls must succeed before anything is stored, so readers never see a
//! partially populated snapshot. Racing fetches for the same key resolve
//! last-write-wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::external::weather::{CurrentConditions, ForecastEntry, WeatherClient};

/// A complete upstream weather observation for one location
#[derive(Debug, Clone, Serialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    /// Ordered 3-hour-stepped forecast
    pub forecast: Vec<ForecastEntry>,
    pub fetched_at: DateTime<Utc>,
}

/// Coordinates rounded to three decimals (about 100 m), stored as integers
/// so the key is hashable without float comparisons
type CacheKey = (i64, i64);

fn cache_key(lat: f64, lon: f64) -> CacheKey {
    ((lat * 1000.0).round() as i64, (lon * 1000.0).round() as i64)
}

struct CacheEntry {
    stored_at: Instant,
    snapshot: Arc<WeatherSnapshot>,
}

/// Weather cache with concurrent upstream fetch
pub struct WeatherCache {
    client: WeatherClient,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    upstream_calls: AtomicU64,
}

impl WeatherCache {
    pub fn new(client: WeatherClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            entries: RwLock::new(HashMap::new()),
            upstream_calls: AtomicU64::new(0),
        }
    }

    /// Return the cached snapshot for the rounded coordinate, fetching from
    /// upstream when absent or expired. On any upstream failure the cache is
    /// left unchanged and the error surfaces to the caller.
    pub async fn get_or_fetch(&self, lat: f64, lon: f64) -> AppResult<Arc<WeatherSnapshot>> {
        let key = cache_key(lat, lon);

        if let Some(snapshot) = self.lookup(key).await {
            return Ok(snapshot);
        }

        // Two upstream calls issued concurrently; both must succeed
        self.upstream_calls.fetch_add(2, Ordering::Relaxed);
        let (current, forecast) = tokio::try_join!(
            self.client.get_current(lat, lon),
            self.client.get_forecast(lat, lon),
        )?;

        let snapshot = Arc::new(WeatherSnapshot {
            current,
            forecast,
            fetched_at: Utc::now(),
        });

        self.entries.write().await.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                snapshot: Arc::clone(&snapshot),
            },
        );

        Ok(snapshot)
    }

    /// Total upstream requests issued over the cache's lifetime
    pub fn upstream_calls(&self) -> u64 {
        self.upstream_calls.load(Ordering::Relaxed)
    }

    async fn lookup(&self, key: CacheKey) -> Option<Arc<WeatherSnapshot>> {
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(Arc::clone(&entry.snapshot));
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop the stale entry so the map does not accumulate
        // dead keys between refreshes
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(&key) {
            if entry.stored_at.elapsed() < self.ttl {
                // A racing fetch repopulated the key in the meantime
                return Some(Arc::clone(&entry.snapshot));
            }
            entries.remove(&key);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> WeatherClient {
        WeatherClient::new(
            "test-key".to_string(),
            "http://127.0.0.1:1".to_string(),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    fn snapshot(temp_c: f64) -> Arc<WeatherSnapshot> {
        Arc::new(WeatherSnapshot {
            current: CurrentConditions {
                observed_at: Utc::now(),
                temp_c,
                humidity_percent: 60,
                wind_speed_ms: 3.0,
                condition: "Clear".to_string(),
                description: "clear sky".to_string(),
                location_name: "Kyrenia".to_string(),
            },
            forecast: Vec::new(),
            fetched_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_fresh_entry_is_returned_without_fetch() {
        let cache = WeatherCache::new(test_client(), Duration::from_secs(600));
        let key = cache_key(35.33, 33.35);
        cache.entries.write().await.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                snapshot: snapshot(21.0),
            },
        );

        let hit = cache.get_or_fetch(35.33, 33.35).await.unwrap();
        assert_eq!(hit.current.temp_c, 21.0);
        assert_eq!(cache.upstream_calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_treated_as_absent() {
        let ttl = Duration::from_secs(600);
        let cache = WeatherCache::new(test_client(), ttl);
        let key = cache_key(35.33, 33.35);
        // Backdate the entry past the TTL; skip on platforms where the
        // monotonic clock has not been up that long
        let Some(stored_at) = Instant::now().checked_sub(ttl + Duration::from_secs(1)) else {
            return;
        };
        cache.entries.write().await.insert(
            key,
            CacheEntry {
                stored_at,
                snapshot: snapshot(21.0),
            },
        );

        assert!(cache.lookup(key).await.is_none());
        // The stale entry is evicted, not left behind
        assert!(cache.entries.read().await.get(&key).is_none());
    }

    #[tokio::test]
    async fn test_nearby_coordinates_share_a_key() {
        // Rounding to three decimals maps these to the same entry
        assert_eq!(cache_key(35.3331, 33.3501), cache_key(35.3329, 33.3502));
        assert_ne!(cache_key(35.333, 33.350), cache_key(35.334, 33.350));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_unchanged() {
        // The test client points at an unroutable address, so the fetch fails
        let cache = WeatherCache::new(test_client(), Duration::from_secs(600));
        let result = cache.get_or_fetch(35.33, 33.35).await;
        assert!(result.is_err());
        assert!(cache.entries.read().await.is_empty());
    }
}
