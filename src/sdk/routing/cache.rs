use super::error::RoutingError;
use super::response::RouteResponse;
use super::service::RoutingProvider;
use crate::sdk::geo::Coordinate;
use crate::sdk::util::clock::{Clock, SystemClock};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_TTL_HOURS: i64 = 12;
pub const DEFAULT_CAPACITY: usize = 50;

/// Cache identity of a route request.
///
/// Coordinates are rounded to 5 decimal places (~1.1 m) so GPS jitter
/// below that precision maps to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteCacheKey(String);

impl RouteCacheKey {
    pub fn new(waypoints: &[Coordinate], optimize: bool, key_signature: &str) -> Self {
        let stops = waypoints
            .iter()
            .map(|c| format!("{:.5},{:.5}", round5(c.lat), round5(c.lng)))
            .collect::<Vec<_>>()
            .join("|");
        Self(format!("{stops}#opt={}#key={key_signature}", u8::from(optimize)))
    }
}

impl fmt::Display for RouteCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Adding 0.0 folds -0.0 into 0.0 so both render identically.
fn round5(v: f64) -> f64 {
    (v * 1e5).round() / 1e5 + 0.0
}

/// Short fingerprint of an API key: its last six characters.
pub fn key_signature(api_key: &str) -> String {
    let chars: Vec<char> = api_key.trim().chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect()
}

#[derive(Debug, Clone)]
pub struct CachedRoute {
    pub data: RouteResponse,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct Entries {
    routes: HashMap<RouteCacheKey, CachedRoute>,
    // Insertion order, oldest first.
    order: VecDeque<RouteCacheKey>,
}

/// Memoizes provider responses by [`RouteCacheKey`] with a TTL and a
/// bounded size. Expired entries are only noticed when their key is
/// requested again; there is no background sweep.
///
/// Meant to be built once by the composition root and shared (`Arc`)
/// across navigation sessions.
pub struct RouteCache {
    entries: Mutex<Entries>,
    ttl: TimeDelta,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new(TimeDelta::hours(DEFAULT_TTL_HOURS), DEFAULT_CAPACITY)
    }
}

impl RouteCache {
    pub fn new(ttl: TimeDelta, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: TimeDelta, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            ttl,
            capacity: capacity.max(1),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &RouteCacheKey) -> bool {
        self.lock().routes.contains_key(key)
    }

    pub fn entry(&self, key: &RouteCacheKey) -> Option<CachedRoute> {
        self.lock().routes.get(key).cloned()
    }

    /// Returns the cached route for `waypoints` when it is younger than the
    /// TTL, otherwise fetches it from `provider` and stores it.
    ///
    /// The lock is not held across the provider call; two concurrent misses
    /// on the same key both fetch and the later insert wins.
    pub fn get_or_fetch(
        &self,
        waypoints: &[Coordinate],
        optimize: bool,
        provider: &dyn RoutingProvider,
    ) -> Result<RouteResponse, RoutingError> {
        let key = RouteCacheKey::new(waypoints, optimize, provider.key_signature());

        if let Some(hit) = self.fresh(&key) {
            log::debug!("[CACHE HIT] {}", key);
            return Ok(hit);
        }

        log::debug!("[CACHE MISS] {}", key);
        let data = provider.fetch_route(waypoints, optimize)?;
        self.insert(key, data.clone());
        Ok(data)
    }

    fn fresh(&self, key: &RouteCacheKey) -> Option<RouteResponse> {
        let now = self.clock.now();
        let entries = self.lock();
        let cached = entries.routes.get(key)?;
        if now - cached.timestamp < self.ttl {
            Some(cached.data.clone())
        } else {
            log::debug!("[CACHE EXPIRED] {} (stored {})", key, cached.timestamp);
            None
        }
    }

    fn insert(&self, key: RouteCacheKey, data: RouteResponse) {
        let timestamp = self.clock.now();
        let mut entries = self.lock();

        // A refreshed key counts as newly inserted.
        if entries.routes.contains_key(&key) {
            entries.order.retain(|k| k != &key);
        }
        entries.order.push_back(key.clone());
        entries.routes.insert(key, CachedRoute { data, timestamp });

        if entries.routes.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.routes.remove(&oldest);
                log::debug!("[CACHE EVICT] {}", oldest);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::routing::fake::{sample_response, FakeProvider};
    use crate::sdk::util::clock::ManualClock;

    fn cache_with_clock() -> (RouteCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = RouteCache::with_clock(
            TimeDelta::hours(DEFAULT_TTL_HOURS),
            DEFAULT_CAPACITY,
            clock.clone(),
        );
        (cache, clock)
    }

    fn pair(lat: f64, lng: f64) -> Vec<Coordinate> {
        vec![Coordinate::new(lat, lng), Coordinate::new(27.73, 85.34)]
    }

    #[test]
    fn key_absorbs_sub_meter_jitter() {
        let a = RouteCacheKey::new(&pair(27.717_200_1, 85.324_000_4), false, "abc123");
        let b = RouteCacheKey::new(&pair(27.717_204_9, 85.323_999_6), false, "abc123");
        assert_eq!(a, b);
        assert_ne!(a, RouteCacheKey::new(&pair(27.717_21, 85.324), false, "abc123"));
    }

    #[test]
    fn key_includes_optimize_flag_and_signature() {
        let waypoints = pair(27.7172, 85.3240);
        let base = RouteCacheKey::new(&waypoints, false, "abc123");
        assert_ne!(base, RouteCacheKey::new(&waypoints, true, "abc123"));
        assert_ne!(base, RouteCacheKey::new(&waypoints, false, "zzz999"));
    }

    #[test]
    fn key_treats_negative_zero_like_zero() {
        let a = RouteCacheKey::new(&pair(-0.000_001, 0.0), false, "k");
        let b = RouteCacheKey::new(&pair(0.000_001, 0.0), false, "k");
        assert_eq!(a, b);
    }

    #[test]
    fn key_signature_keeps_last_six_chars() {
        assert_eq!(key_signature("0123456789abcdef"), "abcdef");
        assert_eq!(key_signature("abc"), "abc");
    }

    #[test]
    fn second_request_with_jitter_is_a_hit() {
        let (cache, _clock) = cache_with_clock();
        let provider = FakeProvider::new(sample_response(&[("Go", Some(100.0))]));

        cache.get_or_fetch(&pair(27.717_200_1, 85.324_000_1), false, &provider).unwrap();
        cache.get_or_fetch(&pair(27.717_200_4, 85.324_000_3), false, &provider).unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entry_is_refetched_and_restamped() {
        let (cache, clock) = cache_with_clock();
        let provider = FakeProvider::new(sample_response(&[("Go", Some(100.0))]));
        let waypoints = pair(27.7172, 85.3240);
        let key = RouteCacheKey::new(&waypoints, false, provider.key_signature());

        cache.get_or_fetch(&waypoints, false, &provider).unwrap();
        let first_stamp = cache.entry(&key).unwrap().timestamp;

        clock.advance(TimeDelta::hours(11) + TimeDelta::minutes(59));
        cache.get_or_fetch(&waypoints, false, &provider).unwrap();
        assert_eq!(provider.call_count(), 1);

        clock.advance(TimeDelta::minutes(2));
        cache.get_or_fetch(&waypoints, false, &provider).unwrap();
        assert_eq!(provider.call_count(), 2);
        assert!(cache.entry(&key).unwrap().timestamp > first_stamp);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn inserting_past_capacity_evicts_the_first_inserted() {
        let (cache, _clock) = cache_with_clock();
        let provider = FakeProvider::new(sample_response(&[("Go", Some(100.0))]));

        let route = |i: usize| pair(27.0 + i as f64 * 0.001, 85.0);
        for i in 0..DEFAULT_CAPACITY {
            cache.get_or_fetch(&route(i), false, &provider).unwrap();
        }
        assert_eq!(cache.len(), DEFAULT_CAPACITY);

        cache.get_or_fetch(&route(DEFAULT_CAPACITY), false, &provider).unwrap();
        assert_eq!(cache.len(), DEFAULT_CAPACITY);

        let first = RouteCacheKey::new(&route(0), false, provider.key_signature());
        let second = RouteCacheKey::new(&route(1), false, provider.key_signature());
        let newest = RouteCacheKey::new(&route(DEFAULT_CAPACITY), false, provider.key_signature());
        assert!(!cache.contains(&first));
        assert!(cache.contains(&second));
        assert!(cache.contains(&newest));
    }

    #[test]
    fn refreshed_entry_moves_to_the_back_of_the_eviction_order() {
        let clock = Arc::new(ManualClock::new());
        let cache = RouteCache::with_clock(TimeDelta::hours(DEFAULT_TTL_HOURS), 3, clock.clone());
        let provider = FakeProvider::new(sample_response(&[("Go", Some(100.0))]));
        let route = |i: usize| pair(27.0 + i as f64 * 0.001, 85.0);
        let key = |i: usize| RouteCacheKey::new(&route(i), false, provider.key_signature());

        for i in 0..3 {
            cache.get_or_fetch(&route(i), false, &provider).unwrap();
        }
        clock.advance(TimeDelta::hours(DEFAULT_TTL_HOURS) + TimeDelta::minutes(1));
        cache.get_or_fetch(&route(0), false, &provider).unwrap();
        cache.get_or_fetch(&route(3), false, &provider).unwrap();

        assert_eq!(provider.call_count(), 5);
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(2)));
        assert!(cache.contains(&key(3)));
    }

    #[test]
    fn failed_fetch_stores_nothing() {
        let (cache, _clock) = cache_with_clock();
        let provider = FakeProvider::failing();

        let result = cache.get_or_fetch(&pair(27.7172, 85.3240), false, &provider);
        assert!(matches!(result, Err(RoutingError::RawApiError { status: 503, .. })));
        assert!(cache.is_empty());
    }
}
