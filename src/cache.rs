//! Location-keyed resource cache for weather bundles
//!
//! The cache owns three resource slots per location (current conditions,
//! forecast timelines, alerts). All three are populated by one combined
//! provider fetch, because the provider delivers them as one correlated
//! bundle; splitting the fetch per kind would triple request volume.
//!
//! Guarantees:
//! - at most one in-flight fetch per location key, no matter how many
//!   callers or resource kinds ask (`ensure_*` joins the existing fetch);
//! - a failed refresh never clears previously displayed data;
//! - a slot that has shown data never flips back to `Loading`; refreshes
//!   are flagged with `is_refreshing` instead (stale-while-revalidate);
//! - all three slots of a key are updated atomically under one lock;
//! - a slow fetch that settles after a newer one cannot overwrite the
//!   newer outcome (every fetch carries a monotonic stamp).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::WeatherError;
use crate::models::{CurrentConditions, ForecastTimeline, Location, LocationKey, WeatherAlert};
use crate::openweather::WeatherService;

/// Lifecycle of a resource slot.
///
/// `Idle -> Loading -> (Success | Error)`; once a slot has been `Success`
/// it never returns to `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// One cache slot: the last known state of a resource kind for a location.
#[derive(Debug, Clone)]
pub struct Resource<T> {
    pub status: ResourceStatus,
    pub data: Option<T>,
    pub error: Option<WeatherError>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub is_refreshing: bool,
}

impl<T> Resource<T> {
    /// The state of a slot nobody has asked about yet
    #[must_use]
    pub fn idle() -> Self {
        Self {
            status: ResourceStatus::Idle,
            data: None,
            error: None,
            last_updated_at: None,
            is_refreshing: false,
        }
    }

    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.status == ResourceStatus::Success
            && self
                .last_updated_at
                .is_some_and(|updated| now - updated < ttl)
    }

    /// Transition into a fetch: empty slots go to `Loading`, populated
    /// slots keep their data and are flagged as refreshing.
    fn begin_fetch(&mut self) {
        if self.data.is_some() {
            self.status = ResourceStatus::Success;
            self.is_refreshing = true;
        } else {
            self.status = ResourceStatus::Loading;
            self.is_refreshing = false;
        }
        self.error = None;
    }

    fn complete(&mut self, data: T, at: DateTime<Utc>) {
        self.status = ResourceStatus::Success;
        self.data = Some(data);
        self.error = None;
        self.last_updated_at = Some(at);
        self.is_refreshing = false;
    }

    /// Record a failure, keeping whatever data the slot already had.
    fn fail(&mut self, error: WeatherError, at: DateTime<Utc>) {
        self.status = ResourceStatus::Error;
        self.error = Some(error);
        self.last_updated_at = Some(at);
        self.is_refreshing = false;
    }
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Which slot of a location an `ensure`/`clear` call addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Current,
    Forecast,
    Alerts,
}

struct LocationSlots {
    current: Resource<CurrentConditions>,
    forecast: Resource<Vec<ForecastTimeline>>,
    alerts: Resource<Vec<WeatherAlert>>,
    /// Stamp of the last fetch whose outcome was applied to these slots
    applied_stamp: u64,
    /// Last time any caller touched this key, for eviction ordering
    touched_at: DateTime<Utc>,
}

impl LocationSlots {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            current: Resource::idle(),
            forecast: Resource::idle(),
            alerts: Resource::idle(),
            applied_stamp: 0,
            touched_at: now,
        }
    }

    fn is_fresh(&self, kind: ResourceKind, ttl: Duration, now: DateTime<Utc>) -> bool {
        match kind {
            ResourceKind::Current => self.current.is_fresh(ttl, now),
            ResourceKind::Forecast => self.forecast.is_fresh(ttl, now),
            ResourceKind::Alerts => self.alerts.is_fresh(ttl, now),
        }
    }

    fn all_idle(&self) -> bool {
        self.current.status == ResourceStatus::Idle
            && self.forecast.status == ResourceStatus::Idle
            && self.alerts.status == ResourceStatus::Idle
    }
}

type FetchFuture = Shared<BoxFuture<'static, ()>>;

struct CacheState {
    slots: HashMap<LocationKey, LocationSlots>,
    in_flight: HashMap<LocationKey, FetchFuture>,
    next_stamp: u64,
}

struct CacheInner {
    service: Arc<dyn WeatherService>,
    ttl: Duration,
    max_locations: usize,
    state: Mutex<CacheState>,
}

/// The process-wide weather cache. Cheap to clone; clones share state.
///
/// Constructed explicitly and injected into consumers; there is no global
/// instance.
#[derive(Clone)]
pub struct WeatherCache {
    inner: Arc<CacheInner>,
}

impl WeatherCache {
    /// Create a cache over the given bundle service.
    #[must_use]
    pub fn new(service: Arc<dyn WeatherService>, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                service,
                ttl: Duration::seconds(config.ttl_seconds.min(i64::MAX as u64) as i64),
                max_locations: config.max_locations.max(1),
                state: Mutex::new(CacheState {
                    slots: HashMap::new(),
                    in_flight: HashMap::new(),
                    next_stamp: 0,
                }),
            }),
        }
    }

    /// Ensure fresh current conditions for a location.
    ///
    /// Returns once the slot is fresh: immediately on a cache hit, otherwise
    /// when the (possibly joined) combined fetch settles. Outcomes are read
    /// back through [`WeatherCache::current`].
    pub async fn ensure_current(&self, location: &Location) {
        self.ensure_bundle(location, ResourceKind::Current).await;
    }

    /// Ensure fresh forecast timelines for a location.
    pub async fn ensure_forecast(&self, location: &Location) {
        self.ensure_bundle(location, ResourceKind::Forecast).await;
    }

    /// Ensure fresh alerts for a location.
    pub async fn ensure_alerts(&self, location: &Location) {
        self.ensure_bundle(location, ResourceKind::Alerts).await;
    }

    /// Current-conditions slot for a key. Never triggers a fetch.
    #[must_use]
    pub fn current(&self, key: &LocationKey) -> Resource<CurrentConditions> {
        let state = self.inner.state.lock();
        state
            .slots
            .get(key)
            .map(|entry| entry.current.clone())
            .unwrap_or_default()
    }

    /// Forecast slot for a key. Never triggers a fetch.
    #[must_use]
    pub fn forecast(&self, key: &LocationKey) -> Resource<Vec<ForecastTimeline>> {
        let state = self.inner.state.lock();
        state
            .slots
            .get(key)
            .map(|entry| entry.forecast.clone())
            .unwrap_or_default()
    }

    /// Alerts slot for a key. Never triggers a fetch.
    #[must_use]
    pub fn alerts(&self, key: &LocationKey) -> Resource<Vec<WeatherAlert>> {
        let state = self.inner.state.lock();
        state
            .slots
            .get(key)
            .map(|entry| entry.alerts.clone())
            .unwrap_or_default()
    }

    /// Drop the current-conditions slot for a key (e.g. on deselect).
    pub fn clear_current(&self, key: &LocationKey) {
        self.clear(key, ResourceKind::Current);
    }

    /// Drop the forecast slot for a key.
    pub fn clear_forecast(&self, key: &LocationKey) {
        self.clear(key, ResourceKind::Forecast);
    }

    /// Drop the alerts slot for a key.
    pub fn clear_alerts(&self, key: &LocationKey) {
        self.clear(key, ResourceKind::Alerts);
    }

    /// Number of locations currently held.
    #[must_use]
    pub fn location_count(&self) -> usize {
        self.inner.state.lock().slots.len()
    }

    async fn ensure_bundle(&self, location: &Location, kind: ResourceKind) {
        let key = LocationKey::for_location(location);

        let fetch = {
            let mut state = self.inner.state.lock();
            let now = Utc::now();

            if let Some(entry) = state.slots.get_mut(&key) {
                entry.touched_at = now;
                if entry.is_fresh(kind, self.inner.ttl, now) {
                    debug!(key = %key, "weather cache fresh, skipping fetch");
                    return;
                }
            }

            if let Some(existing) = state.in_flight.get(&key) {
                debug!(key = %key, "joining in-flight weather fetch");
                existing.clone()
            } else {
                let stamp = state.begin_fetch(&key, now, self.inner.max_locations);
                let fetch = run_fetch(self.inner.clone(), location.clone(), key.clone(), stamp)
                    .boxed()
                    .shared();
                state.in_flight.insert(key.clone(), fetch.clone());
                fetch
            }
        };

        fetch.await;
    }

    fn clear(&self, key: &LocationKey, kind: ResourceKind) {
        let mut state = self.inner.state.lock();
        let Some(entry) = state.slots.get_mut(key) else {
            return;
        };

        match kind {
            ResourceKind::Current => entry.current = Resource::idle(),
            ResourceKind::Forecast => entry.forecast = Resource::idle(),
            ResourceKind::Alerts => entry.alerts = Resource::idle(),
        }

        if entry.all_idle() {
            state.slots.remove(key);
        }
    }
}

impl CacheState {
    /// Mark a fetch as started: transition all three slots, hand out the
    /// fetch stamp, and make room for the key if the cache is full.
    fn begin_fetch(&mut self, key: &LocationKey, now: DateTime<Utc>, max_locations: usize) -> u64 {
        if !self.slots.contains_key(key) {
            self.evict_if_full(key, max_locations);
            self.slots.insert(key.clone(), LocationSlots::new(now));
        }

        // Entry guaranteed present by the insert above.
        if let Some(entry) = self.slots.get_mut(key) {
            entry.touched_at = now;
            entry.current.begin_fetch();
            entry.forecast.begin_fetch();
            entry.alerts.begin_fetch();
        }

        self.next_stamp += 1;
        self.next_stamp
    }

    /// Evict the least-recently-touched key without an in-flight fetch.
    fn evict_if_full(&mut self, incoming: &LocationKey, max_locations: usize) {
        while self.slots.len() >= max_locations {
            let candidate = self
                .slots
                .iter()
                .filter(|(key, _)| *key != incoming && !self.in_flight.contains_key(*key))
                .min_by(|(a_key, a), (b_key, b)| {
                    (a.touched_at, a_key.as_str()).cmp(&(b.touched_at, b_key.as_str()))
                })
                .map(|(key, _)| key.clone());

            match candidate {
                Some(key) => {
                    warn!(key = %key, "weather cache full, evicting least recently used location");
                    self.slots.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// The body of one combined fetch. Applies the outcome to all three slots
/// atomically, unless a newer fetch already did.
async fn run_fetch(inner: Arc<CacheInner>, location: Location, key: LocationKey, stamp: u64) {
    let outcome = inner.service.fetch_bundle(&location).await;

    let now = Utc::now();
    let mut state = inner.state.lock();
    state.in_flight.remove(&key);

    let Some(entry) = state.slots.get_mut(&key) else {
        // Cleared while the fetch was in flight; nothing to apply to.
        return;
    };

    if stamp <= entry.applied_stamp {
        debug!(key = %key, stamp, "discarding outcome of superseded fetch");
        return;
    }
    entry.applied_stamp = stamp;
    entry.touched_at = now;

    match outcome {
        Ok(bundle) => {
            entry.current.complete(bundle.current, now);
            entry.forecast.complete(bundle.forecast_timelines, now);
            entry.alerts.complete(bundle.alerts, now);
        }
        Err(error) => {
            warn!(key = %key, kind = %error.kind(), "weather bundle fetch failed");
            entry.current.fail(error.clone(), now);
            entry.forecast.fail(error.clone(), now);
            entry.alerts.fail(error, now);
        }
    }
}
