//! Fetch-result cache with single-flight semantics.
//!
//! Results are indexed by the exact query and reused for a fixed
//! time-to-live. While a fetch for a key is running, other callers asking
//! for the same key wait for it and share its outcome instead of issuing
//! their own backend query. Failed fetches are shared with those waiters
//! but never stored.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::store::{RawSample, SampleQuery, SampleStore};

/// Default time-to-live of a cached fetch
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
/// Default number of cached queries
pub const DEFAULT_CAPACITY: usize = 32;

type Shared = Result<Arc<Vec<RawSample>>>;

#[derive(Debug)]
struct CacheEntry {
    samples: Arc<Vec<RawSample>>,
    fetched_at: Instant,
}

/// A fetch in progress, awaited by concurrent callers
#[derive(Debug, Default)]
struct Flight {
    outcome: Mutex<Option<Shared>>,
    done: Condvar,
}

impl Flight {
    fn complete(&self, outcome: Shared) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(outcome);
        }
        self.done.notify_all();
    }

    fn wait(&self) -> Shared {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self.done.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<SampleQuery, CacheEntry>,
    in_flight: HashMap<SampleQuery, Arc<Flight>>,
}

impl CacheState {
    fn purge_expired(&mut self, ttl: Duration, now: Instant) {
        self.entries
            .retain(|_, entry| now.duration_since(entry.fetched_at) < ttl);
    }

    fn insert(&mut self, query: SampleQuery, entry: CacheEntry, capacity: usize) {
        self.entries.insert(query, entry);
        while self.entries.len() > capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// Releases waiters if the leading fetch unwinds before completing.
struct FlightGuard<'a, S: SampleStore> {
    cache: &'a CachedStore<S>,
    query: &'a SampleQuery,
    flight: Arc<Flight>,
    finished: bool,
}

impl<S: SampleStore> FlightGuard<'_, S> {
    fn finish(mut self, outcome: &Shared) {
        {
            let mut state = self.cache.lock_state();
            state.in_flight.remove(self.query);
            if let Ok(samples) = outcome {
                state.insert(
                    self.query.clone(),
                    CacheEntry {
                        samples: Arc::clone(samples),
                        fetched_at: Instant::now(),
                    },
                    self.cache.capacity,
                );
            }
        }
        self.flight.complete(outcome.clone());
        self.finished = true;
    }
}

impl<S: SampleStore> Drop for FlightGuard<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            self.cache.lock_state().in_flight.remove(self.query);
            self.flight.complete(Err(Error::StoreQuery(format!(
                "fetch for {} was aborted",
                self.query
            ))));
        }
    }
}

/// Bounded, TTL-indexed cache in front of any sample store
#[derive(Debug)]
pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl<S: SampleStore> CachedStore<S> {
    /// Cache with the default TTL and capacity
    pub fn new(inner: S) -> Self {
        Self::with_policy(inner, DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    /// Cache with an explicit TTL and capacity (at least one entry)
    pub fn with_policy(inner: S, ttl: Duration, capacity: usize) -> Self {
        CachedStore {
            inner,
            ttl,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Time-to-live of an entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of live cached queries
    pub fn len(&self) -> usize {
        let mut state = self.lock_state();
        state.purge_expired(self.ttl, Instant::now());
        state.entries.len()
    }

    /// Whether no live query is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached entry; running fetches are unaffected
    pub fn clear(&self) {
        self.lock_state().entries.clear();
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached samples for `query`, fetching them at most once per TTL
    pub fn get(&self, query: &SampleQuery) -> Result<Arc<Vec<RawSample>>> {
        let flight = {
            let mut state = self.lock_state();
            state.purge_expired(self.ttl, Instant::now());

            let cached = state.entries.get(query).map(|e| Arc::clone(&e.samples));
            if let Some(samples) = cached {
                log::debug!("cache hit for {}", query);
                return Ok(samples);
            }

            let running = state.in_flight.get(query).cloned();
            if let Some(flight) = running {
                drop(state);
                log::debug!("joining in-flight fetch for {}", query);
                return flight.wait();
            }

            let flight = Arc::new(Flight::default());
            state.in_flight.insert(query.clone(), Arc::clone(&flight));
            flight
        };

        log::debug!("cache miss for {}", query);
        let guard = FlightGuard {
            cache: self,
            query,
            flight,
            finished: false,
        };
        let outcome = self.inner.fetch(query).map(Arc::new);
        guard.finish(&outcome);
        outcome
    }
}

impl<S: SampleStore> SampleStore for CachedStore<S> {
    fn fetch(&self, query: &SampleQuery) -> Result<Vec<RawSample>> {
        self.get(query).map(|samples| samples.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::Utc;

    fn query(days: u32) -> SampleQuery {
        SampleQuery::new("m", ["f"], days).unwrap()
    }

    #[test]
    fn test_reuses_within_ttl() {
        let cache = CachedStore::new(InMemoryStore::new(Utc::now()));
        cache.get(&query(1)).unwrap();
        cache.get(&query(1)).unwrap();
        assert_eq!(cache.inner().calls(), 1);

        cache.get(&query(2)).unwrap();
        assert_eq!(cache.inner().calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache =
            CachedStore::with_policy(InMemoryStore::new(Utc::now()), DEFAULT_TTL, 2);
        for days in 1..=3 {
            cache.get(&query(days)).unwrap();
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(cache.len(), 2);

        cache.get(&query(3)).unwrap();
        assert_eq!(cache.inner().calls(), 3);
        cache.get(&query(1)).unwrap();
        assert_eq!(cache.inner().calls(), 4);
    }

    #[test]
    fn test_clear() {
        let cache = CachedStore::new(InMemoryStore::new(Utc::now()));
        cache.get(&query(1)).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        cache.get(&query(1)).unwrap();
        assert_eq!(cache.inner().calls(), 2);
    }
}
