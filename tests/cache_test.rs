mod common;

use common::{dht22_store, reference_now};
use sensorscope::store::cache::DEFAULT_CAPACITY;
use sensorscope::{CachedStore, Error, InMemoryStore, SampleQuery, SampleStore, SensorKind};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn dht22_query(days: u32) -> SampleQuery {
    SampleQuery::for_sensor(SensorKind::Dht22, days).unwrap()
}

#[test]
fn test_concurrent_callers_share_one_fetch() {
    let cache = CachedStore::new(dht22_store(60).with_latency(Duration::from_millis(200)));
    let query = dht22_query(3);
    let callers = 8;
    let barrier = Barrier::new(callers);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache.get(&query).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.inner().calls(), 1);
    assert_eq!(results[0].len(), 120);
    for samples in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], samples));
    }
}

#[test]
fn test_distinct_keys_fetch_separately() {
    let cache = CachedStore::new(dht22_store(10));
    cache.get(&dht22_query(1)).unwrap();
    cache.get(&dht22_query(2)).unwrap();
    cache
        .get(&SampleQuery::for_sensor(SensorKind::Mpu6050, 1).unwrap())
        .unwrap();
    cache.get(&dht22_query(2)).unwrap();
    assert_eq!(cache.inner().calls(), 3);
}

#[test]
fn test_entries_expire_after_ttl() {
    let cache = CachedStore::with_policy(dht22_store(10), Duration::from_millis(50), DEFAULT_CAPACITY);
    let query = dht22_query(1);

    cache.get(&query).unwrap();
    cache.get(&query).unwrap();
    assert_eq!(cache.inner().calls(), 1);

    thread::sleep(Duration::from_millis(80));
    assert!(cache.is_empty());
    cache.get(&query).unwrap();
    assert_eq!(cache.inner().calls(), 2);
}

#[test]
fn test_errors_are_not_cached() {
    let store = InMemoryStore::new(reference_now())
        .failing_with(Error::StoreConnection("connection refused".into()));
    let cache = CachedStore::new(store);
    let query = dht22_query(1);

    assert_eq!(
        cache.get(&query),
        Err(Error::StoreConnection("connection refused".into()))
    );
    assert!(cache.get(&query).is_err());
    assert_eq!(cache.inner().calls(), 2);
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_callers_share_one_failure() {
    let store = InMemoryStore::new(reference_now())
        .with_latency(Duration::from_millis(200))
        .failing_with(Error::StoreQuery("bucket not found".into()));
    let cache = CachedStore::new(store);
    let query = dht22_query(1);
    let callers = 4;
    let barrier = Barrier::new(callers);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache.get(&query)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.inner().calls(), 1);
    for result in results {
        assert_eq!(result, Err(Error::StoreQuery("bucket not found".into())));
    }
}

#[test]
fn test_cached_store_is_a_sample_store() {
    let store: Box<dyn SampleStore> = Box::new(CachedStore::new(dht22_store(5)));
    let samples = store.fetch(&dht22_query(1)).unwrap();
    assert_eq!(samples.len(), 10);
    assert_eq!(store.fetch(&dht22_query(1)).unwrap(), samples);
}
