//! Session lifecycle against a shared pricing region

mod common;

use std::sync::Arc;
use std::thread;

use common::{city_table, create_temp_dir, open_store, published_region, CITY_ZONE_ID};
use parkmeter_pricing::UNKNOWN_ZONE;
use parkmeter_sessions::{CloseOutcome, PriceCalculator};

#[test]
fn test_car123_scenario_through_shared_region() {
    let dir = create_temp_dir();
    let (_publisher, reader) = published_region(&dir.path().join("region"), &city_table());
    let calculator = PriceCalculator::new(reader);
    let store = open_store(&dir);

    store.open_session("CAR123", 23.1, 65.97, 1000).unwrap();
    let outcome = store.close_session("CAR123", 1180, &calculator).unwrap();

    let closed = outcome.closed().expect("CAR123 should close");
    assert_eq!(closed.zone_id, CITY_ZONE_ID);
    assert_eq!(closed.end_time, 1180);
    assert_eq!(closed.price, 7.5);

    let rows = store.sessions_for("CAR123").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].end_time, Some(1180));
    assert_eq!(rows[0].price, Some(7.5));
}

#[test]
fn test_car999_leave_without_enter() {
    let dir = create_temp_dir();
    let (_publisher, reader) = published_region(&dir.path().join("region"), &city_table());
    let calculator = PriceCalculator::new(reader);
    let store = open_store(&dir);

    assert_eq!(
        store.close_session("CAR999", 500, &calculator).unwrap(),
        CloseOutcome::NotFound
    );
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_uncovered_point_priced_zero() {
    let dir = create_temp_dir();
    let (_publisher, reader) = published_region(&dir.path().join("region"), &city_table());
    let calculator = PriceCalculator::new(reader);
    let store = open_store(&dir);

    store.open_session("CAR555", 99.0, 99.0, 0).unwrap();
    let outcome = store.close_session("CAR555", 3600, &calculator).unwrap();
    let closed = outcome.closed().unwrap();
    assert_eq!(closed.zone_id, UNKNOWN_ZONE);
    assert_eq!(closed.price, 0.0);
}

#[test]
fn test_overlapping_zones_first_wins() {
    let dir = create_temp_dir();
    let (_publisher, reader) = published_region(&dir.path().join("region"), &city_table());
    let calculator = PriceCalculator::new(reader);
    let store = open_store(&dir);

    // Inside both the city zone and the catch-all; the city zone is first
    store.open_session("CAR321", 23.4, 65.4, 0).unwrap();
    let outcome = store.close_session("CAR321", 60, &calculator).unwrap();
    assert_eq!(outcome.closed().unwrap().zone_id, CITY_ZONE_ID);
}

#[test]
fn test_concurrent_workers_close_every_session_once() {
    let dir = create_temp_dir();
    let (_publisher, reader) = published_region(&dir.path().join("region"), &city_table());
    let calculator = Arc::new(PriceCalculator::new(reader));
    let store = Arc::new(open_store(&dir));

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            let calculator = Arc::clone(&calculator);
            thread::spawn(move || {
                for car in 0..20 {
                    let vehicle = format!("W{}C{}", worker, car);
                    store.open_session(&vehicle, 23.0, 65.0, 0).unwrap();
                    let outcome = store.close_session(&vehicle, 120, &*calculator).unwrap();
                    assert_eq!(outcome.closed().unwrap().price, 5.0);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(store.count().unwrap(), 160);
    assert!(store.open_sessions().unwrap().is_empty());
    assert_eq!(store.priced_sessions().unwrap().len(), 160);
}
