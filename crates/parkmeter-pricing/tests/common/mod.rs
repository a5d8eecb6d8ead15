//! Common test utilities and helpers

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use parkmeter_pricing::{PricingStore, PricingTable, PricingZone, ZoneId};
use tempfile::TempDir;

/// Create a temporary directory for store and region files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Pricing store with the single zone (23..24)x(65..66) at 2.5/min
pub fn create_store_with_city_zone(dir: &TempDir) -> (PathBuf, ZoneId) {
    let path = dir.path().join("pricing.db");
    let store = PricingStore::open(&path).expect("Failed to open pricing store");
    let zone_id = store
        .insert_zone((23.0, 24.0), (65.0, 66.0), 2.5)
        .expect("Failed to insert zone");
    (path, zone_id)
}

/// `count` unit zones along the equator, all tagged with `tag`
pub fn tagged_table(tag: u32, count: usize) -> PricingTable {
    (0..count)
        .map(|i| PricingZone {
            zone_id: (tag as ZoneId) * 1000 + i as ZoneId,
            lat_min: 0.0,
            lat_max: 1.0,
            lon_min: i as f64,
            lon_max: i as f64 + 1.0,
            rate_per_min: tag as f64,
        })
        .collect()
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}
