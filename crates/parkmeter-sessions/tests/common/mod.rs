//! Common test utilities and helpers

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use parkmeter_pricing::{PricingTable, PricingZone, SharedPricingCache};
use parkmeter_sessions::SessionStore;
use tempfile::TempDir;

pub const CITY_ZONE_ID: i64 = 31;

/// Create a temporary directory for databases and the pricing region
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn open_store(dir: &TempDir) -> SessionStore {
    SessionStore::open(&dir.path().join("parking.db"), Duration::from_secs(5))
        .expect("Failed to open session store")
}

/// (23..24)x(65..66) at 2.5/min, behind a catch-all free zone
pub fn city_table() -> PricingTable {
    PricingTable::new(vec![
        PricingZone {
            zone_id: CITY_ZONE_ID,
            lat_min: 23.0,
            lat_max: 24.0,
            lon_min: 65.0,
            lon_max: 66.0,
            rate_per_min: 2.5,
        },
        PricingZone {
            zone_id: 32,
            lat_min: 0.0,
            lat_max: 50.0,
            lon_min: 0.0,
            lon_max: 80.0,
            rate_per_min: 0.0,
        },
    ])
}

/// Publish `table` into a fresh region and return a reader attached to it
pub fn published_region(path: &Path, table: &PricingTable) -> (SharedPricingCache, SharedPricingCache) {
    let publisher = SharedPricingCache::create(path, 4864).expect("Failed to create region");
    publisher.publish(table).expect("Failed to publish");
    let reader = SharedPricingCache::attach(path).expect("Failed to attach");
    (publisher, reader)
}
