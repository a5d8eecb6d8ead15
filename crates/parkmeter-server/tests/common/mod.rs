//! Common test utilities and helpers

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use parkmeter_config::{ParkmeterConfig, PricingConfig, ServerConfig, SessionsConfig};
use parkmeter_pricing::{PricingTable, PricingZone, SharedPricingCache};
use parkmeter_server::ServerContext;
use parkmeter_sessions::SessionStore;
use tempfile::TempDir;

pub const CITY_ZONE_ID: i64 = 8;

pub struct TestEnv {
    pub dir: TempDir,
    pub publisher: SharedPricingCache,
    pub ctx: Arc<ServerContext>,
}

/// Server context on an ephemeral port with the city zone published
pub fn create_test_env() -> TestEnv {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let region = dir.path().join("parkmeter-pricing-test");

    let publisher = SharedPricingCache::create(&region, 4864).expect("Failed to create region");
    publisher
        .publish(&PricingTable::new(vec![PricingZone {
            zone_id: CITY_ZONE_ID,
            lat_min: 23.0,
            lat_max: 24.0,
            lon_min: 65.0,
            lon_max: 66.0,
            rate_per_min: 2.5,
        }]))
        .expect("Failed to publish");

    let config = ParkmeterConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        pricing: PricingConfig {
            db_path: dir.path().join("pricing.db"),
            shm_dir: dir.path().to_path_buf(),
            ..PricingConfig::default()
        },
        sessions: SessionsConfig {
            db_path: dir.path().join("parking.db"),
            ..SessionsConfig::default()
        },
        logging: Default::default(),
    };

    let sessions = SessionStore::open(
        &config.sessions.db_path,
        Duration::from_millis(config.sessions.busy_timeout_ms),
    )
    .expect("Failed to open session store");
    let reader = SharedPricingCache::attach(&region).expect("Failed to attach");

    TestEnv {
        ctx: Arc::new(ServerContext::new(config, sessions, reader)),
        publisher,
        dir,
    }
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
