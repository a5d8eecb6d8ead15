// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # parkmeter-pricing
//!
//! Geographic pricing for parking sessions.
//!
//! - [`zone_table`]: rectangular rate zones and point lookup
//! - [`store`]: the authoritative SQLite `pricing` table
//! - [`shared_cache`]: the zone table mirrored into a shared-memory region,
//!   guarded by a lock usable across processes
//! - [`publisher`]: reloads the store into the region on startup and on every
//!   change to the store file
//!
//! The ingestion server only ever attaches to the region and reads it; it
//! never touches the pricing database.
//!
//! ```no_run
//! use parkmeter_pricing::{segment_path, SharedPricingCache, ZoneLookup};
//! use std::path::Path;
//!
//! let region = segment_path(Path::new("pricing.db"), Path::new("/dev/shm"))?;
//! let cache = SharedPricingCache::attach(&region)?;
//! if let Some(hit) = cache.lookup(23.1, 65.97) {
//!     println!("zone {} at {}/min", hit.zone_id, hit.rate_per_min);
//! }
//! # Ok::<(), parkmeter_pricing::PricingError>(())
//! ```

pub mod error;
pub mod publisher;
pub mod shared_cache;
pub mod store;
pub mod zone_table;

pub use error::{PricingError, Result};
pub use publisher::{is_reload_trigger, shutdown_channel, CachePublisher, PublishReport};
pub use shared_cache::{
    capacity_for, region_size_for, remove_segment, segment_path, CacheView, RegionRole,
    SharedPricingCache,
};
pub use store::{default_grid, load_table, PricingStore};
pub use zone_table::{PricingTable, PricingZone, ZoneId, ZoneLookup, ZoneMatch, UNKNOWN_ZONE};
