// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Parkmeter
//!
//! Parking session ingestion with zone pricing served from shared memory.
//!
//! Two processes cooperate on one host:
//!
//! - **`pricing-publisher`** owns the pricing database. It loads the zone
//!   table into a shared-memory region on startup and republishes it every
//!   time the database file is written.
//! - **`parking-server`** accepts binary ENTER/LEAVE events over TCP, stores
//!   parking sessions in SQLite and prices each finished session by looking
//!   its entry point up in the shared region, never in the pricing database.
//!
//! ## Feature Flags
//!
//! - **`server`** (default): session store and TCP ingestion server
//!
//! Without `server` the crate exposes only the protocol, pricing, config and
//! logging layers, which is all the publisher side needs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────┐
//! │  pricing-publisher           │        │  parking-server              │
//! │  PricingStore (pricing.db)   │        │  IngestServer (TCP)          │
//! │        ↓ reload on change    │        │        ↓ per connection      │
//! │  CachePublisher ──publish──┐ │        │  SessionStore (parking.db)   │
//! └────────────────────────────│─┘        │        ↑ price on LEAVE      │
//!                              ↓          │  PriceCalculator             │
//!              SharedPricingCache  ←──────┤  (attach, with_lock lookups) │
//!              (/dev/shm region)          └──────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use parkmeter::prelude::*;
//! use std::path::Path;
//!
//! let region = segment_path(Path::new("pricing.db"), Path::new("/dev/shm"))?;
//! let cache = SharedPricingCache::attach(&region)?;
//! let calculator = PriceCalculator::new(cache);
//!
//! let store = SessionStore::open_in_memory()?;
//! store.open_session("CAR123", 23.1, 65.97, 1000)?;
//! if let CloseOutcome::Closed(session) = store.close_session("CAR123", 1180, &calculator)? {
//!     println!("zone {} price {:.2}", session.zone_id, session.price);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use parkmeter_config as config;
pub use parkmeter_observability as observability;
pub use parkmeter_pricing as pricing;
pub use parkmeter_protocol as protocol;

#[cfg(feature = "server")]
pub use parkmeter_server as server;

#[cfg(feature = "server")]
pub use parkmeter_sessions as sessions;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, ParkmeterConfig};
    pub use crate::pricing::{
        segment_path, CachePublisher, PricingStore, PricingTable, PricingZone,
        SharedPricingCache, ZoneLookup, ZoneMatch, UNKNOWN_ZONE,
    };
    pub use crate::protocol::{EventKind, EventReader, EventWriter, ParkingEvent, VehicleId};

    #[cfg(feature = "server")]
    pub use crate::server::{IngestServer, ServerContext, ServerHandle};

    #[cfg(feature = "server")]
    pub use crate::sessions::{CloseOutcome, PriceCalculator, SessionStore};
}
