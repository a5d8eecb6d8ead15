// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # parkmeter-sessions
//!
//! Parking sessions: an ENTER opens a row in the `parking` table, the
//! matching LEAVE prices it and closes it. Rows are never deleted.
//!
//! ```
//! use parkmeter_pricing::{PricingTable, PricingZone};
//! use parkmeter_sessions::{CloseOutcome, PriceCalculator, SessionStore};
//!
//! let calculator = PriceCalculator::new(PricingTable::new(vec![PricingZone {
//!     zone_id: 1,
//!     lat_min: 23.0,
//!     lat_max: 24.0,
//!     lon_min: 65.0,
//!     lon_max: 66.0,
//!     rate_per_min: 2.5,
//! }]));
//!
//! let store = SessionStore::open_in_memory()?;
//! store.open_session("CAR123", 23.1, 65.97, 1000)?;
//! match store.close_session("CAR123", 1180, &calculator)? {
//!     CloseOutcome::Closed(session) => assert_eq!(session.price, 7.5),
//!     CloseOutcome::NotFound => unreachable!(),
//! }
//! # Ok::<(), parkmeter_sessions::SessionError>(())
//! ```

pub mod error;
pub mod pricing;
pub mod session;
pub mod store;

pub use error::{Result, SessionError};
pub use pricing::{round_to_cents, Charge, PriceCalculator};
pub use session::{ClosedSession, CloseOutcome, OpenSession, ParkingSession, SessionId};
pub use store::SessionStore;
