// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Parking Event Wire Protocol
//!
//! Sensors and gateways stream fixed-size binary records over TCP. Each record
//! carries one enter/leave event for one vehicle:
//!
//! ```text
//! Offset  Size  Field
//! [0:8]   8     vehicle id (raw bytes, zero padded, not necessarily NUL terminated)
//! [8:16]  8     latitude  (f64, native endian)
//! [16:24] 8     longitude (f64, native endian)
//! [24:28] 4     event kind (u32: 0 = LEAVE, 1 = ENTER)
//! [28:36] 8     timestamp (i64 seconds since epoch, native endian)
//! ```
//!
//! The layout is packed. There are no length prefixes or delimiters: a record
//! boundary is implied by [`RECORD_SIZE`]. Native endianness means producer and
//! consumer must share an architecture.
//!
//! ## Usage
//!
//! ```rust
//! use parkmeter_protocol::{decode, encode, EventKind, ParkingEvent, VehicleId};
//!
//! let event = ParkingEvent {
//!     vehicle_id: VehicleId::from_str_padded("CAR123").unwrap(),
//!     lat: 23.1,
//!     lon: 65.97,
//!     kind: EventKind::Enter,
//!     timestamp: 1000,
//! };
//! let bytes = encode(&event);
//! assert_eq!(decode(&bytes).unwrap(), event);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod codec;
pub mod error;
pub mod event;
pub mod stream;

pub use codec::{decode, encode, RECORD_SIZE};
pub use error::{DecodeError, Result};
pub use event::{EventKind, ParkingEvent, VehicleId, VEHICLE_ID_LEN};
pub use stream::{EventReader, EventWriter};
