// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared region layout
//!
//! ```text
//! Header (64 bytes):
//!   [0:8]    Magic "PARKZONE"
//!   [8:12]   Layout version (u32)
//!   [12:16]  Lock word (u32, holder pid, 0 = free)
//!   [16:20]  Ready flag (u32)
//!   [20:24]  Zone count (u32)
//!   [24:28]  Capacity (u32, zone records after the header)
//!   [28:32]  Zone record size (u32)
//!   [32:40]  Generation (u64, bumped by every publish)
//!   [40:44]  Publisher pid (u32)
//!   [44:64]  Reserved
//!
//! Then `capacity` zone records of 48 bytes:
//!   [0:8]    zone_id (i64)
//!   [8:16]   lat_min (f64)
//!   [16:24]  lat_max (f64)
//!   [24:32]  lon_min (f64)
//!   [32:40]  lon_max (f64)
//!   [40:48]  rate_per_min (f64)
//! ```
//!
//! All numeric fields are native-endian; the region is only shared between
//! processes on one host.

use byteorder::{ByteOrder, NativeEndian};

use crate::error::{PricingError, Result};
use crate::zone_table::PricingZone;

pub const MAGIC: &[u8; 8] = b"PARKZONE";
pub const LAYOUT_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 64;
pub const ZONE_RECORD_SIZE: usize = 48;

/// Smallest region that holds the header and one zone
pub const MIN_REGION_SIZE: usize = HEADER_SIZE + ZONE_RECORD_SIZE;

pub const MAGIC_OFFSET: usize = 0;
pub const VERSION_OFFSET: usize = 8;
pub const LOCK_OFFSET: usize = 12;
pub const READY_OFFSET: usize = 16;
pub const COUNT_OFFSET: usize = 20;
pub const CAPACITY_OFFSET: usize = 24;
pub const RECORD_SIZE_OFFSET: usize = 28;
pub const GENERATION_OFFSET: usize = 32;
pub const PUBLISHER_PID_OFFSET: usize = 40;

/// Number of zone records a region of `region_size` bytes holds
pub fn capacity_for(region_size: usize) -> usize {
    region_size.saturating_sub(HEADER_SIZE) / ZONE_RECORD_SIZE
}

/// Region size needed for `capacity` zones
pub fn region_size_for(capacity: usize) -> usize {
    HEADER_SIZE + capacity * ZONE_RECORD_SIZE
}

pub fn record_offset(index: usize) -> usize {
    HEADER_SIZE + index * ZONE_RECORD_SIZE
}

pub fn encode_zone(zone: &PricingZone, buf: &mut [u8]) {
    NativeEndian::write_i64(&mut buf[0..8], zone.zone_id);
    NativeEndian::write_f64(&mut buf[8..16], zone.lat_min);
    NativeEndian::write_f64(&mut buf[16..24], zone.lat_max);
    NativeEndian::write_f64(&mut buf[24..32], zone.lon_min);
    NativeEndian::write_f64(&mut buf[32..40], zone.lon_max);
    NativeEndian::write_f64(&mut buf[40..48], zone.rate_per_min);
}

pub fn decode_zone(buf: &[u8]) -> PricingZone {
    PricingZone {
        zone_id: NativeEndian::read_i64(&buf[0..8]),
        lat_min: NativeEndian::read_f64(&buf[8..16]),
        lat_max: NativeEndian::read_f64(&buf[16..24]),
        lon_min: NativeEndian::read_f64(&buf[24..32]),
        lon_max: NativeEndian::read_f64(&buf[32..40]),
        rate_per_min: NativeEndian::read_f64(&buf[40..48]),
    }
}

/// Write the static part of a fresh header
///
/// The magic goes in last so a concurrent attach never accepts a half
/// initialized header.
pub fn init_header(header: &mut [u8], capacity: u32) {
    header[..HEADER_SIZE].fill(0);
    NativeEndian::write_u32(&mut header[VERSION_OFFSET..VERSION_OFFSET + 4], LAYOUT_VERSION);
    NativeEndian::write_u32(&mut header[CAPACITY_OFFSET..CAPACITY_OFFSET + 4], capacity);
    NativeEndian::write_u32(
        &mut header[RECORD_SIZE_OFFSET..RECORD_SIZE_OFFSET + 4],
        ZONE_RECORD_SIZE as u32,
    );
    header[MAGIC_OFFSET..MAGIC_OFFSET + 8].copy_from_slice(MAGIC);
}

/// Check a mapped header against this layout and the mapping length
///
/// Returns the zone capacity recorded in the header.
pub fn validate_header(header: &[u8], mapped_len: usize) -> Result<usize> {
    if mapped_len < MIN_REGION_SIZE || header.len() < HEADER_SIZE {
        return Err(PricingError::LayoutMismatch(format!(
            "region is {} bytes, smaller than the minimum {}",
            mapped_len, MIN_REGION_SIZE
        )));
    }

    if &header[MAGIC_OFFSET..MAGIC_OFFSET + 8] != MAGIC {
        return Err(PricingError::LayoutMismatch("bad magic".to_string()));
    }

    let version = NativeEndian::read_u32(&header[VERSION_OFFSET..VERSION_OFFSET + 4]);
    if version != LAYOUT_VERSION {
        return Err(PricingError::LayoutMismatch(format!(
            "layout version {} (expected {})",
            version, LAYOUT_VERSION
        )));
    }

    let record_size = NativeEndian::read_u32(&header[RECORD_SIZE_OFFSET..RECORD_SIZE_OFFSET + 4]);
    if record_size as usize != ZONE_RECORD_SIZE {
        return Err(PricingError::LayoutMismatch(format!(
            "zone record size {} (expected {})",
            record_size, ZONE_RECORD_SIZE
        )));
    }

    let capacity = NativeEndian::read_u32(&header[CAPACITY_OFFSET..CAPACITY_OFFSET + 4]) as usize;
    if capacity == 0 || region_size_for(capacity) > mapped_len {
        return Err(PricingError::LayoutMismatch(format!(
            "capacity {} does not fit a {} byte region",
            capacity, mapped_len
        )));
    }

    Ok(capacity)
}
