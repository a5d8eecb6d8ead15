// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parking event types

use std::fmt;

/// Length of the vehicle identifier field on the wire
pub const VEHICLE_ID_LEN: usize = 8;

/// Vehicle identifier as carried on the wire.
///
/// Keeps the raw 8 bytes so that re-encoding reproduces the exact input, even
/// when bytes follow a NUL terminator. The textual form stops at the first NUL.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId([u8; VEHICLE_ID_LEN]);

impl VehicleId {
    pub const fn from_bytes(bytes: [u8; VEHICLE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an identifier from text, zero padding to 8 bytes.
    ///
    /// Returns `None` if the text is longer than 8 bytes.
    pub fn from_str_padded(text: &str) -> Option<Self> {
        let raw = text.as_bytes();
        if raw.len() > VEHICLE_ID_LEN {
            return None;
        }
        let mut bytes = [0u8; VEHICLE_ID_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; VEHICLE_ID_LEN] {
        &self.0
    }

    /// Text up to the first NUL byte (lossy for non UTF-8 input)
    pub fn as_string(&self) -> String {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(VEHICLE_ID_LEN);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl fmt::Debug for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VehicleId({:?})", self.as_string())
    }
}

/// Event kind (4-byte enum on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventKind {
    /// Vehicle left the spot, closes the open session
    Leave = 0,
    /// Vehicle parked, opens a session
    Enter = 1,
}

impl EventKind {
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(EventKind::Leave),
            1 => Some(EventKind::Enter),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u32 {
        self as u32
    }
}

/// One decoded parking event record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkingEvent {
    pub vehicle_id: VehicleId,
    pub lat: f64,
    pub lon: f64,
    pub kind: EventKind,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

impl ParkingEvent {
    pub fn enter(vehicle_id: VehicleId, lat: f64, lon: f64, timestamp: i64) -> Self {
        Self {
            vehicle_id,
            lat,
            lon,
            kind: EventKind::Enter,
            timestamp,
        }
    }

    /// Leave events still carry coordinates on the wire; pricing ignores them.
    pub fn leave(vehicle_id: VehicleId, lat: f64, lon: f64, timestamp: i64) -> Self {
        Self {
            vehicle_id,
            lat,
            lon,
            kind: EventKind::Leave,
            timestamp,
        }
    }
}
