// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session records

use parkmeter_pricing::ZoneId;

/// Surrogate key of a `parking` row
pub type SessionId = i64;

/// A session that has been entered but not yet left
///
/// This is what the price calculator sees when the session closes.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSession {
    pub id: SessionId,
    pub vehicle_id: String,
    pub lat: f64,
    pub lon: f64,
    pub start_time: i64,
}

/// Full `parking` row
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingSession {
    pub id: SessionId,
    pub vehicle_id: String,
    pub lat: f64,
    pub lon: f64,
    pub zone_id: Option<ZoneId>,
    pub start_time: i64,
    pub end_time: Option<i64>,
    /// Parked duration in seconds, set on close
    pub overall_time: Option<i64>,
    pub price: Option<f64>,
}

impl ParkingSession {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Values written when a session closes
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    pub id: SessionId,
    pub vehicle_id: String,
    pub zone_id: ZoneId,
    pub start_time: i64,
    pub end_time: i64,
    pub overall_time: i64,
    pub price: f64,
}

/// Result of a LEAVE
#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    Closed(ClosedSession),
    /// The vehicle had no open session; nothing was written
    NotFound,
}

impl CloseOutcome {
    pub fn closed(&self) -> Option<&ClosedSession> {
        match self {
            CloseOutcome::Closed(session) => Some(session),
            CloseOutcome::NotFound => None,
        }
    }
}
