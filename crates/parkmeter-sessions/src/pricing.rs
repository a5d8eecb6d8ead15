// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session price calculation
//!
//! The zone comes from the session's entry position, looked up in whatever
//! rate source the calculator was built with (the shared pricing region in
//! the server, a plain [`PricingTable`](parkmeter_pricing::PricingTable) in
//! tests). A position outside every zone is charged nothing and recorded
//! against [`UNKNOWN_ZONE`].

use parkmeter_pricing::{ZoneId, ZoneLookup, UNKNOWN_ZONE};
use tracing::{debug, warn};

use crate::session::OpenSession;

/// Computed charge for one session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charge {
    pub zone_id: ZoneId,
    /// Parked duration in seconds, never negative
    pub duration_secs: i64,
    /// Amount rounded to cents
    pub amount: f64,
}

/// Prices sessions against a zone rate source
#[derive(Debug, Clone)]
pub struct PriceCalculator<L> {
    rates: L,
}

impl<L: ZoneLookup> PriceCalculator<L> {
    pub fn new(rates: L) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &L {
        &self.rates
    }

    /// Charge for `session` ending at `end_time`
    ///
    /// Never fails: a zone miss yields [`UNKNOWN_ZONE`] and 0.00, and an end
    /// before the start is treated as zero duration.
    pub fn price(&self, session: &OpenSession, end_time: i64) -> Charge {
        let mut duration_secs = end_time.saturating_sub(session.start_time);
        if duration_secs < 0 {
            warn!(
                "Session {} for {} ends at {} before it started at {}; charging zero time",
                session.id, session.vehicle_id, end_time, session.start_time
            );
            duration_secs = 0;
        }

        let Some(hit) = self.rates.lookup(session.lat, session.lon) else {
            debug!(
                "No pricing zone covers ({}, {}) for session {}",
                session.lat, session.lon, session.id
            );
            return Charge {
                zone_id: UNKNOWN_ZONE,
                duration_secs,
                amount: 0.0,
            };
        };

        let minutes = duration_secs as f64 / 60.0;
        Charge {
            zone_id: hit.zone_id,
            duration_secs,
            amount: round_to_cents(minutes * hit.rate_per_min),
        }
    }
}

/// Round half away from zero to two decimals
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
