// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Pricing Zone Table
//!
//! Ordered collection of rectangular rate zones with point lookup.
//!
//! Lookup quantizes the query point first: latitude and longitude are each
//! rounded to the nearest whole degree (half away from zero) and then compared
//! against closed rectangles. Zones may overlap; the first containing zone in
//! table order wins.

/// Zone identifier (pricing store primary key)
pub type ZoneId = i64;

/// Recorded on a closed session when no zone covers its entry point
pub const UNKNOWN_ZONE: ZoneId = -1;

/// One rectangular pricing zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingZone {
    pub zone_id: ZoneId,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub rate_per_min: f64,
}

impl PricingZone {
    /// Closed-rectangle containment of an already quantized point
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_min <= lat && lat <= self.lat_max && self.lon_min <= lon && lon <= self.lon_max
    }
}

/// Result of a successful point lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneMatch {
    pub zone_id: ZoneId,
    pub rate_per_min: f64,
}

/// Round a coordinate to the zone grid
pub fn quantize(coord: f64) -> f64 {
    coord.round()
}

/// First zone in iteration order containing the quantized point
pub fn first_containing<I>(zones: I, lat: f64, lon: f64) -> Option<PricingZone>
where
    I: IntoIterator<Item = PricingZone>,
{
    let (lat, lon) = (quantize(lat), quantize(lon));
    zones.into_iter().find(|zone| zone.contains(lat, lon))
}

/// Anything that can resolve a parking position to a zone and its rate
pub trait ZoneLookup {
    fn lookup(&self, lat: f64, lon: f64) -> Option<ZoneMatch>;
}

impl<T: ZoneLookup + ?Sized> ZoneLookup for &T {
    fn lookup(&self, lat: f64, lon: f64) -> Option<ZoneMatch> {
        (**self).lookup(lat, lon)
    }
}

impl<T: ZoneLookup + ?Sized> ZoneLookup for std::sync::Arc<T> {
    fn lookup(&self, lat: f64, lon: f64) -> Option<ZoneMatch> {
        (**self).lookup(lat, lon)
    }
}

/// In-memory pricing table in storage order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingTable {
    zones: Vec<PricingZone>,
}

impl PricingTable {
    pub fn new(zones: Vec<PricingZone>) -> Self {
        Self { zones }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[PricingZone] {
        &self.zones
    }

    pub fn push(&mut self, zone: PricingZone) {
        self.zones.push(zone);
    }

    /// Id of the first zone containing the point
    pub fn find_zone(&self, lat: f64, lon: f64) -> Option<ZoneId> {
        first_containing(self.zones.iter().copied(), lat, lon).map(|zone| zone.zone_id)
    }

    /// Rate of the zone with the given id
    pub fn rate_for(&self, zone_id: ZoneId) -> Option<f64> {
        self.zones
            .iter()
            .find(|zone| zone.zone_id == zone_id)
            .map(|zone| zone.rate_per_min)
    }
}

impl ZoneLookup for PricingTable {
    fn lookup(&self, lat: f64, lon: f64) -> Option<ZoneMatch> {
        first_containing(self.zones.iter().copied(), lat, lon).map(|zone| ZoneMatch {
            zone_id: zone.zone_id,
            rate_per_min: zone.rate_per_min,
        })
    }
}

impl FromIterator<PricingZone> for PricingTable {
    fn from_iter<T: IntoIterator<Item = PricingZone>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
