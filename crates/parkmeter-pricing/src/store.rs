// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Authoritative pricing store (SQLite)
//!
//! The `pricing` table is edited by operators with ordinary SQLite tools. The
//! publisher only creates the schema, optionally seeds it, and loads it.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use crate::error::Result;
use crate::zone_table::{PricingTable, PricingZone, ZoneId};

const CREATE_PRICING_TABLE: &str = "CREATE TABLE IF NOT EXISTS pricing (
    zone_id INTEGER PRIMARY KEY AUTOINCREMENT,
    lat_min REAL NOT NULL,
    lat_max REAL NOT NULL,
    lon_min REAL NOT NULL,
    lon_max REAL NOT NULL,
    rate_per_min REAL NOT NULL
);";

/// Side of one default grid cell in degrees
pub const DEFAULT_GRID_STEP: u32 = 20;
/// Extent of the default grid in degrees (both axes, from 0)
pub const DEFAULT_GRID_EXTENT: u32 = 100;

/// Connection to the pricing database
pub struct PricingStore {
    path: PathBuf,
    conn: Connection,
}

impl PricingStore {
    /// Open (creating if needed) the store and its schema
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        conn.execute_batch(CREATE_PRICING_TABLE)?;
        debug!("Opened pricing store {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every zone in storage order
    pub fn load(&self) -> Result<PricingTable> {
        load_zones(&self.conn)
    }

    /// Number of zones currently stored
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pricing", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Append a zone and return its id
    pub fn insert_zone(
        &self,
        lat: (f64, f64),
        lon: (f64, f64),
        rate_per_min: f64,
    ) -> Result<ZoneId> {
        self.conn.execute(
            "INSERT INTO pricing (lat_min, lat_max, lon_min, lon_max, rate_per_min)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![lat.0, lat.1, lon.0, lon.1, rate_per_min],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Fill an empty store with the default 5x5 grid of 20 degree cells
    ///
    /// Cell (i, j) covers lat `i..=i+20`, lon `j..=j+20` and costs
    /// `(i + j) * 0.5` per minute. Returns the number of zones inserted, 0 if
    /// the store already had zones.
    pub fn seed_default_grid(&mut self) -> Result<usize> {
        if self.count()? > 0 {
            debug!("Pricing store already populated; skipping default grid");
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pricing (lat_min, lat_max, lon_min, lon_max, rate_per_min)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for zone in default_grid() {
                stmt.execute(params![
                    zone.lat_min,
                    zone.lat_max,
                    zone.lon_min,
                    zone.lon_max,
                    zone.rate_per_min
                ])?;
                inserted += 1;
            }
        }
        tx.commit()?;

        info!("Seeded pricing store with {} default zones", inserted);
        Ok(inserted)
    }
}

/// Load the table through a fresh read-only connection
///
/// Used on every reload so edits made by other processes are always seen.
pub fn load_table(path: &Path) -> Result<PricingTable> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    load_zones(&conn)
}

fn load_zones(conn: &Connection) -> Result<PricingTable> {
    let mut stmt = conn.prepare(
        "SELECT zone_id, lat_min, lat_max, lon_min, lon_max, rate_per_min
         FROM pricing ORDER BY zone_id",
    )?;
    let zones = stmt
        .query_map([], |row| {
            Ok(PricingZone {
                zone_id: row.get(0)?,
                lat_min: row.get(1)?,
                lat_max: row.get(2)?,
                lon_min: row.get(3)?,
                lon_max: row.get(4)?,
                rate_per_min: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(PricingTable::new(zones))
}

/// Zones of the default grid, ids left at 0
pub fn default_grid() -> impl Iterator<Item = PricingZone> {
    (0..DEFAULT_GRID_EXTENT)
        .step_by(DEFAULT_GRID_STEP as usize)
        .flat_map(|i| {
            (0..DEFAULT_GRID_EXTENT)
                .step_by(DEFAULT_GRID_STEP as usize)
                .map(move |j| PricingZone {
                    zone_id: 0,
                    lat_min: i as f64,
                    lat_max: (i + DEFAULT_GRID_STEP) as f64,
                    lon_min: j as f64,
                    lon_max: (j + DEFAULT_GRID_STEP) as f64,
                    rate_per_min: (i + j) as f64 * 0.5,
                })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_shape() {
        let grid: Vec<_> = default_grid().collect();
        assert_eq!(grid.len(), 25);
        assert_eq!(grid[0].rate_per_min, 0.0);
        assert_eq!(grid[1].lon_min, 20.0);
        assert_eq!(grid[24].lat_min, 80.0);
        assert_eq!(grid[24].lon_max, 100.0);
        assert_eq!(grid[24].rate_per_min, 80.0);
    }

    #[test]
    fn test_seed_only_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PricingStore::open(&dir.path().join("pricing.db")).unwrap();

        assert_eq!(store.seed_default_grid().unwrap(), 25);
        assert_eq!(store.seed_default_grid().unwrap(), 0);
        assert_eq!(store.count().unwrap(), 25);
    }

    #[test]
    fn test_load_in_storage_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing.db");
        let store = PricingStore::open(&path).unwrap();

        let first = store.insert_zone((23.0, 24.0), (65.0, 66.0), 2.5).unwrap();
        let second = store.insert_zone((0.0, 50.0), (0.0, 50.0), 1.0).unwrap();
        assert!(second > first);

        let table = load_table(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.zones()[0].zone_id, first);
        assert_eq!(table.zones()[1].rate_per_min, 1.0);
        assert_eq!(table, store.load().unwrap());
        assert_eq!(table.find_zone(23.1, 65.97), Some(first));
    }

    #[test]
    fn test_reopen_keeps_zones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing.db");
        {
            let store = PricingStore::open(&path).unwrap();
            store.insert_zone((1.0, 2.0), (3.0, 4.0), 0.75).unwrap();
        }
        let store = PricingStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_load_missing_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_table(&dir.path().join("absent.db")).is_err());
    }
}
