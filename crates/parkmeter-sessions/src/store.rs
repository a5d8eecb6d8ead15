// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Session Store
//!
//! The `parking` table, behind one connection and one process-wide writer
//! lock. Every operation takes the lock, so writes from all connection
//! workers are totally ordered.
//!
//! A vehicle has at most one open session in normal operation. A second ENTER
//! without a LEAVE is not rejected: it opens another row, and the next LEAVE
//! closes the newest one while the older stays open.

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use parkmeter_pricing::ZoneLookup;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use tracing::debug;

use crate::error::{Result, SessionError};
use crate::pricing::PriceCalculator;
use crate::session::{ClosedSession, CloseOutcome, OpenSession, ParkingSession, SessionId};

const CREATE_PARKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS parking (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vehicle_id TEXT NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    zone_id INTEGER,
    start_time INTEGER NOT NULL,
    end_time INTEGER,
    overall_time INTEGER,
    price REAL
);
CREATE INDEX IF NOT EXISTS idx_parking_vehicle_open ON parking (vehicle_id, end_time);";

const SELECT_COLUMNS: &str =
    "SELECT id, vehicle_id, lat, lon, zone_id, start_time, end_time, overall_time, price FROM parking";

/// Durable parking sessions
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open (creating if needed) the store and its schema
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.busy_timeout(busy_timeout)?;
        debug!("Opened session store {:?}", path);
        Self::with_connection(conn)
    }

    /// Private in-memory store
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_PARKING_TABLE)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record an ENTER and return the new session id
    ///
    /// Does not look for an already open session of the same vehicle. An
    /// empty id (an all-NUL id on the wire) is stored like any other.
    pub fn open_session(
        &self,
        vehicle_id: &str,
        lat: f64,
        lon: f64,
        start_time: i64,
    ) -> Result<SessionId> {
        validate_vehicle_id(vehicle_id)?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO parking (vehicle_id, lat, lon, start_time) VALUES (?1, ?2, ?3, ?4)",
            params![vehicle_id, lat, lon, start_time],
        )?;
        let id = conn.last_insert_rowid();
        debug!(
            "Opened session {} for {} at ({}, {}) t={}",
            id, vehicle_id, lat, lon, start_time
        );
        Ok(id)
    }

    /// Record a LEAVE: price and close the vehicle's newest open session
    ///
    /// Zone, end time, duration and price are written in one transaction. A
    /// vehicle without an open session yields [`CloseOutcome::NotFound`] and
    /// nothing is written.
    pub fn close_session<L: ZoneLookup>(
        &self,
        vehicle_id: &str,
        end_time: i64,
        calculator: &PriceCalculator<L>,
    ) -> Result<CloseOutcome> {
        validate_vehicle_id(vehicle_id)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let open = tx
            .query_row(
                "SELECT id, vehicle_id, lat, lon, start_time FROM parking
                 WHERE vehicle_id = ?1 AND end_time IS NULL
                 ORDER BY id DESC LIMIT 1",
                params![vehicle_id],
                |row| {
                    Ok(OpenSession {
                        id: row.get(0)?,
                        vehicle_id: row.get(1)?,
                        lat: row.get(2)?,
                        lon: row.get(3)?,
                        start_time: row.get(4)?,
                    })
                },
            )
            .optional()?;

        let Some(open) = open else {
            debug!("No open session for {}", vehicle_id);
            return Ok(CloseOutcome::NotFound);
        };

        let charge = calculator.price(&open, end_time);
        let updated = tx.execute(
            "UPDATE parking SET zone_id = ?1, end_time = ?2, overall_time = ?3, price = ?4
             WHERE id = ?5 AND end_time IS NULL",
            params![
                charge.zone_id,
                end_time,
                charge.duration_secs,
                charge.amount,
                open.id
            ],
        )?;
        if updated != 1 {
            return Ok(CloseOutcome::NotFound);
        }
        tx.commit()?;

        debug!(
            "Closed session {} for {}: zone {}, {} s, price {:.2}",
            open.id, open.vehicle_id, charge.zone_id, charge.duration_secs, charge.amount
        );
        Ok(CloseOutcome::Closed(ClosedSession {
            id: open.id,
            vehicle_id: open.vehicle_id,
            zone_id: charge.zone_id,
            start_time: open.start_time,
            end_time,
            overall_time: charge.duration_secs,
            price: charge.amount,
        }))
    }

    /// Sessions with no end time, oldest first
    pub fn open_sessions(&self) -> Result<Vec<ParkingSession>> {
        self.query(
            &format!("{} WHERE end_time IS NULL ORDER BY id", SELECT_COLUMNS),
            params![],
        )
    }

    /// Every session of one vehicle, oldest first
    pub fn sessions_for(&self, vehicle_id: &str) -> Result<Vec<ParkingSession>> {
        self.query(
            &format!("{} WHERE vehicle_id = ?1 ORDER BY id", SELECT_COLUMNS),
            params![vehicle_id],
        )
    }

    /// Sessions that have been priced, oldest first
    pub fn priced_sessions(&self) -> Result<Vec<ParkingSession>> {
        self.query(
            &format!("{} WHERE price IS NOT NULL ORDER BY id", SELECT_COLUMNS),
            params![],
        )
    }

    pub fn session(&self, id: SessionId) -> Result<Option<ParkingSession>> {
        Ok(self
            .query(&format!("{} WHERE id = ?1", SELECT_COLUMNS), params![id])?
            .pop())
    }

    /// Total number of rows
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM parking", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ParkingSession>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, session_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<ParkingSession> {
    Ok(ParkingSession {
        id: row.get(0)?,
        vehicle_id: row.get(1)?,
        lat: row.get(2)?,
        lon: row.get(3)?,
        zone_id: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        overall_time: row.get(7)?,
        price: row.get(8)?,
    })
}

/// Wire ids end at the first NUL, so only direct callers can trip this
fn validate_vehicle_id(vehicle_id: &str) -> Result<()> {
    if vehicle_id.contains('\0') {
        return Err(SessionError::InvalidVehicleId(vehicle_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkmeter_pricing::{PricingTable, PricingZone, UNKNOWN_ZONE};

    fn calculator() -> PriceCalculator<PricingTable> {
        PriceCalculator::new(PricingTable::new(vec![PricingZone {
            zone_id: 12,
            lat_min: 23.0,
            lat_max: 24.0,
            lon_min: 65.0,
            lon_max: 66.0,
            rate_per_min: 2.5,
        }]))
    }

    #[test]
    fn test_enter_then_leave_prices_session() {
        let store = SessionStore::open_in_memory().unwrap();
        let id = store.open_session("CAR123", 23.1, 65.97, 1000).unwrap();

        let outcome = store.close_session("CAR123", 1180, &calculator()).unwrap();
        let closed = outcome.closed().expect("session should close");
        assert_eq!(closed.id, id);
        assert_eq!(closed.zone_id, 12);
        assert_eq!(closed.price, 7.5);

        let rows = store.sessions_for("CAR123").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].end_time, Some(1180));
        assert_eq!(rows[0].overall_time, Some(180));
        assert_eq!(rows[0].zone_id, Some(12));
        assert_eq!(rows[0].price, Some(7.5));
    }

    #[test]
    fn test_leave_without_enter_changes_nothing() {
        let store = SessionStore::open_in_memory().unwrap();
        store.open_session("CAR123", 23.1, 65.97, 1000).unwrap();

        let outcome = store.close_session("CAR999", 500, &calculator()).unwrap();
        assert_eq!(outcome, CloseOutcome::NotFound);
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.sessions_for("CAR999").unwrap().is_empty());
        assert_eq!(store.open_sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_second_leave_is_not_found() {
        let store = SessionStore::open_in_memory().unwrap();
        store.open_session("CAR123", 23.1, 65.97, 1000).unwrap();
        store.close_session("CAR123", 1180, &calculator()).unwrap();

        let again = store.close_session("CAR123", 2000, &calculator()).unwrap();
        assert_eq!(again, CloseOutcome::NotFound);
        assert_eq!(store.sessions_for("CAR123").unwrap()[0].end_time, Some(1180));
    }

    #[test]
    fn test_uncovered_position_closes_with_unknown_zone() {
        let store = SessionStore::open_in_memory().unwrap();
        store.open_session("CAR777", 99.0, 99.0, 0).unwrap();

        let closed = store.close_session("CAR777", 600, &calculator()).unwrap();
        let closed = closed.closed().unwrap();
        assert_eq!(closed.zone_id, UNKNOWN_ZONE);
        assert_eq!(closed.price, 0.0);
        assert_eq!(store.priced_sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_enter_leaves_older_session_open() {
        let store = SessionStore::open_in_memory().unwrap();
        let older = store.open_session("CAR123", 23.0, 65.0, 100).unwrap();
        let newer = store.open_session("CAR123", 23.0, 65.0, 200).unwrap();

        let closed = store.close_session("CAR123", 260, &calculator()).unwrap();
        assert_eq!(closed.closed().unwrap().id, newer);

        let open = store.open_sessions().unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, older);
        assert!(open[0].is_open());
    }

    #[test]
    fn test_invalid_vehicle_id_rejected() {
        let store = SessionStore::open_in_memory().unwrap();
        assert!(matches!(
            store.open_session("A\0B", 0.0, 0.0, 0),
            Err(SessionError::InvalidVehicleId(_))
        ));
        assert!(matches!(
            store.close_session("A\0B", 0, &calculator()),
            Err(SessionError::InvalidVehicleId(_))
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_empty_vehicle_id_is_a_session_like_any_other() {
        let store = SessionStore::open_in_memory().unwrap();
        let id = store.open_session("", 23.1, 65.97, 1000).unwrap();

        let closed = store.close_session("", 1180, &calculator()).unwrap();
        let closed = closed.closed().expect("empty id session should close");
        assert_eq!(closed.id, id);
        assert_eq!(closed.vehicle_id, "");
        assert_eq!(closed.price, 7.5);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parking.db");
        let id = {
            let store = SessionStore::open(&path, Duration::from_millis(500)).unwrap();
            store.open_session("CAR123", 23.1, 65.97, 1000).unwrap()
        };

        let store = SessionStore::open(&path, Duration::from_millis(500)).unwrap();
        let session = store.session(id).unwrap().expect("row should persist");
        assert_eq!(session.vehicle_id, "CAR123");
        assert!(session.is_open());
        assert_eq!(session.price, None);
    }
}
