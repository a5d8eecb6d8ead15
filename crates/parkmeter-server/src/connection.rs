// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-connection worker
//!
//! Reads records until the peer closes the stream and applies each one to
//! the session store. Nothing is ever written back to the peer.

use std::io::Read;
use std::net::SocketAddr;

use parkmeter_protocol::{DecodeError, EventKind, EventReader, ParkingEvent};
use parkmeter_sessions::{CloseOutcome, SessionError};
use tracing::{debug, error, info, warn};

use crate::context::ServerContext;
use crate::error::Result;

/// What happened on one connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionSummary {
    /// Events applied to the store (including LEAVEs with no open session)
    pub applied: u64,
    /// Records dropped because of a bad kind or a store failure
    pub skipped: u64,
}

/// Apply one event; returns the LEAVE outcome when there is one
pub fn handle_event(ctx: &ServerContext, event: &ParkingEvent) -> Result<Option<CloseOutcome>> {
    let vehicle_id = event.vehicle_id.as_string();
    match event.kind {
        EventKind::Enter => {
            let id = ctx
                .sessions()
                .open_session(&vehicle_id, event.lat, event.lon, event.timestamp)?;
            debug!("ENTER {} -> session {}", vehicle_id, id);
            Ok(None)
        }
        EventKind::Leave => {
            let outcome =
                ctx.sessions()
                    .close_session(&vehicle_id, event.timestamp, ctx.calculator())?;
            match &outcome {
                CloseOutcome::Closed(session) => debug!(
                    "LEAVE {} -> session {} zone {} price {:.2}",
                    vehicle_id, session.id, session.zone_id, session.price
                ),
                CloseOutcome::NotFound => {
                    warn!("LEAVE for {} with no open session; ignored", vehicle_id)
                }
            }
            Ok(Some(outcome))
        }
    }
}

/// Drain `stream` until end of stream or an I/O error
pub fn serve_connection<S: Read>(ctx: &ServerContext, stream: S, peer: SocketAddr) -> ConnectionSummary {
    let mut reader = EventReader::new(stream);
    let mut summary = ConnectionSummary::default();

    loop {
        match reader.next_event() {
            Ok(Some(event)) => match handle_event(ctx, &event) {
                Ok(_) => summary.applied += 1,
                Err(e) => {
                    summary.skipped += 1;
                    log_store_failure(peer, &event, &e);
                }
            },
            Ok(None) => break,
            Err(e) if e.is_recoverable() => {
                summary.skipped += 1;
                warn!("Skipping record {} from {}: {}", reader.records_read(), peer, e);
            }
            Err(DecodeError::Io(e)) => {
                warn!("Connection {} failed: {}", peer, e);
                break;
            }
            Err(e) => {
                error!("Dropping connection {}: {}", peer, e);
                break;
            }
        }
    }

    info!(
        "Connection {} closed ({} events applied, {} skipped)",
        peer, summary.applied, summary.skipped
    );
    summary
}

fn log_store_failure(peer: SocketAddr, event: &ParkingEvent, e: &crate::error::ServerError) {
    match e {
        crate::error::ServerError::Session(SessionError::InvalidVehicleId(id)) => {
            warn!("Rejected {:?} event from {}: invalid vehicle id {:?}", event.kind, peer, id)
        }
        _ => error!(
            "Failed to apply {:?} for {} from {}: {}",
            event.kind, event.vehicle_id, peer, e
        ),
    }
}
