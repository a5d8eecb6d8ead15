// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Streaming record reader and writer
//!
//! Records arrive back to back with no delimiter. The reader accumulates exactly
//! [`RECORD_SIZE`] bytes per record; if the peer closes the stream before a record
//! is complete, the partial bytes are dropped and the stream is treated as cleanly
//! finished.

use std::io::{self, Read, Write};

use tracing::debug;

use crate::codec::{decode, encode, RECORD_SIZE};
use crate::error::Result;
use crate::event::ParkingEvent;

/// Reads parking events from a byte stream
pub struct EventReader<R> {
    inner: R,
    buffer: [u8; RECORD_SIZE],
    records_read: u64,
}

impl<R: Read> EventReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: [0u8; RECORD_SIZE],
            records_read: 0,
        }
    }

    /// Read the next event.
    ///
    /// Returns `Ok(None)` at end of stream, including after a short trailing
    /// record. Returns `DecodeError::InvalidKind` for a complete record with a bad
    /// kind field; the reader stays aligned and the caller may continue.
    pub fn next_event(&mut self) -> Result<Option<ParkingEvent>> {
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match self.inner.read(&mut self.buffer[filled..]) {
                Ok(0) => {
                    if filled > 0 {
                        debug!(
                            "Discarding {} trailing bytes of incomplete record at end of stream",
                            filled
                        );
                    }
                    return Ok(None);
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        self.records_read += 1;
        decode(&self.buffer).map(Some)
    }

    /// Number of complete records pulled off the stream so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes parking events to a byte stream
pub struct EventWriter<W> {
    inner: W,
}

impl<W: Write> EventWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn send(&mut self, event: &ParkingEvent) -> io::Result<()> {
        self.inner.write_all(&encode(event))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
