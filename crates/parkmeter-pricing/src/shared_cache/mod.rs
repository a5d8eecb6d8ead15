// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Shared Pricing Cache
//!
//! A pricing table snapshot living in a file-backed shared mapping, guarded
//! by a lock word inside the same mapping.
//!
//! One process creates the region and publishes into it
//! ([`SharedPricingCache::create`]); any number of processes attach to it and
//! read ([`SharedPricingCache::attach`]). Every access to the zone entries
//! happens inside [`SharedPricingCache::with_lock`], so a reader always sees
//! one complete snapshot and never a zone count that disagrees with the
//! entries.
//!
//! A region that is not ready reads as empty, so every lookup misses. That
//! covers a region nobody has published into yet and one whose publisher died
//! halfway through a publish. A reader whose mapping no longer matches the
//! header (the region was recreated with another capacity) also reads empty
//! until it reattaches.
//!
//! Dropping a handle unmaps the region. Only [`SharedPricingCache::remove`]
//! (or [`remove_segment`]) unlinks it.

mod key;
mod layout;
mod lock;

pub use key::{region_key, segment_file_name, segment_path, PROJECT_ID, SEGMENT_PREFIX};
pub use layout::{capacity_for, region_size_for, HEADER_SIZE, MIN_REGION_SIZE, ZONE_RECORD_SIZE};

use std::fs::{File, OpenOptions};
use std::io::Read;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use memmap2::MmapRaw;
use tracing::{debug, info, warn};

use crate::error::{PricingError, Result};
use crate::zone_table::{
    first_containing, PricingTable, PricingZone, ZoneId, ZoneLookup, ZoneMatch,
};

/// Which side of the region this handle is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRole {
    /// Created the region; may publish
    Publisher,
    /// Attached to an existing region; read-only
    Reader,
}

/// Handle to the shared pricing region
pub struct SharedPricingCache {
    path: PathBuf,
    map: MmapRaw,
    capacity: usize,
    role: RegionRole,
    pid: u32,
    layout_warned: AtomicBool,
}

impl std::fmt::Debug for SharedPricingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPricingCache")
            .field("path", &self.path)
            .field("capacity", &self.capacity)
            .field("role", &self.role)
            .finish()
    }
}

impl SharedPricingCache {
    /// Create the region at `path`, or reuse a compatible one left there
    ///
    /// A region with a valid header and the same capacity is reused as is, so
    /// a restarted publisher does not pull the mapping out from under an
    /// attached server. A valid region of another capacity is never resized in
    /// place: that fails with [`PricingError::LayoutMismatch`] and the region
    /// has to be removed first. A missing or unrecognized file is initialized
    /// empty and not ready.
    pub fn create(path: &Path, region_size: usize) -> Result<Self> {
        if region_size < MIN_REGION_SIZE {
            return Err(PricingError::RegionTooSmall {
                size: region_size,
                min: MIN_REGION_SIZE,
            });
        }
        let capacity = capacity_for(region_size);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        options.mode(0o660);
        let file = options.open(path)?;

        let existing_len = file.metadata()?.len();
        let reuse = match existing_capacity(&file, existing_len)? {
            Some(found) if found == capacity => true,
            Some(found) => {
                return Err(PricingError::LayoutMismatch(format!(
                    "region {:?} already holds {} zones ({} bytes) but {} were requested; \
                     remove it (--remove-segment) after stopping its readers",
                    path, found, existing_len, capacity
                )));
            }
            None => {
                file.set_len(region_size as u64)?;
                false
            }
        };

        let map = MmapRaw::map_raw(&file)?;
        let cache = Self {
            path: path.to_path_buf(),
            map,
            capacity,
            role: RegionRole::Publisher,
            pid: std::process::id(),
            layout_warned: AtomicBool::new(false),
        };

        if reuse {
            info!(
                "Reusing shared pricing region {:?} (capacity {} zones, generation {})",
                path,
                capacity,
                cache.generation()
            );
        } else {
            // SAFETY: the file held no valid header, so no reader has attached
            // and nobody can hold the lock word yet.
            let header =
                unsafe { std::slice::from_raw_parts_mut(cache.map.as_mut_ptr(), HEADER_SIZE) };
            layout::init_header(header, capacity as u32);
            cache.map.flush()?;
            info!(
                "Created shared pricing region {:?} ({} bytes, capacity {} zones)",
                path, region_size, capacity
            );
        }

        Ok(cache)
    }

    /// Attach to a region created by the publisher
    pub fn attach(path: &Path) -> Result<Self> {
        let file = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PricingError::SegmentMissing(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let map = MmapRaw::map_raw(&file)?;
        if map.len() < HEADER_SIZE {
            return Err(PricingError::LayoutMismatch(format!(
                "region is {} bytes, smaller than its header",
                map.len()
            )));
        }

        let mut cache = Self {
            path: path.to_path_buf(),
            map,
            capacity: 0,
            role: RegionRole::Reader,
            pid: std::process::id(),
            layout_warned: AtomicBool::new(false),
        };
        cache.capacity = layout::validate_header(cache.header_bytes(), cache.map.len())?;

        info!(
            "Attached to shared pricing region {:?} (capacity {} zones, ready: {})",
            path,
            cache.capacity,
            cache.is_ready()
        );
        if !cache.is_ready() {
            warn!("Shared pricing region has not been published yet; lookups will miss");
        }

        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn role(&self) -> RegionRole {
        self.role
    }

    /// Last published generation, read without taking the lock
    pub fn generation(&self) -> u64 {
        self.atomic_u64(layout::GENERATION_OFFSET).load(Ordering::Acquire)
    }

    /// Readiness marker, read without taking the lock
    ///
    /// Informational only. Consistency comes from [`Self::with_lock`].
    pub fn is_ready(&self) -> bool {
        self.atomic_u32(layout::READY_OFFSET).load(Ordering::Acquire) != 0
    }

    /// Pid of the process that published the current snapshot
    pub fn publisher_pid(&self) -> u32 {
        self.atomic_u32(layout::PUBLISHER_PID_OFFSET).load(Ordering::Acquire)
    }

    /// Run `f` with exclusive access to the current snapshot
    ///
    /// The view is empty and not ready unless the region holds a complete
    /// snapshot laid out the way this handle mapped it.
    pub fn with_lock<R>(&self, f: impl FnOnce(&CacheView<'_>) -> R) -> R {
        let guard = lock::acquire(self.atomic_u32(layout::LOCK_OFFSET), self.pid);

        let ready = self.atomic_u32(layout::READY_OFFSET).load(Ordering::Relaxed) != 0;
        if guard.took_over() && !ready {
            warn!(
                "Publisher of {:?} died mid-publish; serving no zones until the next publish",
                self.path
            );
        }
        let count = if ready { self.consistent_count() } else { None };

        // SAFETY: records are only written by `publish` while it holds the
        // lock word, which we now hold; the slice does not outlive the guard.
        let records = unsafe {
            std::slice::from_raw_parts(
                self.map.as_ptr().add(layout::record_offset(0)),
                count.unwrap_or(0) * ZONE_RECORD_SIZE,
            )
        };

        let view = CacheView {
            records,
            generation: self.atomic_u64(layout::GENERATION_OFFSET).load(Ordering::Relaxed),
            ready: count.is_some(),
        };
        f(&view)
    }

    /// Zone count, if the header still agrees with this mapping
    ///
    /// Caller holds the lock.
    fn consistent_count(&self) -> Option<usize> {
        let header_capacity =
            self.atomic_u32(layout::CAPACITY_OFFSET).load(Ordering::Relaxed) as usize;
        let count = self.atomic_u32(layout::COUNT_OFFSET).load(Ordering::Relaxed) as usize;
        if header_capacity == self.capacity && count <= self.capacity {
            return Some(count);
        }
        if !self.layout_warned.swap(true, Ordering::Relaxed) {
            warn!(
                "Shared pricing region {:?} now has capacity {} and {} zones but was mapped \
                 with capacity {}; lookups miss until this process reattaches",
                self.path, header_capacity, count, self.capacity
            );
        }
        None
    }

    /// Replace the snapshot with `table`
    ///
    /// Returns the new generation. Readers are shut out for the duration of
    /// the copy. A table larger than the region is rejected before the lock is
    /// taken and the previous snapshot stays in place.
    pub fn publish(&self, table: &PricingTable) -> Result<u64> {
        if self.role != RegionRole::Publisher {
            return Err(PricingError::NotOwner);
        }
        if table.len() > self.capacity {
            return Err(PricingError::CapacityExceeded {
                zones: table.len(),
                capacity: self.capacity,
            });
        }

        let ready = self.atomic_u32(layout::READY_OFFSET);
        let _guard = lock::acquire(self.atomic_u32(layout::LOCK_OFFSET), self.pid);

        ready.store(0, Ordering::Relaxed);

        // SAFETY: exclusive access to the record area while the lock is held;
        // `table.len() <= capacity` keeps the slice inside the mapping.
        let records = unsafe {
            std::slice::from_raw_parts_mut(
                self.map.as_mut_ptr().add(layout::record_offset(0)),
                table.len() * ZONE_RECORD_SIZE,
            )
        };
        for (zone, slot) in table.zones().iter().zip(records.chunks_exact_mut(ZONE_RECORD_SIZE)) {
            layout::encode_zone(zone, slot);
        }

        self.atomic_u32(layout::COUNT_OFFSET)
            .store(table.len() as u32, Ordering::Relaxed);
        let generation = self
            .atomic_u64(layout::GENERATION_OFFSET)
            .fetch_add(1, Ordering::Release)
            .wrapping_add(1);
        self.atomic_u32(layout::PUBLISHER_PID_OFFSET)
            .store(self.pid, Ordering::Release);
        ready.store(1, Ordering::Release);

        debug!(
            "Published {} pricing zones (generation {})",
            table.len(),
            generation
        );
        Ok(generation)
    }

    /// Unmap without removing the region
    pub fn detach(self) {
        info!("Detached from shared pricing region {:?}", self.path);
    }

    /// Unmap and unlink the region
    pub fn remove(self) -> Result<()> {
        let path = self.path.clone();
        drop(self);
        remove_segment(&path)?;
        Ok(())
    }

    fn header_bytes(&self) -> &[u8] {
        // SAFETY: header fields other than the atomics are written only at
        // initialization; callers read them before any publish can race.
        unsafe { std::slice::from_raw_parts(self.map.as_ptr(), HEADER_SIZE) }
    }

    fn atomic_u32(&self, offset: usize) -> &AtomicU32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= HEADER_SIZE);
        // SAFETY: the mapping is page aligned and outlives `&self`; the
        // offset is 4-aligned inside the header.
        unsafe { &*(self.map.as_ptr().add(offset) as *const AtomicU32) }
    }

    fn atomic_u64(&self, offset: usize) -> &AtomicU64 {
        debug_assert!(offset % 8 == 0 && offset + 8 <= HEADER_SIZE);
        // SAFETY: as for `atomic_u32`, with 8-byte alignment.
        unsafe { &*(self.map.as_ptr().add(offset) as *const AtomicU64) }
    }
}

impl ZoneLookup for SharedPricingCache {
    fn lookup(&self, lat: f64, lon: f64) -> Option<ZoneMatch> {
        self.with_lock(|view| view.lookup(lat, lon))
    }
}

/// Capacity recorded in an existing file's header, if it is a valid region
fn existing_capacity(file: &File, len: u64) -> Result<Option<usize>> {
    if len < HEADER_SIZE as u64 {
        return Ok(None);
    }
    let mut header = [0u8; HEADER_SIZE];
    let mut reader = file;
    reader.read_exact(&mut header)?;
    Ok(layout::validate_header(&header, len as usize).ok())
}

/// Unlink a region file; returns whether one existed
pub fn remove_segment(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed shared pricing region {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Snapshot visible inside [`SharedPricingCache::with_lock`]
pub struct CacheView<'a> {
    records: &'a [u8],
    generation: u64,
    ready: bool,
}

impl CacheView<'_> {
    pub fn len(&self) -> usize {
        self.records.len() / ZONE_RECORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Zones in storage order
    pub fn zones(&self) -> impl Iterator<Item = PricingZone> + '_ {
        self.records
            .chunks_exact(ZONE_RECORD_SIZE)
            .map(layout::decode_zone)
    }

    pub fn find_zone(&self, lat: f64, lon: f64) -> Option<ZoneId> {
        first_containing(self.zones(), lat, lon).map(|zone| zone.zone_id)
    }

    pub fn rate_for(&self, zone_id: ZoneId) -> Option<f64> {
        self.zones()
            .find(|zone| zone.zone_id == zone_id)
            .map(|zone| zone.rate_per_min)
    }

    pub fn lookup(&self, lat: f64, lon: f64) -> Option<ZoneMatch> {
        first_containing(self.zones(), lat, lon).map(|zone| ZoneMatch {
            zone_id: zone.zone_id,
            rate_per_min: zone.rate_per_min,
        })
    }

    /// Copy the snapshot out of the region
    pub fn to_table(&self) -> PricingTable {
        self.zones().collect()
    }
}
