// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cross-process lock word
//!
//! A `u32` inside the shared region holds the pid of the process in the
//! critical section, 0 when free. Every process maps the same word, so an
//! `AtomicU32` compare-exchange gives mutual exclusion across processes and
//! across threads of one process alike.
//!
//! A holder that dies inside the critical section would otherwise wedge every
//! other process. Waiters therefore check now and then whether the recorded
//! holder still exists and take the lock over if it does not.

use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use tracing::warn;

const SPIN_ATTEMPTS: u32 = 16;
const YIELD_ATTEMPTS: u32 = 64;
const SLEEP_BACKOFF: Duration = Duration::from_micros(50);
/// Attempts between liveness checks of the current holder
const STALE_CHECK_INTERVAL: u32 = 256;

/// Held lock; released on drop
pub(crate) struct RegionLockGuard<'a> {
    word: &'a AtomicU32,
    pid: u32,
    took_over: bool,
}

impl RegionLockGuard<'_> {
    /// Whether the lock was taken from a holder that had died
    ///
    /// Whatever that holder was writing may be half done.
    pub(crate) fn took_over(&self) -> bool {
        self.took_over
    }
}

impl Drop for RegionLockGuard<'_> {
    fn drop(&mut self) {
        if self
            .word
            .compare_exchange(self.pid, 0, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            warn!(
                "Shared pricing lock was taken over while pid {} held it",
                self.pid
            );
        }
    }
}

/// Spin, then yield, then sleep until the lock word is ours
pub(crate) fn acquire(word: &AtomicU32, pid: u32) -> RegionLockGuard<'_> {
    let mut attempts: u32 = 0;
    loop {
        match word.compare_exchange_weak(0, pid, Ordering::Acquire, Ordering::Relaxed) {
            Ok(_) => {
                return RegionLockGuard {
                    word,
                    pid,
                    took_over: false,
                }
            }
            Err(holder) => {
                attempts = attempts.wrapping_add(1);
                if holder != 0
                    && attempts % STALE_CHECK_INTERVAL == 0
                    && !holder_alive(holder, pid)
                    && word
                        .compare_exchange(holder, pid, Ordering::Acquire, Ordering::Relaxed)
                        .is_ok()
                {
                    warn!(
                        "Took over shared pricing lock from pid {} which no longer exists",
                        holder
                    );
                    return RegionLockGuard {
                        word,
                        pid,
                        took_over: true,
                    };
                }
                backoff(attempts);
            }
        }
    }
}

fn backoff(attempts: u32) {
    if attempts < SPIN_ATTEMPTS {
        std::hint::spin_loop();
    } else if attempts < YIELD_ATTEMPTS {
        thread::yield_now();
    } else {
        thread::sleep(SLEEP_BACKOFF);
    }
}

fn holder_alive(holder: u32, own_pid: u32) -> bool {
    holder == own_pid || process_exists(holder)
}

#[cfg(target_os = "linux")]
fn process_exists(pid: u32) -> bool {
    std::path::Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_exists(_pid: u32) -> bool {
    true
}
