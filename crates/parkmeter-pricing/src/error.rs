// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for pricing store, shared cache and publisher

use std::path::PathBuf;

/// Result type alias using PricingError
pub type Result<T> = std::result::Result<T, PricingError>;

/// Pricing subsystem errors
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    /// SQLite open/prepare/execute failure on the pricing store
    #[error("Pricing store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// I/O failure on the shared region file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not derive the shared region key from the pricing store path
    #[error("Cannot derive shared region key from {path}: {source}")]
    KeyDerivation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reader tried to attach before any publisher created the region
    #[error("Shared pricing region not found at {0} (is the publisher running?)")]
    SegmentMissing(PathBuf),

    /// Region exists but its header does not match this build's layout
    #[error("Shared pricing region layout mismatch: {0}")]
    LayoutMismatch(String),

    /// Configured region size cannot hold the header and one zone
    #[error("Shared region of {size} bytes is too small (need at least {min})")]
    RegionTooSmall { size: usize, min: usize },

    /// Table does not fit into the region; previous snapshot is kept
    #[error("Pricing table has {zones} zones but the shared region holds {capacity}")]
    CapacityExceeded { zones: usize, capacity: usize },

    /// Only the handle that created the region may publish into it
    #[error("Shared region handle is attached read-only; only the publisher may publish")]
    NotOwner,

    /// File-change watcher failure
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Feature not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl PricingError {
    /// Errors that make the shared region unusable for this process
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            PricingError::KeyDerivation { .. }
                | PricingError::SegmentMissing(_)
                | PricingError::LayoutMismatch(_)
                | PricingError::RegionTooSmall { .. }
                | PricingError::Unsupported(_)
        )
    }
}
