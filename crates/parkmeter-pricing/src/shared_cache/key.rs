// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Region naming
//!
//! The publisher and the server never exchange the region name. Both derive
//! it from the pricing store path with the classic `ftok` recipe, so they
//! meet on the same file as long as they are configured with the same store
//! and the store file is not replaced in between.

use std::path::{Path, PathBuf};

use crate::error::{PricingError, Result};

/// Project id folded into the top byte of the key
pub const PROJECT_ID: u32 = 65;

/// File name prefix of the region inside the shared-memory directory
pub const SEGMENT_PREFIX: &str = "parkmeter-pricing-";

/// Derive the region key from the store file's device and inode numbers
#[cfg(unix)]
pub fn region_key(store_path: &Path) -> Result<u32> {
    use std::os::unix::fs::MetadataExt;

    let metadata = std::fs::metadata(store_path).map_err(|source| PricingError::KeyDerivation {
        path: store_path.to_path_buf(),
        source,
    })?;

    Ok(fold_key(metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
pub fn region_key(_store_path: &Path) -> Result<u32> {
    Err(PricingError::Unsupported(
        "shared pricing region keys need unix file metadata".to_string(),
    ))
}

fn fold_key(dev: u64, ino: u64) -> u32 {
    ((PROJECT_ID & 0xff) << 24) | (((dev & 0xff) as u32) << 16) | ((ino & 0xffff) as u32)
}

/// Full path of the region file for a pricing store
pub fn segment_path(store_path: &Path, shm_dir: &Path) -> Result<PathBuf> {
    let key = region_key(store_path)?;
    Ok(shm_dir.join(segment_file_name(key)))
}

pub fn segment_file_name(key: u32) -> String {
    format!("{}{:08x}", SEGMENT_PREFIX, key)
}
