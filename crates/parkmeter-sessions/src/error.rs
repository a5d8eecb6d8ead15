// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session store errors

/// Result type alias using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// SQLite open/prepare/execute failure; the operation was not applied
    #[error("Session store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Invalid vehicle id: {0:?}")]
    InvalidVehicleId(String),
}
