// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the wire protocol

/// Result type alias using DecodeError
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors raised while decoding parking event records
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Input length does not match the fixed record size
    #[error("Framing error: expected {expected} bytes, got {actual}")]
    Framing { expected: usize, actual: usize },

    /// Event kind field holds a value outside {0, 1}
    #[error("Invalid event kind: {0}")]
    InvalidKind(u32),

    /// Underlying stream failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// The record boundary is still known after this error, so the stream can
    /// keep going with the next record.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecodeError::InvalidKind(_))
    }
}
