// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # parkmeter-observability
//!
//! Logging setup shared by the ingestion server and the pricing publisher.
//!
//! Both processes log to the operator console through `tracing`. The base level
//! comes from the `[logging]` configuration section; individual crates can be
//! raised to debug with `--debug <crate>` or `PARKMETER_DEBUG=<crate>[,<crate>]`.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known Parkmeter crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "parkmeter-config",
    "parkmeter-protocol",
    "parkmeter-pricing",
    "parkmeter-sessions",
    "parkmeter-server",
];
