// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # parkmeter-server
//!
//! TCP ingestion of parking events. Each connection carries back-to-back
//! 36-byte records; ENTER opens a session, LEAVE prices and closes it using
//! the shared pricing region published by `pricing-publisher`.
//!
//! The protocol is fire-and-forget: the server never answers.

pub mod connection;
pub mod context;
pub mod error;
pub mod server;

pub use connection::{handle_event, serve_connection, ConnectionSummary};
pub use context::ServerContext;
pub use error::{Result, ServerError};
pub use server::{IngestServer, ServerHandle, ShutdownTrigger};
