// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parking event ingestion server

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use parkmeter_config::load_config;
use parkmeter_observability::{init_logging, parse_debug_flags};
use parkmeter_server::{IngestServer, ServerContext};

/// Ingests parking ENTER/LEAVE events over TCP and prices finished sessions
#[derive(Parser, Debug)]
#[command(name = "parking-server", version, long_about = None)]
struct Args {
    /// Path to parkmeter_configuration.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Raise a crate to debug logging (repeatable, or "all")
    #[arg(long = "debug", value_name = "CRATE")]
    debug: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref(), None).context("Failed to load configuration")?;
    init_logging(&config.logging, &parse_debug_flags(&args.debug))?;

    let ctx = Arc::new(
        ServerContext::open(config)
            .context("Failed to open session store or attach shared pricing region")?,
    );
    let server = IngestServer::bind(ctx)?;
    let handle = server.spawn()?;

    let trigger = handle.shutdown_trigger();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received...");
        trigger.trigger();
    })?;

    handle.join();
    Ok(())
}
