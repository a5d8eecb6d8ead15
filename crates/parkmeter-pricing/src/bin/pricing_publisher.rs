// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pricing publisher
//!
//! Owns the shared pricing region: creates it, fills it from the pricing
//! store, and keeps it current while the store is edited.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use parkmeter_config::load_config;
use parkmeter_observability::{init_logging, parse_debug_flags};
use parkmeter_pricing::{
    remove_segment, segment_path, shutdown_channel, CachePublisher, PricingStore,
    SharedPricingCache,
};

/// Publishes the pricing zone table into shared memory and hot-reloads it
#[derive(Parser, Debug)]
#[command(name = "pricing-publisher", version, long_about = None)]
struct Args {
    /// Path to parkmeter_configuration.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed the default 5x5 zone grid if the pricing table is empty
    #[arg(long, default_value_t = false)]
    seed_default_grid: bool,

    /// Publish once and exit instead of watching the store
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Unlink the shared pricing region and exit
    #[arg(long, default_value_t = false)]
    remove_segment: bool,

    /// Raise a crate to debug logging (repeatable, or "all")
    #[arg(long = "debug", value_name = "CRATE")]
    debug: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref(), None).context("Failed to load configuration")?;
    init_logging(&config.logging, &parse_debug_flags(&args.debug))?;

    let pricing = &config.pricing;
    {
        let mut store = PricingStore::open(&pricing.db_path)
            .with_context(|| format!("Failed to open pricing store {:?}", pricing.db_path))?;
        if args.seed_default_grid || pricing.seed_default_grid {
            store.seed_default_grid().context("Failed to seed default grid")?;
        }
    }

    let region = segment_path(&pricing.db_path, &pricing.shm_dir)
        .context("Failed to derive shared pricing region name")?;

    if args.remove_segment {
        if !remove_segment(&region)? {
            warn!("No shared pricing region at {:?}", region);
        }
        return Ok(());
    }

    let cache = SharedPricingCache::create(&region, pricing.shm_size)
        .with_context(|| format!("Failed to create shared pricing region {:?}", region))?;
    let publisher = CachePublisher::new(&pricing.db_path, cache);
    publisher
        .reload_and_publish()
        .context("Initial pricing publish failed")?;

    if args.once {
        publisher.into_cache().detach();
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received...");
        let _ = shutdown_tx.try_send(());
    })?;

    publisher.watch(&shutdown_rx).context("Pricing store watch failed")?;
    publisher.into_cache().detach();
    Ok(())
}
