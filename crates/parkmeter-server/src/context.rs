// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Process-wide state shared by all connection workers

use std::time::Duration;

use parkmeter_config::ParkmeterConfig;
use parkmeter_pricing::{segment_path, SharedPricingCache};
use parkmeter_sessions::{PriceCalculator, SessionStore};
use tracing::info;

use crate::error::Result;

/// Built once at startup and handed to every worker behind an `Arc`
pub struct ServerContext {
    config: ParkmeterConfig,
    sessions: SessionStore,
    calculator: PriceCalculator<SharedPricingCache>,
}

impl ServerContext {
    pub fn new(config: ParkmeterConfig, sessions: SessionStore, pricing: SharedPricingCache) -> Self {
        Self {
            config,
            sessions,
            calculator: PriceCalculator::new(pricing),
        }
    }

    /// Open the session store and attach to the published pricing region
    ///
    /// Fails with [`crate::ServerError::Pricing`] when the publisher has not
    /// created the region yet.
    pub fn open(config: ParkmeterConfig) -> Result<Self> {
        let sessions = SessionStore::open(
            &config.sessions.db_path,
            Duration::from_millis(config.sessions.busy_timeout_ms),
        )?;
        let region = segment_path(&config.pricing.db_path, &config.pricing.shm_dir)?;
        let pricing = SharedPricingCache::attach(&region)?;
        info!(
            "Sessions in {:?}, pricing from region {:?}",
            config.sessions.db_path, region
        );
        Ok(Self::new(config, sessions, pricing))
    }

    pub fn config(&self) -> &ParkmeterConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn calculator(&self) -> &PriceCalculator<SharedPricingCache> {
        &self.calculator
    }

    pub fn pricing(&self) -> &SharedPricingCache {
        self.calculator.rates()
    }
}
