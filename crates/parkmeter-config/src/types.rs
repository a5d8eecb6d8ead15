// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `parkmeter_configuration.toml`. `[server]` and `[pricing]` are mandatory;
//! the remaining sections fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shared region header plus 100 zone records (64 + 100 * 48 bytes)
pub const DEFAULT_SHM_SIZE: usize = 4864;

/// Smallest region that can hold the header and a single zone record
pub const MIN_SHM_SIZE: usize = 64 + 48;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ParkmeterConfig {
    pub server: ServerConfig,
    pub pricing: PricingConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TCP ingestion server configuration (all keys required)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pricing store and shared region configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    /// Authoritative pricing database, also the key source for the shared region
    pub db_path: PathBuf,
    /// Directory holding the shared region file
    #[serde(default = "default_shm_dir")]
    pub shm_dir: PathBuf,
    /// Size of the shared region in bytes; determines zone capacity
    #[serde(default = "default_shm_size")]
    pub shm_size: usize,
    /// Fill an empty pricing table with the default grid on publisher startup
    #[serde(default)]
    pub seed_default_grid: bool,
}

fn default_shm_dir() -> PathBuf {
    PathBuf::from("/dev/shm")
}

fn default_shm_size() -> usize {
    DEFAULT_SHM_SIZE
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("pricing.db"),
            shm_dir: default_shm_dir(),
            shm_size: DEFAULT_SHM_SIZE,
            seed_default_grid: false,
        }
    }
}

/// Parking session store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub db_path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("parking.db"),
            busy_timeout_ms: 5000,
        }
    }
}

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}
