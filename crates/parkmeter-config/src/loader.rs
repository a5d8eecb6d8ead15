// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)
//!
//! The merged result is validated before it is returned.

use crate::{validate_config, ConfigError, ConfigResult, ParkmeterConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "parkmeter_configuration.toml";

/// Find the Parkmeter configuration file
///
/// Search order:
/// 1. `PARKMETER_CONFIG_PATH` environment variable
/// 2. Current working directory: `./parkmeter_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("PARKMETER_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by PARKMETER_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet PARKMETER_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, lacks a
/// required key, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ParkmeterConfig> {
    let config_file = match config_path {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: ParkmeterConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    validate_config(&config)?;
    Ok(config)
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = {:?}", key, value)))
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `PARKMETER_SERVER_HOST` -> `server.host`
/// - `PARKMETER_SERVER_PORT` -> `server.port`
/// - `PARKMETER_PRICING_DB` -> `pricing.db_path`
/// - `PARKMETER_SHM_DIR` -> `pricing.shm_dir`
/// - `PARKMETER_SHM_SIZE` -> `pricing.shm_size`
/// - `PARKMETER_SESSIONS_DB` -> `sessions.db_path`
/// - `PARKMETER_LOG_LEVEL` -> `logging.level`
///
/// Unparseable numeric values are an error rather than being ignored.
pub fn apply_environment_overrides(config: &mut ParkmeterConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("PARKMETER_SERVER_HOST") {
        config.server.host = value;
    }
    if let Ok(value) = env::var("PARKMETER_SERVER_PORT") {
        config.server.port = parse_value("PARKMETER_SERVER_PORT", &value)?;
    }
    if let Ok(value) = env::var("PARKMETER_PRICING_DB") {
        config.pricing.db_path = PathBuf::from(value);
    }
    if let Ok(value) = env::var("PARKMETER_SHM_DIR") {
        config.pricing.shm_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("PARKMETER_SHM_SIZE") {
        config.pricing.shm_size = parse_value("PARKMETER_SHM_SIZE", &value)?;
    }
    if let Ok(value) = env::var("PARKMETER_SESSIONS_DB") {
        config.sessions.db_path = PathBuf::from(value);
    }
    if let Ok(value) = env::var("PARKMETER_LOG_LEVEL") {
        config.logging.level = value;
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments (e.g., `{"server_host": "192.168.1.1", "server_port": "9000"}`)
pub fn apply_cli_overrides(
    config: &mut ParkmeterConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("server_host") {
        config.server.host = value.clone();
    }
    if let Some(value) = cli_args.get("server_port") {
        config.server.port = parse_value("server_port", value)?;
    }
    if let Some(value) = cli_args.get("pricing_db") {
        config.pricing.db_path = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("shm_dir") {
        config.pricing.shm_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("sessions_db") {
        config.sessions.db_path = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    Ok(())
}
