// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are within valid ranges and don't conflict
//! with each other. Runs after all overrides have been applied.

use crate::{ConfigError, ConfigResult, ParkmeterConfig, MIN_SHM_SIZE};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    InvalidPortRange { port: u16 },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    PathConflict { path: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPortRange { port } => {
                write!(
                    f,
                    "server.port = {} is outside valid range (1024-65535, or 0 for ephemeral)",
                    port
                )
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::PathConflict { path } => {
                write!(
                    f,
                    "pricing.db_path and sessions.db_path both point at {}",
                    path
                )
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &ParkmeterConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

fn collect_errors(config: &ParkmeterConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "server.host".to_string(),
        });
    }
    if config.server.port != 0 && config.server.port < 1024 {
        errors.push(ConfigValidationError::InvalidPortRange {
            port: config.server.port,
        });
    }

    if config.pricing.db_path.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "pricing.db_path".to_string(),
        });
    }
    if config.pricing.shm_dir.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "pricing.shm_dir".to_string(),
        });
    }
    if config.pricing.shm_size < MIN_SHM_SIZE {
        errors.push(ConfigValidationError::InvalidValue {
            field: "pricing.shm_size".to_string(),
            reason: format!(
                "{} bytes cannot hold a single zone (need at least {})",
                config.pricing.shm_size, MIN_SHM_SIZE
            ),
        });
    }

    if config.sessions.db_path.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "sessions.db_path".to_string(),
        });
    } else if config.sessions.db_path == config.pricing.db_path {
        // The publisher watches the pricing file; session writes would trigger reloads
        errors.push(ConfigValidationError::PathConflict {
            path: config.pricing.db_path.display().to_string(),
        });
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not one of {:?}", config.logging.level, LOG_LEVELS),
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ParkmeterConfig::default()).is_ok());
    }

    #[test]
    fn test_privileged_port_rejected() {
        let mut config = ParkmeterConfig::default();
        config.server.port = 80;
        assert!(collect_errors(&config).contains(&ConfigValidationError::InvalidPortRange { port: 80 }));
    }

    #[test]
    fn test_ephemeral_port_allowed() {
        let mut config = ParkmeterConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_tiny_shm_size_rejected() {
        let mut config = ParkmeterConfig::default();
        config.pricing.shm_size = 64;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_shared_database_path_rejected() {
        let mut config = ParkmeterConfig::default();
        config.sessions.db_path = PathBuf::from("one.db");
        config.pricing.db_path = PathBuf::from("one.db");
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigValidationError::PathConflict { .. }));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = ParkmeterConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = ParkmeterConfig::default();
        config.server.host = String::new();
        config.server.port = 22;
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("server.host"));
        assert!(message.contains("server.port"));
    }
}
