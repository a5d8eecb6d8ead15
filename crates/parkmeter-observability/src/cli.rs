// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! Binaries collect crate names from a repeatable `--debug <crate>` option
//! (`--debug all` enables every crate) and from the `PARKMETER_DEBUG`
//! environment variable.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Set of crates whose logs are raised to debug level
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Build flags from crate names; `"all"` expands to every known crate
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::default();
        for name in names {
            flags.enable(name.as_ref());
        }
        flags
    }

    fn enable(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if name == "all" {
            for crate_name in KNOWN_CRATES {
                self.enabled_crates.insert(crate_name.to_string());
            }
        } else {
            self.enabled_crates.insert(name.to_string());
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Create a tracing filter from debug flags
    ///
    /// Tracing targets are module paths, so crate names are written with
    /// underscores: `"warn,parkmeter_pricing=debug"`.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut filters = vec![base_level.to_lowercase()];
        for crate_name in &self.enabled_crates {
            filters.push(format!("{}=debug", crate_name.replace('-', "_")));
        }
        filters.join(",")
    }
}

/// Merge CLI crate names with the `PARKMETER_DEBUG` environment variable
///
/// Environment variable format: comma-separated crate names, or `all`.
pub fn parse_debug_flags<I, S>(cli_names: I) -> CrateDebugFlags
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut flags = CrateDebugFlags::from_names(cli_names);
    if let Ok(env_var) = env::var("PARKMETER_DEBUG") {
        for crate_name in env_var.split(',') {
            flags.enable(crate_name);
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_names(["parkmeter-pricing"]);
        assert!(flags.is_enabled("parkmeter-pricing"));
        assert!(!flags.is_enabled("parkmeter-server"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_names(["all"]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_uses_module_paths() {
        let flags = CrateDebugFlags::from_names(["parkmeter-sessions"]);
        assert_eq!(flags.to_filter_string("WARN"), "warn,parkmeter_sessions=debug");
    }

    #[test]
    fn test_no_flags_keeps_base_level() {
        let flags = CrateDebugFlags::default();
        assert!(!flags.any_enabled());
        assert_eq!(flags.to_filter_string("info"), "info");
    }

    #[test]
    fn test_blank_names_ignored() {
        let flags = CrateDebugFlags::from_names(["", "  "]);
        assert!(!flags.any_enabled());
    }
}
